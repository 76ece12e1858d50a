//! Story catalog, text normalization, and loading for a paginated story viewer.
//!
//! This crate owns the data side of the viewer: the [`Story`] model, the
//! [`Catalog`] of stories (embedded defaults, JSON metadata, or directory
//! discovery), the [`normalize`] pass that turns raw story text into
//! paragraphs, and the [`loader`] that fills stories from a [`StorySource`]
//! with per-story failure isolation.
//!
//! Layout and navigation live in `storybook-render`.
//!
//! ```rust,no_run
//! use storybook::{load_stories, Catalog, DirSource, LoadOptions};
//!
//! let mut catalog = Catalog::default_set();
//! let source = DirSource::new("stories");
//! let report = load_stories(catalog.stories_mut(), &source, &LoadOptions::default());
//! println!("loaded={} failed={}", report.loaded, report.failed);
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod catalog;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod story;

pub use catalog::{Catalog, StoryMeta};
pub use error::StoryError;
#[cfg(feature = "async")]
pub use loader::{load_stories_async, AsyncDirSource, AsyncStorySource};
pub use loader::{load_stories, DirSource, LoadOptions, LoadReport, MemorySource, StorySource};
pub use normalize::{normalize_text, normalize_text_with, NormalizeOptions};
pub use story::Story;
