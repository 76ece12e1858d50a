//! Pagination, navigation, and input handling for `storybook`.

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

mod config;
mod input;
mod navigation;
mod oracle;
mod paginator;
mod schedule;
mod sequence;
mod viewer;

pub use config::{ConfigError, LayoutConfig, ViewerConfig, Viewport};
pub use input::{Control, InputEvent, InputOutcome, InputRouter, Key, NavCommand, SwipeTracker};
pub use navigation::{
    Direction, Marker, MarkerSet, NavEvent, NavOutcome, NavState, NavigationController,
    NavigationState, Transition,
};
pub use oracle::{
    Container, FixedCapacityOracle, HeuristicOracle, NeverOverflow, OverflowOracle, PageChrome,
    PageContent,
};
pub use paginator::{Page, PageNumber, PageRole, PageTemplates, Paginator};
pub use schedule::{Debouncer, ScheduledTask};
pub use sequence::{
    PageSequence, ReadingPosition, StorySpan, TocEntry, COVER_PAGE_INDEX, TOC_PAGE_INDEX,
};
pub use viewer::{InputResult, TickReport, Viewer, ViewerSnapshot};
