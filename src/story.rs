//! Story model.

use serde::Serialize;

/// One short story and its metadata.
///
/// Metadata is fixed at construction. `paragraphs` starts absent and is
/// populated exactly once by the loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Story {
    /// Stable, unique story id.
    pub id: u32,
    /// Display title.
    pub title: String,
    /// Author credit.
    pub author: String,
    /// Opaque locator for the story text (relative file path by default).
    pub source_ref: String,
    /// Opaque locator for the cover image.
    pub cover_image_ref: String,
    paragraphs: Option<Vec<String>>,
}

impl Story {
    /// Create an unloaded story.
    pub fn new(
        id: u32,
        title: impl Into<String>,
        author: impl Into<String>,
        source_ref: impl Into<String>,
        cover_image_ref: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            source_ref: source_ref.into(),
            cover_image_ref: cover_image_ref.into(),
            paragraphs: None,
        }
    }

    /// Builder-style helper that populates paragraphs immediately.
    pub fn with_paragraphs<I, S>(mut self, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paragraphs = Some(paragraphs.into_iter().map(Into::into).collect());
        self
    }

    /// Loaded paragraphs, or `None` while the story is still unloaded.
    pub fn paragraphs(&self) -> Option<&[String]> {
        self.paragraphs.as_deref()
    }

    /// Whether text has been populated.
    pub fn is_loaded(&self) -> bool {
        self.paragraphs.is_some()
    }

    /// Populate paragraphs.
    ///
    /// Returns `false` and leaves the story untouched if it was already loaded.
    pub fn populate(&mut self, paragraphs: Vec<String>) -> bool {
        if self.paragraphs.is_some() {
            return false;
        }
        self.paragraphs = Some(paragraphs);
        true
    }
}
