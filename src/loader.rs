//! Story text loading with per-story failure isolation.
//!
//! Stories are loaded one at a time in declaration order. A story whose text
//! cannot be fetched receives a single placeholder paragraph; the failure is
//! logged and loading continues with the next story.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoryError;
use crate::normalize::{normalize_text_with, NormalizeOptions};
use crate::story::Story;

/// Placeholder paragraph substituted for stories that fail to load.
pub const LOAD_FAILURE_PLACEHOLDER: &str = "내용을 불러올 수 없습니다.";

/// Capability that fetches raw story text by locator.
pub trait StorySource {
    fn fetch(&self, source_ref: &str) -> Result<String, StoryError>;
}

/// Reads story files relative to a root directory.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StorySource for DirSource {
    fn fetch(&self, source_ref: &str) -> Result<String, StoryError> {
        let path = self.root.join(source_ref);
        let bytes = fs::read(&path).map_err(|err| StoryError::Fetch {
            source_ref: source_ref.to_string(),
            reason: err.to_string(),
        })?;
        Ok(decode_story_bytes(source_ref, bytes))
    }
}

/// Decode story bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub fn decode_story_bytes(source_ref: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            log::warn!("story '{}' is not valid UTF-8; decoded lossily", source_ref);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

/// In-memory source keyed by locator. Missing keys fail to fetch.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    texts: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, source_ref: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(source_ref, text);
        self
    }

    pub fn insert(&mut self, source_ref: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(source_ref.into(), text.into());
    }
}

impl StorySource for MemorySource {
    fn fetch(&self, source_ref: &str) -> Result<String, StoryError> {
        self.texts
            .get(source_ref)
            .cloned()
            .ok_or_else(|| StoryError::Fetch {
                source_ref: source_ref.to_string(),
                reason: "not found".to_string(),
            })
    }
}

/// Loader configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    pub normalize: NormalizeOptions,
    /// Paragraph used when a story cannot be fetched.
    pub placeholder: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            placeholder: LOAD_FAILURE_PLACEHOLDER.to_string(),
        }
    }
}

/// Outcome counts for a load pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Stories populated from fetched text.
    pub loaded: usize,
    /// Stories populated with the placeholder.
    pub failed: usize,
    /// Stories that were already loaded and left alone.
    pub skipped: usize,
}

/// Load every unloaded story from `source`, in order.
pub fn load_stories(
    stories: &mut [Story],
    source: &dyn StorySource,
    opts: &LoadOptions,
) -> LoadReport {
    let mut report = LoadReport::default();
    for story in stories.iter_mut() {
        if story.is_loaded() {
            report.skipped += 1;
            continue;
        }
        let result = source.fetch(&story.source_ref);
        apply_fetch_result(story, result, opts, &mut report);
    }
    log::info!(
        "story load complete: loaded={} failed={} skipped={}",
        report.loaded,
        report.failed,
        report.skipped
    );
    report
}

fn apply_fetch_result(
    story: &mut Story,
    result: Result<String, StoryError>,
    opts: &LoadOptions,
    report: &mut LoadReport,
) {
    let paragraphs = match result {
        Ok(text) => {
            report.loaded += 1;
            normalize_text_with(&text, &opts.normalize)
        }
        Err(err) => {
            log::warn!("story {} load failed: {}", story.id, err);
            report.failed += 1;
            vec![opts.placeholder.clone()]
        }
    };
    story.populate(paragraphs);
}

/// Async counterpart of [`StorySource`].
#[cfg(feature = "async")]
pub trait AsyncStorySource {
    fn fetch(
        &self,
        source_ref: &str,
    ) -> impl core::future::Future<Output = Result<String, StoryError>>;
}

/// Reads story files with `tokio::fs`.
#[cfg(feature = "async")]
#[derive(Clone, Debug)]
pub struct AsyncDirSource {
    root: PathBuf,
}

#[cfg(feature = "async")]
impl AsyncDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(feature = "async")]
impl AsyncStorySource for AsyncDirSource {
    async fn fetch(&self, source_ref: &str) -> Result<String, StoryError> {
        let path = self.root.join(source_ref);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| StoryError::Fetch {
                source_ref: source_ref.to_string(),
                reason: err.to_string(),
            })?;
        Ok(decode_story_bytes(source_ref, bytes))
    }
}

/// Load every unloaded story, awaiting each fetch in declaration order.
#[cfg(feature = "async")]
pub async fn load_stories_async<S: AsyncStorySource>(
    stories: &mut [Story],
    source: &S,
    opts: &LoadOptions,
) -> LoadReport {
    let mut report = LoadReport::default();
    for story in stories.iter_mut() {
        if story.is_loaded() {
            report.skipped += 1;
            continue;
        }
        let result = source.fetch(&story.source_ref).await;
        apply_fetch_result(story, result, opts, &mut report);
    }
    log::info!(
        "async story load complete: loaded={} failed={} skipped={}",
        report.loaded,
        report.failed,
        report.skipped
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stories() -> Vec<Story> {
        vec![
            Story::new(1, "One", "A", "1.A.txt", ""),
            Story::new(2, "Two", "B", "2.B.txt", ""),
        ]
    }

    #[test]
    fn failure_is_isolated_per_story() {
        let source = MemorySource::new().with_text("2.B.txt", "1→hello\n2→world");
        let mut stories = two_stories();

        let report = load_stories(&mut stories, &source, &LoadOptions::default());

        assert_eq!(
            report,
            LoadReport {
                loaded: 1,
                failed: 1,
                skipped: 0
            }
        );
        assert_eq!(
            stories[0].paragraphs(),
            Some(&[LOAD_FAILURE_PLACEHOLDER.to_string()][..])
        );
        assert_eq!(
            stories[1].paragraphs(),
            Some(&["hello".to_string(), "world".to_string()][..])
        );
    }

    #[test]
    fn loaded_stories_are_skipped() {
        let source = MemorySource::new()
            .with_text("1.A.txt", "fresh")
            .with_text("2.B.txt", "fresh");
        let mut stories = two_stories();
        stories[0].populate(vec!["kept".to_string()]);

        let report = load_stories(&mut stories, &source, &LoadOptions::default());

        assert_eq!(report.skipped, 1);
        assert_eq!(report.loaded, 1);
        assert_eq!(stories[0].paragraphs(), Some(&["kept".to_string()][..]));
    }

    #[test]
    fn custom_placeholder() {
        let opts = LoadOptions {
            placeholder: "unavailable".to_string(),
            ..LoadOptions::default()
        };
        let mut stories = two_stories();
        load_stories(&mut stories, &MemorySource::new(), &opts);
        assert!(stories
            .iter()
            .all(|s| s.paragraphs() == Some(&["unavailable".to_string()][..])));
    }

    #[test]
    fn invalid_utf8_loses_only_the_bad_byte() {
        let raw = b"1\xe2\x86\x92Good\n2\xe2\x86\x92bad \xff byte".to_vec();
        let text = decode_story_bytes("x.txt", raw);
        assert_eq!(
            normalize_text_with(&text, &NormalizeOptions::default()),
            vec!["Good", "bad \u{fffd} byte"]
        );
    }

    #[test]
    fn dir_source_reports_missing_file() {
        let source = DirSource::new(std::env::temp_dir().join("storybook-no-such-dir"));
        let err = source.fetch("missing.txt").expect_err("missing file");
        assert!(matches!(err, StoryError::Fetch { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }
}
