use std::path::{Path, PathBuf};

pub const STORIES_DIR: &str = "tests/fixtures/stories";
pub const CATALOG_JSON: &str = "tests/fixtures/catalog.json";
pub const ENCODING_DIR: &str = "tests/fixtures/encoding";

pub fn stories_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(STORIES_DIR)
}

pub fn catalog_json() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(CATALOG_JSON)
}

#[allow(dead_code)]
pub fn encoding_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(ENCODING_DIR)
}

/// Paragraphs of every page of `story_id`, in order.
#[allow(dead_code)]
pub fn story_pages(seq: &storybook_render::PageSequence, story_id: u32) -> Vec<Vec<String>> {
    seq.pages()
        .iter()
        .filter(|page| page.story_id == Some(story_id))
        .map(|page| page.paragraphs.clone())
        .collect()
}
