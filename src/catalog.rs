//! Story catalog: the ordered, id-unique list of stories shown by the viewer.
//!
//! A catalog comes from one of three places:
//! - [`Catalog::default_set`], the embedded fallback table;
//! - [`Catalog::from_json_str`] / [`Catalog::from_json_file`], a metadata array;
//! - [`Catalog::discover`], a scan of a directory of `<id>.<author>.txt` files.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoryError;
use crate::story::Story;

/// Title used when a discovered story file carries no title line.
pub const UNTITLED: &str = "무제";

const TITLE_LABEL: &str = "제목";
const IMAGE_DIRS: &[&str] = &["image/compressed", "image"];
const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

/// Metadata record as it appears in a catalog table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMeta {
    pub id: u32,
    pub title: String,
    pub author: String,
    /// Story text locator.
    pub file: String,
    /// Cover image locator.
    #[serde(default)]
    pub image: String,
}

impl From<StoryMeta> for Story {
    fn from(meta: StoryMeta) -> Self {
        Story::new(meta.id, meta.title, meta.author, meta.file, meta.image)
    }
}

impl From<&Story> for StoryMeta {
    fn from(story: &Story) -> Self {
        Self {
            id: story.id,
            title: story.title.clone(),
            author: story.author.clone(),
            file: story.source_ref.clone(),
            image: story.cover_image_ref.clone(),
        }
    }
}

/// Ordered set of stories with unique ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    stories: Vec<Story>,
}

impl Catalog {
    /// Build a catalog from metadata records, preserving their order.
    pub fn from_meta<I>(records: I) -> Result<Self, StoryError>
    where
        I: IntoIterator<Item = StoryMeta>,
    {
        let mut seen = BTreeSet::new();
        let mut stories = Vec::new();
        for meta in records {
            if !seen.insert(meta.id) {
                return Err(StoryError::DuplicateStoryId(meta.id));
            }
            if meta.file.trim().is_empty() {
                return Err(StoryError::Catalog(format!(
                    "story {} has an empty file reference",
                    meta.id
                )));
            }
            stories.push(Story::from(meta));
        }
        Ok(Self { stories })
    }

    /// Parse a JSON array of [`StoryMeta`] records.
    pub fn from_json_str(json: &str) -> Result<Self, StoryError> {
        let records: Vec<StoryMeta> = serde_json::from_str(json)?;
        Self::from_meta(records)
    }

    /// Read and parse a JSON metadata file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoryError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The embedded default story table.
    pub fn default_set() -> Self {
        let stories = DEFAULT_STORIES
            .iter()
            .map(|(id, title, author, file, image)| {
                Story::new(*id, *title, *author, *file, *image)
            })
            .collect();
        Self { stories }
    }

    /// Discover stories from a directory of `<id>.<author>.txt` files.
    ///
    /// Files are ordered by id. The title comes from the first
    /// `제목 : <title>` line; the cover is looked up under `image/compressed/`
    /// then `image/`. `source_ref` and `cover_image_ref` are relative to `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self, StoryError> {
        let dir = dir.as_ref();
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.ends_with(".txt") {
                continue;
            }
            let Some((id, author)) = parse_story_file_name(name) else {
                log::warn!("skipping {}: expected '<id>.<author>.txt'", name);
                continue;
            };
            let title = match fs::read_to_string(entry.path()) {
                Ok(text) => extract_title(&text).unwrap_or_else(|| UNTITLED.to_string()),
                Err(err) => {
                    log::warn!("cannot read {} for title: {}", name, err);
                    UNTITLED.to_string()
                }
            };
            let image = find_cover_image(dir, id, author).unwrap_or_default();
            found.push(StoryMeta {
                id,
                title,
                author: author.to_string(),
                file: name.to_string(),
                image,
            });
        }
        found.sort_by_key(|meta| meta.id);
        log::info!("discovered {} stories in {}", found.len(), dir.display());
        Self::from_meta(found)
    }

    /// Stories in declaration order.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Mutable access for loaders.
    pub fn stories_mut(&mut self) -> &mut [Story] {
        &mut self.stories
    }

    /// Consume the catalog.
    pub fn into_stories(self) -> Vec<Story> {
        self.stories
    }

    /// Look up a story by id.
    pub fn get(&self, id: u32) -> Option<&Story> {
        self.stories.iter().find(|story| story.id == id)
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Metadata table, e.g. for re-serializing a discovered catalog.
    pub fn to_meta(&self) -> Vec<StoryMeta> {
        self.stories.iter().map(StoryMeta::from).collect()
    }
}

fn parse_story_file_name(name: &str) -> Option<(u32, &str)> {
    let stem = name.strip_suffix(".txt")?;
    let (id, author) = stem.split_once('.')?;
    let id = id.parse::<u32>().ok()?;
    if author.is_empty() {
        return None;
    }
    Some((id, author))
}

fn extract_title(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let start = line.find(TITLE_LABEL)?;
        let rest = line[start + TITLE_LABEL.len()..].trim_start();
        let title = rest.strip_prefix(':')?.trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

fn find_cover_image(dir: &Path, id: u32, author: &str) -> Option<String> {
    let base = format!("{}.{}", id, author);
    for folder in IMAGE_DIRS {
        for ext in IMAGE_EXTENSIONS {
            let rel = format!("{}/{}.{}", folder, base, ext);
            if dir.join(&rel).is_file() {
                return Some(rel);
            }
        }
    }

    let prefix = format!("{}.", id);
    for folder in IMAGE_DIRS {
        let Ok(entries) = fs::read_dir(dir.join(folder)) else {
            continue;
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(&prefix))
            .collect();
        names.sort();
        if let Some(name) = names.into_iter().next() {
            return Some(format!("{}/{}", folder, name));
        }
    }
    None
}

type StoryRow = (u32, &'static str, &'static str, &'static str, &'static str);

const DEFAULT_STORIES: &[StoryRow] = &[
    (1, "시간우체통", "곽민서", "1.곽민서.txt", "image/compressed/1.곽민서.jpeg"),
    (2, "二", "김도연(2반)", "2.김도연(2반).txt", "image/compressed/2.김도연(2반).jpg"),
    (3, "일주일", "김우성", "3.김우성.txt", "image/compressed/3.김우성.png"),
    (4, "크리스마스의 기적", "김도연(3반)", "4.김도연(3반).txt", "image/compressed/4.김도연(3반).png"),
    (5, "🌸 이야기", "심서율", "5.심서율.txt", "image/compressed/5.심서율.png"),
    (6, "Creepy Smile", "고은준", "6.고은준.txt", "image/compressed/6.고은준.png"),
    (7, "폐교의 그림자", "박지환", "7.박지환.txt", "image/compressed/7.박지환.png"),
    (8, "그림자의 밤", "궉민아", "8.궉민아.txt", "image/compressed/8.궉민아.png"),
    (9, "라이벌", "신인수", "9.신인수.txt", "image/compressed/9.신인수.png"),
    (10, "노을 그리고, 달", "오민규", "10.오민규.txt", "image/compressed/10.오민규.png"),
    (11, "명호지야(冥呼之夜)", "김가은", "11.김가은.txt", "image/compressed/11.김가은.png"),
    (12, "오늘은 6월 14일", "김연지", "12.김연지.txt", "image/compressed/12.김연지.png"),
    (13, "랜과 밴드", "한신", "13.한신.txt", "image/compressed/13.한신.jpeg"),
    (14, "거울 속의 나", "문소희", "14.문소희.txt", "image/compressed/14.문소희.jpeg"),
    (15, "종소리", "장연재", "15.장연재.txt", "image/compressed/15.장연재.png"),
    (16, "봄을 건너, 너에게", "백시아", "16.백시아.txt", "image/compressed/16.백시아.jpeg"),
];
