//! Greedy first-fit pagination of story paragraphs.

use core::fmt;

use serde::Serialize;
use storybook::Story;

use crate::config::Viewport;
use crate::oracle::{Container, OverflowOracle, PageChrome, PageContent};

/// What a page is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageRole {
    Cover,
    Toc,
    Story,
    BackCover,
}

/// Position of a story page within its story.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageNumber {
    /// 1-based page number.
    pub current: usize,
    /// Pages in the story.
    pub total: usize,
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} / {}", self.current, self.total)
    }
}

/// One screen of content. Pages are rebuilt on every pagination pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub role: PageRole,
    /// Owning story; `None` for cover, TOC, and back cover.
    pub story_id: Option<u32>,
    /// 0-based index within the owning story.
    pub index_within_story: usize,
    pub paragraphs: Vec<String>,
    pub chrome: PageChrome,
    pub number: Option<PageNumber>,
}

impl Page {
    /// A page with no story content.
    pub fn fixed(role: PageRole) -> Self {
        Self {
            role,
            story_id: None,
            index_within_story: 0,
            paragraphs: Vec::new(),
            chrome: PageChrome::None,
            number: None,
        }
    }

    /// Display label, e.g. `Page 2 / 5`.
    pub fn label(&self) -> Option<String> {
        self.number.map(|n| n.to_string())
    }
}

/// Chrome applied to a story's first and continuation pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTemplates {
    pub first: PageChrome,
    pub rest: PageChrome,
}

impl Default for PageTemplates {
    fn default() -> Self {
        Self {
            first: PageChrome::TitleAndCover,
            rest: PageChrome::ContentOnly,
        }
    }
}

/// Splits stories into pages by querying an [`OverflowOracle`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Paginator {
    templates: PageTemplates,
}

impl Paginator {
    pub fn new(templates: PageTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> PageTemplates {
        self.templates
    }

    /// Paginate one story.
    ///
    /// Paragraphs are packed greedily in order and never split. A paragraph
    /// that overflows a page it has to itself stays there, except on the
    /// first page where it moves on and leaves the title chrome alone.
    /// Unloaded stories produce no pages; a loaded story without paragraphs
    /// gets one title page.
    pub fn paginate(
        &self,
        story: &Story,
        oracle: &dyn OverflowOracle,
        viewport: Viewport,
    ) -> Vec<Page> {
        let Some(paragraphs) = story.paragraphs() else {
            return Vec::new();
        };

        let mut pages: Vec<Page> = Vec::with_capacity(4);
        let mut current: Vec<String> = Vec::with_capacity(16);
        let mut chrome = self.templates.first;
        let mut queries = 0usize;

        for paragraph in paragraphs {
            if paragraph.trim().is_empty() {
                continue;
            }
            current.push(paragraph.clone());
            queries += 1;
            let content = PageContent {
                story_id: story.id,
                title: &story.title,
                paragraphs: &current,
            };
            if !oracle.overflows(&content, &Container { viewport, chrome }) {
                continue;
            }
            let title_page = pages.is_empty() && chrome != self.templates.rest;
            if current.len() == 1 && !title_page {
                // Too tall for any page; it keeps this one to itself.
                continue;
            }
            let overflowed = current.pop();
            pages.push(story_page(story.id, pages.len(), chrome, current));
            chrome = self.templates.rest;
            current = overflowed.into_iter().collect();
        }
        pages.push(story_page(story.id, pages.len(), chrome, current));

        let total = pages.len();
        for (idx, page) in pages.iter_mut().enumerate() {
            page.number = Some(PageNumber {
                current: idx + 1,
                total,
            });
        }

        log::debug!(
            "paginated story {}: paragraphs={} pages={} oracle_queries={}",
            story.id,
            paragraphs.len(),
            total,
            queries
        );
        pages
    }
}

fn story_page(story_id: u32, index: usize, chrome: PageChrome, paragraphs: Vec<String>) -> Page {
    Page {
        role: PageRole::Story,
        story_id: Some(story_id),
        index_within_story: index,
        paragraphs,
        chrome,
        number: None,
    }
}
