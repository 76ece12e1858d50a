//! The flattened, navigable page list and its story index.

use serde::Serialize;
use storybook::Story;

use crate::config::Viewport;
use crate::oracle::OverflowOracle;
use crate::paginator::{Page, PageRole, Paginator};

/// Index of the cover page.
pub const COVER_PAGE_INDEX: usize = 0;
/// Index of the table-of-contents page.
pub const TOC_PAGE_INDEX: usize = 1;

/// Global page span of one story.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StorySpan {
    pub story_id: u32,
    /// First global page index of this story.
    pub first_page_index: usize,
    pub page_count: usize,
}

impl StorySpan {
    fn contains(&self, page_index: usize) -> bool {
        page_index >= self.first_page_index
            && page_index < self.first_page_index.saturating_add(self.page_count)
    }
}

/// One table-of-contents row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub story_id: u32,
    pub title: String,
    pub author: String,
    pub cover_image_ref: String,
    pub page_index: usize,
}

/// Logical reading position that survives re-pagination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReadingPosition {
    /// Somewhere inside a story; restored to that story's first page.
    Story(u32),
    Cover,
    Toc,
    /// Always the final page, however many story pages precede it.
    BackCover,
    /// Any other page at this global index.
    Page(usize),
}

/// Ordered pages: cover, TOC, each story's pages, back cover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageSequence {
    pages: Vec<Page>,
    spans: Vec<StorySpan>,
    toc: Vec<TocEntry>,
}

impl Default for PageSequence {
    fn default() -> Self {
        Self::skeleton()
    }
}

impl PageSequence {
    /// Cover, TOC, and back cover with no story pages.
    ///
    /// Shown while stories are still loading.
    pub fn skeleton() -> Self {
        Self {
            pages: vec![
                Page::fixed(PageRole::Cover),
                Page::fixed(PageRole::Toc),
                Page::fixed(PageRole::BackCover),
            ],
            spans: Vec::new(),
            toc: Vec::new(),
        }
    }

    /// Paginate every loaded story and flatten the result.
    ///
    /// Story pages follow story declaration order. Unloaded stories are
    /// absent from the sequence and from the table of contents.
    pub fn build(
        stories: &[Story],
        paginator: &Paginator,
        oracle: &dyn OverflowOracle,
        viewport: Viewport,
    ) -> Self {
        let mut pages = Vec::with_capacity(stories.len() * 4 + 3);
        pages.push(Page::fixed(PageRole::Cover));
        pages.push(Page::fixed(PageRole::Toc));

        let mut spans = Vec::with_capacity(stories.len());
        let mut toc = Vec::with_capacity(stories.len());
        for story in stories {
            let story_pages = paginator.paginate(story, oracle, viewport);
            if story_pages.is_empty() {
                continue;
            }
            let span = StorySpan {
                story_id: story.id,
                first_page_index: pages.len(),
                page_count: story_pages.len(),
            };
            toc.push(TocEntry {
                story_id: story.id,
                title: story.title.clone(),
                author: story.author.clone(),
                cover_image_ref: story.cover_image_ref.clone(),
                page_index: span.first_page_index,
            });
            spans.push(span);
            pages.extend(story_pages);
        }
        pages.push(Page::fixed(PageRole::BackCover));

        log::info!(
            "built page sequence: stories={} pages={} viewport={}x{}",
            spans.len(),
            pages.len(),
            viewport.width,
            viewport.height
        );
        Self { pages, spans, toc }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn story_spans(&self) -> &[StorySpan] {
        &self.spans
    }

    pub fn toc_entries(&self) -> &[TocEntry] {
        &self.toc
    }

    pub fn last_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    /// First global page of `story_id`, if it has pages.
    pub fn story_start(&self, story_id: u32) -> Option<usize> {
        self.spans
            .iter()
            .find(|span| span.story_id == story_id)
            .map(|span| span.first_page_index)
    }

    /// Story whose pages include `page_index`.
    pub fn story_at(&self, page_index: usize) -> Option<u32> {
        self.spans
            .iter()
            .find(|span| span.contains(page_index))
            .map(|span| span.story_id)
    }

    /// Capture the logical position of `page_index`.
    pub fn reading_position(&self, page_index: usize) -> ReadingPosition {
        if let Some(story_id) = self.story_at(page_index) {
            return ReadingPosition::Story(story_id);
        }
        match self.get(page_index).map(|page| page.role) {
            Some(PageRole::Cover) => ReadingPosition::Cover,
            Some(PageRole::Toc) => ReadingPosition::Toc,
            Some(PageRole::BackCover) => ReadingPosition::BackCover,
            _ => ReadingPosition::Page(page_index),
        }
    }

    /// Resolve a position captured from an earlier sequence into this one.
    ///
    /// Stories resolve to their first page and fixed pages keep their role.
    /// A story that is gone, or a raw index past the end, clamps to the last
    /// valid index.
    pub fn resolve_position(&self, position: ReadingPosition) -> usize {
        let index = match position {
            ReadingPosition::Story(story_id) => {
                self.story_start(story_id).unwrap_or(self.last_index())
            }
            ReadingPosition::Cover => COVER_PAGE_INDEX,
            ReadingPosition::Toc => TOC_PAGE_INDEX,
            ReadingPosition::BackCover => self.last_index(),
            ReadingPosition::Page(index) => index,
        };
        index.min(self.last_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FixedCapacityOracle;

    fn stories() -> Vec<Story> {
        vec![
            Story::new(1, "One", "A", "1.txt", "1.png").with_paragraphs(["a", "b", "c"]),
            Story::new(2, "Two", "B", "2.txt", "2.png"),
            Story::new(3, "Three", "C", "3.txt", "3.png").with_paragraphs(["x"]),
        ]
    }

    fn build(per_page: usize) -> PageSequence {
        PageSequence::build(
            &stories(),
            &Paginator::default(),
            &FixedCapacityOracle::new(per_page),
            Viewport::default(),
        )
    }

    #[test]
    fn layout_order_and_spans() {
        let seq = build(2);
        let roles: Vec<PageRole> = seq.pages().iter().map(|p| p.role).collect();
        assert_eq!(
            roles,
            vec![
                PageRole::Cover,
                PageRole::Toc,
                PageRole::Story,
                PageRole::Story,
                PageRole::Story,
                PageRole::BackCover
            ]
        );
        assert_eq!(seq.story_start(1), Some(2));
        assert_eq!(seq.story_start(2), None);
        assert_eq!(seq.story_start(3), Some(4));
        assert_eq!(seq.story_at(3), Some(1));
        assert_eq!(seq.story_at(5), None);
        let toc_ids: Vec<u32> = seq.toc_entries().iter().map(|e| e.story_id).collect();
        assert_eq!(toc_ids, vec![1, 3]);
    }

    #[test]
    fn exactly_one_cover_at_front() {
        let seq = build(1);
        assert_eq!(seq.get(COVER_PAGE_INDEX).map(|p| p.role), Some(PageRole::Cover));
        assert_eq!(seq.get(TOC_PAGE_INDEX).map(|p| p.role), Some(PageRole::Toc));
        let covers = seq
            .pages()
            .iter()
            .filter(|p| p.role == PageRole::Cover && p.story_id.is_none())
            .count();
        assert_eq!(covers, 1);
    }

    #[test]
    fn position_survives_reflow() {
        let narrow = build(1);
        // Page 4 is the third page of story 1 when one paragraph fits.
        let position = narrow.reading_position(4);
        assert_eq!(position, ReadingPosition::Story(1));

        let wide = build(10);
        assert_eq!(wide.resolve_position(position), 2);
        assert_eq!(wide.resolve_position(ReadingPosition::Story(3)), 3);
    }

    #[test]
    fn missing_story_and_stale_index_clamp() {
        let seq = build(10);
        assert_eq!(seq.resolve_position(ReadingPosition::Story(42)), seq.last_index());
        assert_eq!(seq.resolve_position(ReadingPosition::Page(99)), seq.last_index());
        assert_eq!(seq.resolve_position(ReadingPosition::Page(1)), 1);
    }

    #[test]
    fn skeleton_has_fixed_pages_only() {
        let seq = PageSequence::skeleton();
        assert_eq!(seq.len(), 3);
        assert!(seq.story_spans().is_empty());
        assert_eq!(seq.reading_position(1), ReadingPosition::Toc);
    }

    #[test]
    fn fixed_pages_keep_their_role_across_reflow() {
        let wide = build(10);
        let back = wide.reading_position(wide.last_index());
        assert_eq!(back, ReadingPosition::BackCover);
        assert_eq!(wide.reading_position(0), ReadingPosition::Cover);

        let narrow = build(1);
        assert!(narrow.len() > wide.len());
        let index = narrow.resolve_position(back);
        assert_eq!(index, narrow.last_index());
        assert_eq!(narrow.get(index).map(|p| p.role), Some(PageRole::BackCover));
        assert_eq!(narrow.resolve_position(ReadingPosition::Toc), TOC_PAGE_INDEX);
    }
}
