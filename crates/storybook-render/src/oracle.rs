//! Overflow measurement capability consumed by the paginator.
//!
//! The paginator never measures text itself. It asks an [`OverflowOracle`]
//! whether a candidate page's content overflows its container, the way a
//! browser would compare a content box's scroll height with its client height.

use serde::Serialize;

use crate::config::{LayoutConfig, Viewport};

/// Page furniture that competes with content for vertical space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageChrome {
    /// Cover, TOC, and back-cover pages.
    None,
    /// First story page: title heading plus cover image.
    TitleAndCover,
    /// Continuation story page.
    ContentOnly,
}

/// Candidate content for one page.
#[derive(Clone, Copy, Debug)]
pub struct PageContent<'a> {
    pub story_id: u32,
    pub title: &'a str,
    pub paragraphs: &'a [String],
}

/// Sized container the content is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Container {
    pub viewport: Viewport,
    pub chrome: PageChrome,
}

/// Reports whether page content overflows its container.
pub trait OverflowOracle: Send + Sync {
    fn overflows(&self, content: &PageContent<'_>, container: &Container) -> bool;
}

/// Oracle that never reports overflow; every story fits on one page.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverOverflow;

impl OverflowOracle for NeverOverflow {
    fn overflows(&self, _content: &PageContent<'_>, _container: &Container) -> bool {
        false
    }
}

/// Oracle that overflows once a page holds more than a fixed paragraph count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedCapacityOracle {
    /// Paragraphs per continuation page.
    pub per_page: usize,
    /// Paragraphs on a story's first page; `None` uses `per_page`.
    pub first_page: Option<usize>,
}

impl FixedCapacityOracle {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page,
            first_page: None,
        }
    }

    pub fn with_first_page(mut self, first_page: usize) -> Self {
        self.first_page = Some(first_page);
        self
    }
}

impl OverflowOracle for FixedCapacityOracle {
    fn overflows(&self, content: &PageContent<'_>, container: &Container) -> bool {
        let capacity = match container.chrome {
            PageChrome::TitleAndCover => self.first_page.unwrap_or(self.per_page),
            _ => self.per_page,
        };
        content.paragraphs.len() > capacity
    }
}

/// Height estimate from [`LayoutConfig`] metrics.
///
/// Lines are estimated by summing glyph advances (full-width glyphs such as
/// Hangul and CJK ideographs count as `wide_glyph_em`) and dividing by the
/// content width. Overflow is `content > available + overflow_tolerance_px`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeuristicOracle {
    cfg: LayoutConfig,
}

impl HeuristicOracle {
    pub fn new(cfg: LayoutConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Vertical space left for paragraphs in `container`.
    pub fn available_height(&self, container: &Container) -> f32 {
        let base = self.cfg.content_height(container.viewport);
        let chrome = match container.chrome {
            PageChrome::TitleAndCover => self
                .cfg
                .title_block_px
                .saturating_add(self.cfg.cover_image_px),
            PageChrome::None | PageChrome::ContentOnly => 0,
        };
        (base - chrome as f32).max(0.0)
    }

    /// Estimated rendered height of `paragraphs` at `viewport` width.
    pub fn content_height(&self, paragraphs: &[String], viewport: Viewport) -> f32 {
        let width = self.cfg.content_width(viewport);
        let line_px = self.cfg.line_px();
        paragraphs
            .iter()
            .map(|p| {
                self.estimate_lines(p, width) as f32 * line_px + self.cfg.paragraph_gap_px as f32
            })
            .sum()
    }

    fn estimate_lines(&self, text: &str, width: f32) -> usize {
        let advance: f32 = text
            .chars()
            .map(|ch| {
                let em = if is_wide_glyph(ch) {
                    self.cfg.wide_glyph_em
                } else {
                    self.cfg.narrow_glyph_em
                };
                em * self.cfg.font_size_px
            })
            .sum();
        let lines = (advance / width).ceil();
        if lines.is_finite() && lines >= 1.0 {
            lines as usize
        } else {
            1
        }
    }
}

impl OverflowOracle for HeuristicOracle {
    fn overflows(&self, content: &PageContent<'_>, container: &Container) -> bool {
        let used = self.content_height(content.paragraphs, container.viewport);
        used > self.available_height(container) + self.cfg.overflow_tolerance_px
    }
}

fn is_wide_glyph(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x11FF
            | 0x2E80..=0x303F
            | 0x3040..=0x30FF
            | 0x3130..=0x318F
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1FAFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(chrome: PageChrome) -> Container {
        Container {
            viewport: Viewport::new(480, 800),
            chrome,
        }
    }

    fn content(paragraphs: &[String]) -> PageContent<'_> {
        PageContent {
            story_id: 1,
            title: "t",
            paragraphs,
        }
    }

    #[test]
    fn fixed_capacity_respects_first_page() {
        let oracle = FixedCapacityOracle::new(3).with_first_page(1);
        let two = vec!["a".to_string(), "b".to_string()];
        assert!(oracle.overflows(&content(&two), &container(PageChrome::TitleAndCover)));
        assert!(!oracle.overflows(&content(&two), &container(PageChrome::ContentOnly)));
    }

    #[test]
    fn wide_glyphs_take_more_lines() {
        let oracle = HeuristicOracle::default();
        let viewport = Viewport::new(200, 800);
        let latin = vec!["a".repeat(40)];
        let hangul = vec!["가".repeat(40)];
        assert!(
            oracle.content_height(&hangul, viewport) > oracle.content_height(&latin, viewport)
        );
    }

    #[test]
    fn first_page_chrome_reduces_space() {
        let oracle = HeuristicOracle::default();
        let first = oracle.available_height(&container(PageChrome::TitleAndCover));
        let rest = oracle.available_height(&container(PageChrome::ContentOnly));
        assert_eq!(rest - first, 276.0);
    }

    #[test]
    fn tolerance_admits_exact_fit() {
        let cfg = LayoutConfig {
            margin_top: 0,
            margin_bottom: 0,
            page_number_px: 0,
            paragraph_gap_px: 0,
            font_size_px: 10.0,
            line_height: 2.0,
            ..LayoutConfig::default()
        };
        let oracle = HeuristicOracle::new(cfg);
        // 5 one-line paragraphs * 20px = 100px in a 100px box.
        let paragraphs: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let boxed = Container {
            viewport: Viewport::new(480, 100),
            chrome: PageChrome::ContentOnly,
        };
        assert!(!oracle.overflows(&content(&paragraphs), &boxed));
        let mut six = paragraphs.clone();
        six.push("x".to_string());
        assert!(oracle.overflows(&content(&six), &boxed));
    }

    #[test]
    fn never_overflow_is_constant() {
        let many: Vec<String> = (0..1000).map(|i| i.to_string()).collect();
        assert!(!NeverOverflow.overflows(&content(&many), &container(PageChrome::ContentOnly)));
    }
}
