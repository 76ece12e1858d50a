//! Application context tying stories, pagination, and navigation together.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use storybook::{load_stories, LoadReport, Story, StorySource};

use crate::config::{Viewport, ViewerConfig};
use crate::input::{InputEvent, InputOutcome, InputRouter, NavCommand, SwipeTracker};
use crate::navigation::{MarkerSet, NavEvent, NavOutcome, NavigationController, Transition};
use crate::oracle::{HeuristicOracle, OverflowOracle};
use crate::paginator::{Page, Paginator};
use crate::schedule::Debouncer;
use crate::sequence::{PageSequence, TocEntry};

/// Work done by one [`Viewer::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Page committed by a finished transition.
    pub committed: Option<usize>,
    /// Whether a debounced re-pagination ran.
    pub repaginated: bool,
}

/// Result of [`Viewer::handle_input`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputResult {
    pub input: InputOutcome,
    pub navigation: NavOutcome,
}

/// Serializable view state for a presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub current_index: usize,
    pub total_pages: usize,
    pub is_transitioning: bool,
    pub transition: Option<Transition>,
    pub can_prev: bool,
    pub can_next: bool,
    pub viewport: Viewport,
    pub current_page: Option<Page>,
    /// Page being turned to, while a transition is in flight.
    pub target_page: Option<Page>,
    /// Pages carrying markers, with their markers.
    pub markers: Vec<(usize, MarkerSet)>,
    pub toc: Vec<TocEntry>,
    pub rebuilds: usize,
}

/// The viewer: owns stories, the page sequence, and navigation state.
pub struct Viewer {
    config: ViewerConfig,
    stories: Vec<Story>,
    oracle: Arc<dyn OverflowOracle>,
    paginator: Paginator,
    sequence: PageSequence,
    nav: NavigationController,
    input: InputRouter,
    resize: Debouncer,
    viewport: Viewport,
    rebuilds: usize,
}

impl core::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Viewer")
            .field("stories", &self.stories.len())
            .field("pages", &self.sequence.len())
            .field("nav", &self.nav)
            .field("viewport", &self.viewport)
            .field("rebuilds", &self.rebuilds)
            .finish()
    }
}

impl Viewer {
    /// Create a viewer showing the cover. Call [`Viewer::repaginate`] (or
    /// [`Viewer::load`]) once stories are loaded.
    pub fn new(config: ViewerConfig, stories: Vec<Story>, oracle: Arc<dyn OverflowOracle>) -> Self {
        let sequence = PageSequence::skeleton();
        let nav = NavigationController::new(sequence.len(), config.transition_duration());
        let input = InputRouter::new(SwipeTracker::new(
            config.swipe_min_distance,
            config.swipe_axis_ratio,
        ));
        let resize = Debouncer::new(config.resize_debounce());
        let viewport = config.viewport;
        Self {
            config,
            stories,
            oracle,
            paginator: Paginator::default(),
            sequence,
            nav,
            input,
            resize,
            viewport,
            rebuilds: 0,
        }
    }

    /// Viewer measuring with a [`HeuristicOracle`] built from `config.layout`.
    pub fn with_heuristic_oracle(config: ViewerConfig, stories: Vec<Story>) -> Self {
        let oracle = Arc::new(HeuristicOracle::new(config.layout));
        Self::new(config, stories, oracle)
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    /// Forward navigation events to `sink`.
    pub fn set_event_sink<F>(&mut self, sink: F)
    where
        F: FnMut(NavEvent) + Send + 'static,
    {
        self.nav.set_event_sink(sink);
    }

    /// Load every unloaded story from `source`, then rebuild pages.
    pub fn load(&mut self, source: &dyn StorySource) -> LoadReport {
        let report = load_stories(&mut self.stories, source, &self.config.load_options());
        self.repaginate();
        report
    }

    /// Rebuild the page sequence for the current viewport.
    ///
    /// The reader stays on the story they were reading (its first page), or
    /// on the same non-story page, clamped to the new length.
    pub fn repaginate(&mut self) {
        let position = self.sequence.reading_position(self.nav.current_index());
        self.sequence = PageSequence::build(
            &self.stories,
            &self.paginator,
            self.oracle.as_ref(),
            self.viewport,
        );
        let index = self.sequence.resolve_position(position);
        self.nav.replace_sequence(self.sequence.len(), index);
        self.rebuilds += 1;
        log::debug!(
            "repaginated: position={:?} -> index {} of {}",
            position,
            index,
            self.sequence.len()
        );
    }

    /// Record a viewport change. Re-pagination runs from [`Viewer::tick`]
    /// once resizes stop for the debounce period.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        self.viewport = viewport;
        self.resize.notify(now);
    }

    /// Advance timers: commit finished transitions, run debounced rebuilds.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let committed = self.nav.tick(now);
        let repaginated = self.resize.poll(now);
        if repaginated {
            self.repaginate();
        }
        TickReport {
            committed,
            repaginated,
        }
    }

    /// Earliest instant at which [`Viewer::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.nav.transition_deadline(), self.resize.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> InputResult {
        let input = self.input.translate(event);
        let navigation = match input.command {
            Some(command) => self.dispatch(command, now),
            None => NavOutcome::Ignored,
        };
        InputResult { input, navigation }
    }

    pub fn dispatch(&mut self, command: NavCommand, now: Instant) -> NavOutcome {
        match command {
            NavCommand::Next => self.nav.next(now),
            NavCommand::Prev => self.nav.prev(now),
            NavCommand::Toc => self.nav.go_to_toc(now),
            NavCommand::Story { story_id } => self.go_to_story(story_id, now),
        }
    }

    pub fn next(&mut self, now: Instant) -> NavOutcome {
        self.nav.next(now)
    }

    pub fn prev(&mut self, now: Instant) -> NavOutcome {
        self.nav.prev(now)
    }

    pub fn go_to(&mut self, index: usize, now: Instant) -> NavOutcome {
        self.nav.go_to(index, now)
    }

    pub fn go_to_toc(&mut self, now: Instant) -> NavOutcome {
        self.nav.go_to_toc(now)
    }

    pub fn go_to_story(&mut self, story_id: u32, now: Instant) -> NavOutcome {
        self.nav.go_to_story(&self.sequence, story_id, now)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn story(&self, id: u32) -> Option<&Story> {
        self.stories.iter().find(|story| story.id == id)
    }

    pub fn sequence(&self) -> &PageSequence {
        &self.sequence
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Completed re-pagination passes.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.sequence.get(self.nav.current_index())
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let transition = self.nav.transition();
        let markers = self
            .nav
            .marked_pages()
            .into_iter()
            .filter_map(|page| self.nav.markers(page).map(|m| (page, m.clone())))
            .collect();
        ViewerSnapshot {
            current_index: self.nav.current_index(),
            total_pages: self.sequence.len(),
            is_transitioning: transition.is_some(),
            transition,
            can_prev: self.nav.can_prev(),
            can_next: self.nav.can_next(),
            viewport: self.viewport,
            current_page: self.current_page().cloned(),
            target_page: transition.and_then(|t| self.sequence.get(t.to).cloned()),
            markers,
            toc: self.sequence.toc_entries().to_vec(),
            rebuilds: self.rebuilds,
        }
    }
}
