//! Page navigation state machine with timed, interruptible page turns.
//!
//! The controller tracks the committed page index and at most one in-flight
//! [`Transition`]. Presentation state is expressed as per-page [`MarkerSet`]s
//! (`Active`, `TurningForward`, `TurningBackward`) that a renderer animates.
//! A transition commits when its [`ScheduledTask`] fires from [`tick`].
//! A new request during a transition abandons it immediately: markers of
//! both pages involved are cleared and the new transition starts from the
//! committed index. Requests are never queued.
//!
//! [`tick`]: NavigationController::tick

use std::time::{Duration, Instant};

use serde::Serialize;
use smallvec::SmallVec;

use crate::schedule::ScheduledTask;
use crate::sequence::{PageSequence, TOC_PAGE_INDEX};

/// Presentation state marker applied to a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    /// Page is visible.
    Active,
    /// Outgoing page flipping away during a forward turn.
    TurningForward,
    /// Incoming page flipping in during a backward turn.
    TurningBackward,
}

/// Small set of markers on one page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkerSet(SmallVec<[Marker; 2]>);

impl MarkerSet {
    pub fn active() -> Self {
        let mut set = Self::default();
        set.insert(Marker::Active);
        set
    }

    pub fn insert(&mut self, marker: Marker) {
        if !self.contains(marker) {
            self.0.push(marker);
        }
    }

    pub fn remove(&mut self, marker: Marker) {
        self.0.retain(|m| *m != marker);
    }

    pub fn contains(&self, marker: Marker) -> bool {
        self.0.contains(&marker)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Marker> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Forward,
    Backward,
}

/// An in-flight page turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub direction: Direction,
    pub from: usize,
    pub to: usize,
}

/// Controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NavState {
    Idle,
    Transitioning(Transition),
}

/// Snapshot of the committed position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub current_index: usize,
    pub is_transitioning: bool,
}

/// Result of a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    /// Out of bounds or at a boundary; nothing changed.
    Ignored,
    /// Target was the committed page; its `Active` marker was re-applied.
    Reapplied,
    /// A transition started from idle.
    Started(Transition),
    /// An in-flight transition was abandoned, and optionally replaced.
    Interrupted {
        abandoned: Transition,
        started: Option<Transition>,
    },
}

/// Signals for presentation collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NavEvent {
    MarkersChanged { page: usize, markers: MarkerSet },
    TransitionStarted { transition: Transition },
    TransitionCompleted { index: usize },
    /// Reset the scroll offset of this page's content region.
    ScrollToTop { page: usize },
    /// 1-based current page and total page count.
    IndicatorChanged { current: usize, total: usize },
    ControlsChanged { can_prev: bool, can_next: bool },
}

type EventSink = Box<dyn FnMut(NavEvent) + Send + 'static>;

/// Navigation over a page sequence of fixed length.
pub struct NavigationController {
    len: usize,
    current: usize,
    state: NavState,
    task: ScheduledTask,
    duration: Duration,
    markers: Vec<MarkerSet>,
    sink: Option<EventSink>,
}

impl core::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NavigationController")
            .field("len", &self.len)
            .field("current", &self.current)
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl NavigationController {
    /// Controller over `len` pages, showing page 0.
    pub fn new(len: usize, duration: Duration) -> Self {
        let mut markers = vec![MarkerSet::default(); len];
        if let Some(first) = markers.first_mut() {
            first.insert(Marker::Active);
        }
        Self {
            len,
            current: 0,
            state: NavState::Idle,
            task: ScheduledTask::new(),
            duration,
            markers,
            sink: None,
        }
    }

    /// Install a callback that receives every [`NavEvent`].
    pub fn set_event_sink<F>(&mut self, sink: F)
    where
        F: FnMut(NavEvent) + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn nav_state(&self) -> NavState {
        self.state
    }

    pub fn state(&self) -> NavigationState {
        NavigationState {
            current_index: self.current,
            is_transitioning: self.is_transitioning(),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, NavState::Transitioning(_))
    }

    pub fn transition(&self) -> Option<Transition> {
        match self.state {
            NavState::Transitioning(t) => Some(t),
            NavState::Idle => None,
        }
    }

    /// When the in-flight transition will commit.
    pub fn transition_deadline(&self) -> Option<Instant> {
        self.task.deadline()
    }

    pub fn transition_duration(&self) -> Duration {
        self.duration
    }

    pub fn markers(&self, page: usize) -> Option<&MarkerSet> {
        self.markers.get(page)
    }

    /// Pages that currently carry any marker.
    pub fn marked_pages(&self) -> Vec<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn can_prev(&self) -> bool {
        self.current > 0
    }

    pub fn can_next(&self) -> bool {
        self.current + 1 < self.len
    }

    /// Navigate to `index`.
    pub fn go_to(&mut self, index: usize, now: Instant) -> NavOutcome {
        if index >= self.len {
            return NavOutcome::Ignored;
        }

        let abandoned = self.abandon_transition();

        if index == self.current {
            self.mark(index, Marker::Active);
            self.emit_position();
            return match abandoned {
                Some(abandoned) => NavOutcome::Interrupted {
                    abandoned,
                    started: None,
                },
                None => NavOutcome::Reapplied,
            };
        }

        let transition = Transition {
            direction: if index > self.current {
                Direction::Forward
            } else {
                Direction::Backward
            },
            from: self.current,
            to: index,
        };
        self.mark(transition.from, Marker::Active);
        match transition.direction {
            Direction::Forward => {
                self.mark(transition.to, Marker::Active);
                self.mark(transition.from, Marker::TurningForward);
            }
            Direction::Backward => {
                self.mark(transition.to, Marker::Active);
                self.mark(transition.to, Marker::TurningBackward);
            }
        }
        self.task.schedule(now, self.duration);
        self.state = NavState::Transitioning(transition);
        log::debug!(
            "page turn {:?}: {} -> {}",
            transition.direction,
            transition.from,
            transition.to
        );
        self.emit(NavEvent::TransitionStarted { transition });

        match abandoned {
            Some(abandoned) => NavOutcome::Interrupted {
                abandoned,
                started: Some(transition),
            },
            None => NavOutcome::Started(transition),
        }
    }

    /// Move by `delta` pages. Targets below 0 or past the end are ignored.
    pub fn step(&mut self, delta: isize, now: Instant) -> NavOutcome {
        match self.current.checked_add_signed(delta) {
            Some(index) => self.go_to(index, now),
            None => NavOutcome::Ignored,
        }
    }

    pub fn next(&mut self, now: Instant) -> NavOutcome {
        if !self.can_next() {
            return NavOutcome::Ignored;
        }
        self.go_to(self.current + 1, now)
    }

    pub fn prev(&mut self, now: Instant) -> NavOutcome {
        if !self.can_prev() {
            return NavOutcome::Ignored;
        }
        self.go_to(self.current - 1, now)
    }

    pub fn go_to_toc(&mut self, now: Instant) -> NavOutcome {
        self.go_to(TOC_PAGE_INDEX, now)
    }

    /// Navigate to the first page of `story_id` in `sequence`.
    pub fn go_to_story(
        &mut self,
        sequence: &PageSequence,
        story_id: u32,
        now: Instant,
    ) -> NavOutcome {
        match sequence.story_start(story_id) {
            Some(index) => self.go_to(index, now),
            None => {
                log::debug!("story {} has no pages; ignoring", story_id);
                NavOutcome::Ignored
            }
        }
    }

    /// Commit the in-flight transition if its duration has elapsed.
    ///
    /// Returns the newly committed index.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        if !self.task.poll(now) {
            return None;
        }
        self.commit()
    }

    /// Commit the in-flight transition immediately.
    pub fn finish_transition(&mut self) -> Option<usize> {
        self.task.cancel();
        self.commit()
    }

    /// Adopt a rebuilt sequence of `len` pages and snap to `index`.
    ///
    /// Any transition is dropped without animation. `index` is clamped.
    pub fn replace_sequence(&mut self, len: usize, index: usize) {
        self.task.cancel();
        self.state = NavState::Idle;
        self.len = len;
        self.markers = vec![MarkerSet::default(); len];
        self.current = index.min(len.saturating_sub(1));
        if len > 0 {
            self.mark(self.current, Marker::Active);
        }
        self.emit(NavEvent::ScrollToTop { page: self.current });
        self.emit_position();
    }

    fn commit(&mut self) -> Option<usize> {
        let NavState::Transitioning(t) = self.state else {
            return None;
        };
        self.state = NavState::Idle;
        self.clear(t.from);
        self.set_markers(t.to, MarkerSet::active());
        self.current = t.to;
        self.emit(NavEvent::TransitionCompleted { index: t.to });
        self.emit(NavEvent::ScrollToTop { page: t.to });
        self.emit_position();
        Some(t.to)
    }

    fn abandon_transition(&mut self) -> Option<Transition> {
        let NavState::Transitioning(t) = self.state else {
            return None;
        };
        self.task.cancel();
        self.state = NavState::Idle;
        self.clear(t.from);
        self.clear(t.to);
        log::debug!("page turn {} -> {} interrupted", t.from, t.to);
        Some(t)
    }

    fn mark(&mut self, page: usize, marker: Marker) {
        let Some(set) = self.markers.get_mut(page) else {
            return;
        };
        if set.contains(marker) {
            return;
        }
        set.insert(marker);
        let markers = set.clone();
        self.emit(NavEvent::MarkersChanged { page, markers });
    }

    fn clear(&mut self, page: usize) {
        self.set_markers(page, MarkerSet::default());
    }

    fn set_markers(&mut self, page: usize, markers: MarkerSet) {
        let Some(set) = self.markers.get_mut(page) else {
            return;
        };
        if *set == markers {
            return;
        }
        *set = markers.clone();
        self.emit(NavEvent::MarkersChanged { page, markers });
    }

    fn emit_position(&mut self) {
        let indicator = NavEvent::IndicatorChanged {
            current: self.current + 1,
            total: self.len,
        };
        let controls = NavEvent::ControlsChanged {
            can_prev: self.can_prev(),
            can_next: self.can_next(),
        };
        self.emit(indicator);
        self.emit(controls);
    }

    fn emit(&mut self, event: NavEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const TURN: Duration = Duration::from_millis(300);

    fn controller(len: usize) -> NavigationController {
        NavigationController::new(len, TURN)
    }

    fn settle(nav: &mut NavigationController, now: Instant) -> Instant {
        let later = now + TURN;
        nav.tick(later);
        later
    }

    #[test]
    fn out_of_bounds_is_noop() {
        let t0 = Instant::now();
        let mut nav = controller(10);
        assert_eq!(nav.go_to(10, t0), NavOutcome::Ignored);
        assert_eq!(nav.step(-1, t0), NavOutcome::Ignored);
        assert_eq!(nav.prev(t0), NavOutcome::Ignored);
        assert_eq!(nav.current_index(), 0);
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn same_index_reapplies_active() {
        let t0 = Instant::now();
        let mut nav = controller(3);
        assert_eq!(nav.go_to(0, t0), NavOutcome::Reapplied);
        assert!(nav.markers(0).is_some_and(|m| m.contains(Marker::Active)));
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn forward_turn_commits_after_duration() {
        let t0 = Instant::now();
        let mut nav = controller(5);
        let outcome = nav.go_to(3, t0);
        assert_eq!(
            outcome,
            NavOutcome::Started(Transition {
                direction: Direction::Forward,
                from: 0,
                to: 3
            })
        );
        assert!(nav.markers(0).is_some_and(|m| m.contains(Marker::TurningForward)));
        assert!(nav.markers(3).is_some_and(|m| m.contains(Marker::Active)));

        assert_eq!(nav.tick(t0 + Duration::from_millis(299)), None);
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.tick(t0 + TURN), Some(3));
        assert_eq!(nav.current_index(), 3);
        assert_eq!(nav.marked_pages(), vec![3]);
        assert_eq!(nav.markers(3), Some(&MarkerSet::active()));
    }

    #[test]
    fn backward_turn_marks_incoming_page() {
        let t0 = Instant::now();
        let mut nav = controller(5);
        nav.go_to(4, t0);
        let t1 = settle(&mut nav, t0);
        nav.prev(t1);
        let incoming = nav.markers(3).cloned().unwrap_or_default();
        assert!(incoming.contains(Marker::Active));
        assert!(incoming.contains(Marker::TurningBackward));
        assert!(nav.markers(4).is_some_and(|m| m.contains(Marker::Active)));
        settle(&mut nav, t1);
        assert_eq!(nav.current_index(), 3);
        assert_eq!(nav.marked_pages(), vec![3]);
    }

    #[test]
    fn interruption_leaves_no_residue() {
        let t0 = Instant::now();
        let mut nav = controller(10);
        nav.go_to(5, t0);
        let outcome = nav.go_to(2, t0 + Duration::from_millis(50));
        assert!(matches!(
            outcome,
            NavOutcome::Interrupted {
                abandoned: Transition { to: 5, .. },
                started: Some(Transition { to: 2, .. })
            }
        ));
        assert!(nav.markers(5).is_some_and(MarkerSet::is_empty));

        // The abandoned deadline must not commit page 5.
        assert_eq!(nav.tick(t0 + TURN), None);
        assert_eq!(nav.tick(t0 + Duration::from_millis(350)), Some(2));
        assert_eq!(nav.current_index(), 2);
        assert_eq!(nav.marked_pages(), vec![2]);
    }

    #[test]
    fn returning_to_committed_page_cancels_turn() {
        let t0 = Instant::now();
        let mut nav = controller(4);
        nav.go_to(2, t0);
        let outcome = nav.go_to(0, t0);
        assert!(matches!(
            outcome,
            NavOutcome::Interrupted { started: None, .. }
        ));
        assert!(!nav.is_transitioning());
        assert_eq!(nav.tick(t0 + TURN), None);
        assert_eq!(nav.marked_pages(), vec![0]);
    }

    #[test]
    fn next_uses_committed_index_mid_turn() {
        let t0 = Instant::now();
        let mut nav = controller(4);
        nav.next(t0);
        nav.next(t0);
        // Both requests target page 1: the second one restarts that turn.
        settle(&mut nav, t0);
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn boundaries_toggle_controls() {
        let t0 = Instant::now();
        let mut nav = controller(2);
        assert!(!nav.can_prev());
        assert!(nav.can_next());
        nav.next(t0);
        settle(&mut nav, t0);
        assert!(nav.can_prev());
        assert!(!nav.can_next());
        assert_eq!(nav.next(t0), NavOutcome::Ignored);
    }

    #[test]
    fn events_report_scroll_and_indicator() {
        let t0 = Instant::now();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut nav = controller(3);
        nav.set_event_sink(move |event| sink.lock().expect("sink lock").push(event));

        nav.go_to_toc(t0);
        settle(&mut nav, t0);

        let events = events.lock().expect("events lock");
        assert!(events.contains(&NavEvent::ScrollToTop { page: 1 }));
        assert!(events.contains(&NavEvent::IndicatorChanged {
            current: 2,
            total: 3
        }));
        assert!(events.contains(&NavEvent::ControlsChanged {
            can_prev: true,
            can_next: true
        }));
    }

    #[test]
    fn replace_sequence_snaps_and_clamps() {
        let t0 = Instant::now();
        let mut nav = controller(10);
        nav.go_to(8, t0);
        nav.replace_sequence(4, 8);
        assert!(!nav.is_transitioning());
        assert_eq!(nav.current_index(), 3);
        assert_eq!(nav.marked_pages(), vec![3]);
        assert_eq!(nav.tick(t0 + TURN), None);
    }

    #[test]
    fn finish_transition_commits_immediately() {
        let t0 = Instant::now();
        let mut nav = controller(3);
        nav.go_to(2, t0);
        assert_eq!(nav.finish_transition(), Some(2));
        assert_eq!(nav.finish_transition(), None);
    }
}
