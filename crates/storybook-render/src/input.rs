//! Raw input events to navigation commands.

use serde::{Deserialize, Serialize};

/// Keys the viewer reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Home,
    Other,
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "Home" => Self::Home,
            _ => Self::Other,
        }
    }
}

/// On-screen navigation controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Control {
    Prev,
    Next,
    Home,
}

/// Input as delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputEvent {
    Key { key: Key },
    TouchStart { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },
    TocLink { story_id: u32 },
    Control { control: Control },
}

/// What the navigation controller should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum NavCommand {
    Next,
    Prev,
    Toc,
    Story { story_id: u32 },
}

/// Translation result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputOutcome {
    pub command: Option<NavCommand>,
    /// The host should suppress the event's default action (link navigation).
    pub prevent_default: bool,
}

impl InputOutcome {
    fn command(command: NavCommand) -> Self {
        Self {
            command: Some(command),
            prevent_default: false,
        }
    }
}

/// Horizontal swipe classifier.
///
/// A gesture counts as a swipe when `|dx| > axis_ratio * |dy|` and
/// `|dx| > min_distance`. Leftward swipes go forward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwipeTracker {
    min_distance: f32,
    axis_ratio: f32,
    start: Option<(f32, f32)>,
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(50.0, 2.0)
    }
}

impl SwipeTracker {
    pub fn new(min_distance: f32, axis_ratio: f32) -> Self {
        Self {
            min_distance,
            axis_ratio,
            start: None,
        }
    }

    pub fn touch_start(&mut self, x: f32, y: f32) {
        self.start = Some((x, y));
    }

    /// Finish a gesture. A touch end without a start is ignored.
    pub fn touch_end(&mut self, x: f32, y: f32) -> Option<NavCommand> {
        let (start_x, start_y) = self.start.take()?;
        let dx = x - start_x;
        let dy = y - start_y;
        let abs_dx = dx.abs();
        if abs_dx > dy.abs() * self.axis_ratio && abs_dx > self.min_distance {
            return Some(if dx < 0.0 {
                NavCommand::Next
            } else {
                NavCommand::Prev
            });
        }
        None
    }
}

/// Stateful input router: keyboard, controls, TOC links, and swipes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputRouter {
    swipe: SwipeTracker,
}

impl InputRouter {
    pub fn new(swipe: SwipeTracker) -> Self {
        Self { swipe }
    }

    pub fn translate(&mut self, event: InputEvent) -> InputOutcome {
        match event {
            InputEvent::Key { key } => match key {
                Key::ArrowLeft => InputOutcome::command(NavCommand::Prev),
                Key::ArrowRight => InputOutcome::command(NavCommand::Next),
                Key::Home => InputOutcome::command(NavCommand::Toc),
                Key::Other => InputOutcome::default(),
            },
            InputEvent::Control { control } => InputOutcome::command(match control {
                Control::Prev => NavCommand::Prev,
                Control::Next => NavCommand::Next,
                Control::Home => NavCommand::Toc,
            }),
            InputEvent::TocLink { story_id } => InputOutcome {
                command: Some(NavCommand::Story { story_id }),
                prevent_default: true,
            },
            InputEvent::TouchStart { x, y } => {
                self.swipe.touch_start(x, y);
                InputOutcome::default()
            }
            InputEvent::TouchEnd { x, y } => InputOutcome {
                command: self.swipe.touch_end(x, y),
                prevent_default: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe(dx: f32, dy: f32) -> Option<NavCommand> {
        let mut tracker = SwipeTracker::default();
        tracker.touch_start(200.0, 300.0);
        tracker.touch_end(200.0 + dx, 300.0 + dy)
    }

    #[test]
    fn swipe_classification() {
        assert_eq!(swipe(-80.0, 10.0), Some(NavCommand::Next));
        assert_eq!(swipe(80.0, -10.0), Some(NavCommand::Prev));
        // Too short.
        assert_eq!(swipe(-50.0, 0.0), None);
        // Too diagonal: 80 is not more than 2 * 40.
        assert_eq!(swipe(80.0, 40.0), None);
        assert_eq!(swipe(0.0, 200.0), None);
    }

    #[test]
    fn touch_end_without_start_is_ignored() {
        let mut tracker = SwipeTracker::default();
        assert_eq!(tracker.touch_end(0.0, 0.0), None);
        tracker.touch_start(100.0, 0.0);
        assert_eq!(tracker.touch_end(0.0, 0.0), Some(NavCommand::Next));
        assert_eq!(tracker.touch_end(-100.0, 0.0), None);
    }

    #[test]
    fn keyboard_mapping() {
        let mut router = InputRouter::default();
        let key = |name| InputEvent::Key {
            key: Key::from_name(name),
        };
        assert_eq!(router.translate(key("ArrowLeft")).command, Some(NavCommand::Prev));
        assert_eq!(router.translate(key("ArrowRight")).command, Some(NavCommand::Next));
        assert_eq!(router.translate(key("Home")).command, Some(NavCommand::Toc));
        assert_eq!(router.translate(key("Enter")).command, None);
    }

    #[test]
    fn toc_link_prevents_default() {
        let mut router = InputRouter::default();
        let outcome = router.translate(InputEvent::TocLink { story_id: 3 });
        assert_eq!(outcome.command, Some(NavCommand::Story { story_id: 3 }));
        assert!(outcome.prevent_default);
    }

    #[test]
    fn router_tracks_swipes_across_events() {
        let mut router = InputRouter::default();
        let start = router.translate(InputEvent::TouchStart { x: 300.0, y: 50.0 });
        assert_eq!(start.command, None);
        let end = router.translate(InputEvent::TouchEnd { x: 100.0, y: 60.0 });
        assert_eq!(end.command, Some(NavCommand::Next));
    }

    #[test]
    fn events_parse_from_json() {
        let event: InputEvent =
            serde_json::from_str(r#"{"type":"toc-link","story_id":7}"#).expect("valid event");
        assert_eq!(event, InputEvent::TocLink { story_id: 7 });
    }
}
