use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;

/// A deferred scene-graph transition. Posted by handlers, applied by the
/// orchestrator on the next pump so the scene graph is never mutated while
/// a dispatch call stack is still executing on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneChange {
    pub target: String,
    pub detail: bool,
}

impl SceneChange {
    pub fn scene(target: impl Into<String>) -> Self {
        SceneChange {
            target: target.into(),
            detail: false,
        }
    }

    pub fn detail(target: impl Into<String>) -> Self {
        SceneChange {
            target: target.into(),
            detail: true,
        }
    }
}

/// Generic named event for the presentation shell: save/load/restart
/// requests, inventory-changed notifications, end-game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ScreenEvent {
    pub fn named(name: impl Into<String>) -> Self {
        ScreenEvent {
            name: name.into(),
            data: None,
        }
    }

    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        ScreenEvent {
            name: name.into(),
            data: Some(data),
        }
    }
}

/// The deferred event queue. Holds at most one pending scene change (a
/// later post in the same tick supersedes the earlier one) and a FIFO of
/// screen events delivered exactly once in post order. History mirrors the
/// pending queues so tests and tooling can replay what happened.
#[derive(Debug, Default)]
pub struct EventQueue {
    scene_change: Option<SceneChange>,
    screen: VecDeque<ScreenEvent>,
    history: Vec<String>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last request wins; once taken, a change is not revocable.
    pub fn post_scene_change(&mut self, change: SceneChange) {
        let kind = if change.detail { "detail" } else { "scene" };
        self.history.push(format!("queue.{kind} {}", change.target));
        self.scene_change = Some(change);
    }

    pub fn take_scene_change(&mut self) -> Option<SceneChange> {
        self.scene_change.take()
    }

    pub fn has_pending_change(&self) -> bool {
        self.scene_change.is_some()
    }

    pub fn post_screen(&mut self, event: ScreenEvent) {
        self.history.push(format!("queue.screen {}", event.name));
        self.screen.push_back(event);
    }

    pub fn next_screen(&mut self) -> Option<ScreenEvent> {
        self.screen.pop_front()
    }

    pub fn drain_screen(&mut self) -> Vec<ScreenEvent> {
        self.screen.drain(..).collect()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_scene_change_supersedes_earlier() {
        let mut queue = EventQueue::new();
        queue.post_scene_change(SceneChange::scene("bridge"));
        queue.post_scene_change(SceneChange::scene("mess"));

        assert_eq!(
            queue.take_scene_change(),
            Some(SceneChange::scene("mess"))
        );
        assert_eq!(queue.take_scene_change(), None);
    }

    #[test]
    fn screen_events_are_delivered_once_in_post_order() {
        let mut queue = EventQueue::new();
        queue.post_screen(ScreenEvent::named("inventory.changed"));
        queue.post_screen(ScreenEvent::named("save"));

        assert_eq!(
            queue.next_screen().map(|event| event.name),
            Some("inventory.changed".to_string())
        );
        assert_eq!(
            queue.next_screen().map(|event| event.name),
            Some("save".to_string())
        );
        assert_eq!(queue.next_screen(), None);
    }

    #[test]
    fn history_records_posts() {
        let mut queue = EventQueue::new();
        queue.post_scene_change(SceneChange::detail("bridge.comp"));
        queue.post_screen(ScreenEvent::named("end_game"));
        assert_eq!(
            queue.history(),
            ["queue.detail bridge.comp", "queue.screen end_game"]
        );
    }
}
