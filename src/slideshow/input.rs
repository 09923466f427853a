// Keyboard and pointer input routing
//
// The presentation layer owns one InputRouter for the window. An engine binds
// itself while it is active and receives an InputBinding guard; dropping the
// guard removes the binding, so no listener outlives the engine it targets.

use crate::models::Direction;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Keys the slideshow reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a key name coming from the UI layer.
    pub fn from_name(name: &str) -> Self {
        match name {
            "left" | "ArrowLeft" => Key::ArrowLeft,
            "right" | "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::ArrowLeft => Some(Direction::Previous),
            Key::ArrowRight => Some(Direction::Next),
            Key::Other => None,
        }
    }
}

/// Raw input delivered by the host window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    PointerCancel,
}

/// How the bound handler treated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResponse {
    /// Nothing bound, or the event had no meaning.
    Ignored,
    Handled,
    /// A horizontal drag is in progress; the host should not scroll.
    CaptureGesture,
}

/// Receiver of routed input.
pub trait InputHandler: Send + Sync {
    fn handle_input(&self, event: InputEvent) -> InputResponse;
}

#[derive(Default)]
struct RouterSlot {
    next_id: u64,
    current: Option<(u64, Weak<dyn InputHandler>)>,
}

/// Window-level input target with at most one bound handler.
#[derive(Clone, Default)]
pub struct InputRouter {
    slot: Arc<Mutex<RouterSlot>>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler`, replacing any existing binding.
    pub fn bind(&self, handler: Weak<dyn InputHandler>) -> InputBinding {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.next_id += 1;
        let id = slot.next_id;
        if slot.current.replace((id, handler)).is_some() {
            tracing::debug!("Input binding {} replaced a previous binding", id);
        }
        InputBinding {
            id,
            slot: Arc::downgrade(&self.slot),
        }
    }

    /// Deliver `event` to the bound handler, if any.
    pub fn dispatch(&self, event: InputEvent) -> InputResponse {
        let handler = {
            let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.current.as_ref().and_then(|(_, handler)| handler.upgrade())
        };

        match handler {
            Some(handler) => handler.handle_input(event),
            None => {
                tracing::trace!("Input {:?} dropped: nothing bound", event);
                InputResponse::Ignored
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.current
            .as_ref()
            .is_some_and(|(_, handler)| handler.strong_count() > 0)
    }
}

/// Guard for a router binding; dropping it unbinds.
#[must_use = "dropping the binding immediately unbinds the handler"]
pub struct InputBinding {
    id: u64,
    slot: Weak<Mutex<RouterSlot>>,
}

impl Drop for InputBinding {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.current.as_ref().is_some_and(|(id, _)| *id == self.id) {
            slot.current = None;
            tracing::debug!("Input binding {} released", self.id);
        }
    }
}
