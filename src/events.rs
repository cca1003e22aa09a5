//! Typed event bus
//!
//! Every topic the game publishes is a [`GameEvent`] variant with a typed
//! payload. Components subscribe a handler to an [`EventKind`] and get back a
//! [`SubscriptionId`] they must hand back to [`EventBus::unsubscribe`] when
//! they go away.
//!
//! # Delivery
//!
//! Delivery is synchronous and in subscription order, inside the call to
//! [`EventBus::publish`]. A handler cannot reach the bus directly; it
//! publishes follow-up events through the [`Outbox`] it is given. Those are
//! delivered depth-first as soon as the handler returns, before the next
//! subscriber of the original event runs. Chains nested deeper than
//! [`MAX_PUBLISH_DEPTH`] are dropped.
//!
//! A handler returning an error is logged and delivery carries on with the
//! next subscriber.

use crate::error::GameResult;
use crate::resources::ResourceCategory;
use crate::scene::{SceneName, TransferOptions};
use sdl2::keyboard::{Keycode, Mod};
use sdl2::mouse::MouseButton;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, trace, warn};

/// Publish chains nested deeper than this are dropped
pub const MAX_PUBLISH_DEPTH: usize = 32;

/// Mouse buttons held during a motion event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

/// Everything that travels over the bus
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // === Input ===
    MouseMove {
        pos: (i32, i32),
        rel: (i32, i32),
        buttons: MouseButtons,
    },
    MouseDown {
        pos: (i32, i32),
        button: MouseButton,
    },
    MouseUp {
        pos: (i32, i32),
        button: MouseButton,
    },
    KeyDown {
        key: Keycode,
        keymod: Mod,
    },
    KeyUp {
        key: Keycode,
        keymod: Mod,
    },

    // === Game ===
    SwitchScene {
        name: SceneName,
        options: TransferOptions,
    },
    PlaySound {
        name: String,
        loops: i32,
        maxtime: u32,
        fade_ms: u32,
    },
    StopSound {
        name: String,
        fade_ms: u32,
    },

    // === Widgets ===
    ButtonClicked {
        id: String,
    },

    // === Resources ===
    ResourcesLoading {
        percent: f32,
        category: ResourceCategory,
        key: String,
    },
    ResourcesLoaded,
}

impl GameEvent {
    /// Play a sound once, immediately, with no fade
    pub fn play_sound(name: &str) -> Self {
        GameEvent::PlaySound {
            name: name.to_string(),
            loops: 0,
            maxtime: 0,
            fade_ms: 0,
        }
    }

    /// Stop a sound immediately
    pub fn stop_sound(name: &str) -> Self {
        GameEvent::StopSound {
            name: name.to_string(),
            fade_ms: 0,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::MouseMove { .. } => EventKind::MouseMove,
            GameEvent::MouseDown { .. } => EventKind::MouseDown,
            GameEvent::MouseUp { .. } => EventKind::MouseUp,
            GameEvent::KeyDown { .. } => EventKind::KeyDown,
            GameEvent::KeyUp { .. } => EventKind::KeyUp,
            GameEvent::SwitchScene { .. } => EventKind::SwitchScene,
            GameEvent::PlaySound { .. } => EventKind::PlaySound,
            GameEvent::StopSound { .. } => EventKind::StopSound,
            GameEvent::ButtonClicked { .. } => EventKind::ButtonClicked,
            GameEvent::ResourcesLoading { .. } => EventKind::ResourcesLoading,
            GameEvent::ResourcesLoaded => EventKind::ResourcesLoaded,
        }
    }
}

/// Subscription key: one per [`GameEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseMove,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
    SwitchScene,
    PlaySound,
    StopSound,
    ButtonClicked,
    ResourcesLoading,
    ResourcesLoaded,
}

impl EventKind {
    /// Topic name used in logs
    pub fn topic(&self) -> &'static str {
        match self {
            EventKind::MouseMove => "input.mouse-move",
            EventKind::MouseDown => "input.mouse-down",
            EventKind::MouseUp => "input.mouse-up",
            EventKind::KeyDown => "input.key-down",
            EventKind::KeyUp => "input.key-up",
            EventKind::SwitchScene => "game.switch-scene",
            EventKind::PlaySound => "game.play-sound",
            EventKind::StopSound => "game.stop-sound",
            EventKind::ButtonClicked => "button.clicked",
            EventKind::ResourcesLoading => "resources.loading",
            EventKind::ResourcesLoaded => "resources.loaded",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Follow-up events published from inside a handler
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<GameEvent>,
}

impl Outbox {
    pub fn publish(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

pub type Handler = Box<dyn FnMut(&GameEvent, &mut Outbox) -> GameResult<()>>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Rc<RefCell<Handler>>,
}

/// Synchronous, single-threaded publish/subscribe dispatcher
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every event of `kind`
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent, &mut Outbox) -> GameResult<()> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            handler: Rc::new(RefCell::new(Box::new(handler))),
        });
        trace!(topic = kind.topic(), ?id, "Subscribed");
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Remove a batch of subscriptions, leaving `ids` empty
    pub fn unsubscribe_all(&mut self, ids: &mut Vec<SubscriptionId>) {
        for id in ids.drain(..) {
            self.unsubscribe(id);
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    /// Deliver `event` to every current subscriber of its kind
    pub fn publish(&mut self, event: GameEvent) {
        self.dispatch(event, 0);
    }

    fn dispatch(&mut self, event: GameEvent, depth: usize) {
        let kind = event.kind();
        if depth > MAX_PUBLISH_DEPTH {
            warn!(topic = kind.topic(), depth, "Publish chain too deep, dropping event");
            return;
        }

        // Snapshot so that the subscriber list seen by this event is fixed
        let handlers: Vec<Rc<RefCell<Handler>>> = self
            .subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Rc::clone(&s.handler))
            .collect();

        for handler in handlers {
            let mut outbox = Outbox::default();
            let result = match handler.try_borrow_mut() {
                Ok(mut handler) => (&mut **handler)(&event, &mut outbox),
                Err(_) => {
                    warn!(topic = kind.topic(), "Handler is already running, skipping");
                    continue;
                }
            };

            if let Err(e) = result {
                error!(topic = kind.topic(), error = %e, "Event handler failed");
            }

            for follow_up in outbox.events {
                self.dispatch(follow_up, depth + 1);
            }
        }
    }
}
