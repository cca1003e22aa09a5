//! Raw input translation
//!
//! SDL2 events are turned into bus events once per frame, before the active
//! scene updates. Widgets and scenes never see SDL2 events directly.

use crate::events::{GameEvent, MouseButtons};
use sdl2::event::Event;
use sdl2::EventPump;

/// What one SDL2 event means to the game
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Publish this on the bus
    Publish(GameEvent),
    /// Window closed or process interrupted
    Quit,
}

/// Everything that happened since the previous frame
#[derive(Debug, Default)]
pub struct FrameInput {
    pub events: Vec<GameEvent>,
    pub quit: bool,
}

/// Drains the SDL2 event queue into [`FrameInput`]
#[derive(Debug, Default)]
pub struct InputSystem;

impl InputSystem {
    pub fn new() -> Self {
        InputSystem
    }

    /// Poll every pending SDL2 event
    pub fn poll_events(&self, event_pump: &mut EventPump) -> FrameInput {
        let mut frame = FrameInput::default();

        for event in event_pump.poll_iter() {
            match translate(&event) {
                Some(Input::Publish(event)) => frame.events.push(event),
                Some(Input::Quit) => frame.quit = true,
                None => {}
            }
        }

        frame
    }
}

/// Map one SDL2 event, `None` for events nothing listens to
pub fn translate(event: &Event) -> Option<Input> {
    match *event {
        Event::Quit { .. } => Some(Input::Quit),
        Event::KeyDown {
            keycode: Some(key),
            keymod,
            ..
        } => Some(Input::Publish(GameEvent::KeyDown { key, keymod })),
        Event::KeyUp {
            keycode: Some(key),
            keymod,
            ..
        } => Some(Input::Publish(GameEvent::KeyUp { key, keymod })),
        Event::MouseMotion {
            mousestate,
            x,
            y,
            xrel,
            yrel,
            ..
        } => Some(Input::Publish(GameEvent::MouseMove {
            pos: (x, y),
            rel: (xrel, yrel),
            buttons: MouseButtons {
                left: mousestate.left(),
                middle: mousestate.middle(),
                right: mousestate.right(),
            },
        })),
        Event::MouseButtonDown { mouse_btn, x, y, .. } => {
            Some(Input::Publish(GameEvent::MouseDown {
                pos: (x, y),
                button: mouse_btn,
            }))
        }
        Event::MouseButtonUp { mouse_btn, x, y, .. } => {
            Some(Input::Publish(GameEvent::MouseUp {
                pos: (x, y),
                button: mouse_btn,
            }))
        }
        _ => None,
    }
}
