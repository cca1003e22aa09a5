//! Clickable Button
//!
//! A labelled button drawn from an up/down image pair, or from plain
//! rectangles when the catalog has no button images. It listens to mouse
//! input on the bus and, when released over, publishes the `menu-select`
//! sound followed by `ButtonClicked` with its id.

use crate::error::GameResult;
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::resources::ResourceCatalog;
use crate::text::draw_text_centered;
use sdl2::pixels::Color;
use sdl2::rect::{Point, Rect};
use sdl2::render::Canvas;
use sdl2::video::Window;
use std::cell::RefCell;
use std::rc::Rc;

/// How far a pressed button sinks, in pixels
pub const PRESS_OFFSET: i32 = 4;

/// Sound published on every click
pub const CLICK_SOUND: &str = "menu-select";

/// Image keys of the button face
pub const BUTTON_UP_IMAGE: &str = "red_button_up";
pub const BUTTON_DOWN_IMAGE: &str = "red_button_down";

/// Colors used when there are no button images
#[derive(Debug, Clone)]
pub struct ButtonStyle {
    pub face_color: Color,
    pub hover_color: Color,
    pub pressed_color: Color,
    pub border_color: Color,
    pub label_color: Color,
    pub label_scale: u32,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        ButtonStyle {
            face_color: Color::RGB(170, 30, 30),
            hover_color: Color::RGB(200, 50, 50),
            pressed_color: Color::RGB(130, 20, 20),
            border_color: Color::RGB(20, 20, 20),
            label_color: Color::RGB(255, 255, 255),
            label_scale: 3,
        }
    }
}

/// Pointer state of a button, shared with its bus handlers
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonState {
    up_rect: Rect,
    down_rect: Rect,
    pressed: bool,
    hovered: bool,
}

impl ButtonState {
    pub fn new(rect: Rect) -> Self {
        let mut down_rect = rect;
        down_rect.offset(0, PRESS_OFFSET);
        ButtonState {
            up_rect: rect,
            down_rect,
            pressed: false,
            hovered: false,
        }
    }

    /// Current hit area; it moves down while pressed
    pub fn rect(&self) -> Rect {
        if self.pressed { self.down_rect } else { self.up_rect }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn mouse_down(&mut self, pos: (i32, i32)) {
        if self.rect().contains_point(Point::from(pos)) {
            self.pressed = true;
        }
    }

    /// Returns true when this release is a click
    pub fn mouse_up(&mut self, pos: (i32, i32)) -> bool {
        if self.rect().contains_point(Point::from(pos)) {
            self.pressed = false;
            true
        } else {
            false
        }
    }

    pub fn mouse_move(&mut self, pos: (i32, i32)) {
        let inside = self.rect().contains_point(Point::from(pos));
        if self.pressed && !inside {
            self.pressed = false;
        }
        self.hovered = self.up_rect.contains_point(Point::from(pos));
    }
}

pub struct Button {
    label: String,
    state: Rc<RefCell<ButtonState>>,
    subscriptions: Vec<SubscriptionId>,
    style: ButtonStyle,
}

impl Button {
    /// Create a button and subscribe it to mouse input
    ///
    /// Call [`Button::detach`] before dropping it.
    pub fn new(id: &str, label: &str, rect: Rect, bus: &mut EventBus) -> Self {
        let state = Rc::new(RefCell::new(ButtonState::new(rect)));
        let mut subscriptions = Vec::with_capacity(3);

        let s = Rc::clone(&state);
        subscriptions.push(bus.subscribe(EventKind::MouseDown, move |event, _| {
            if let GameEvent::MouseDown { pos, .. } = event {
                s.borrow_mut().mouse_down(*pos);
            }
            Ok(())
        }));

        let s = Rc::clone(&state);
        let click_id = id.to_string();
        subscriptions.push(bus.subscribe(EventKind::MouseUp, move |event, outbox| {
            if let GameEvent::MouseUp { pos, .. } = event {
                if s.borrow_mut().mouse_up(*pos) {
                    outbox.publish(GameEvent::play_sound(CLICK_SOUND));
                    outbox.publish(GameEvent::ButtonClicked { id: click_id.clone() });
                }
            }
            Ok(())
        }));

        let s = Rc::clone(&state);
        subscriptions.push(bus.subscribe(EventKind::MouseMove, move |event, _| {
            if let GameEvent::MouseMove { pos, .. } = event {
                s.borrow_mut().mouse_move(*pos);
            }
            Ok(())
        }));

        Button {
            label: label.to_string(),
            state,
            subscriptions,
            style: ButtonStyle::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ButtonState {
        self.state.borrow().clone()
    }

    /// Drop all bus subscriptions
    pub fn detach(&mut self, bus: &mut EventBus) {
        bus.unsubscribe_all(&mut self.subscriptions);
    }

    pub fn render(
        &self,
        canvas: &mut Canvas<Window>,
        resources: &ResourceCatalog,
    ) -> GameResult<()> {
        let state = self.state.borrow();
        let rect = state.rect();

        let image_key = if state.is_pressed() { BUTTON_DOWN_IMAGE } else { BUTTON_UP_IMAGE };
        if resources.has_image(image_key) {
            canvas.copy(resources.image(image_key)?, None, rect)?;
        } else {
            let face = if state.is_pressed() {
                self.style.pressed_color
            } else if state.is_hovered() {
                self.style.hover_color
            } else {
                self.style.face_color
            };
            canvas.set_draw_color(face);
            canvas.fill_rect(rect)?;
            canvas.set_draw_color(self.style.border_color);
            canvas.draw_rect(rect)?;
        }

        let style = &self.style;
        draw_text_centered(canvas, &self.label, rect, style.label_color, style.label_scale)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl2::mouse::MouseButton;

    fn up(pos: (i32, i32)) -> GameEvent {
        GameEvent::MouseUp {
            pos,
            button: MouseButton::Left,
        }
    }

    fn down(pos: (i32, i32)) -> GameEvent {
        GameEvent::MouseDown {
            pos,
            button: MouseButton::Left,
        }
    }

    fn moved(pos: (i32, i32)) -> GameEvent {
        GameEvent::MouseMove {
            pos,
            rel: (0, 0),
            buttons: Default::default(),
        }
    }

    fn capture(bus: &mut EventBus) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::PlaySound, EventKind::ButtonClicked] {
            let seen = Rc::clone(&seen);
            bus.subscribe(kind, move |event, _| {
                seen.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        seen
    }

    #[test]
    fn test_press_sinks_the_button() {
        let mut state = ButtonState::new(Rect::new(10, 10, 100, 40));
        state.mouse_down((20, 20));
        assert!(state.is_pressed());
        assert_eq!(state.rect(), Rect::new(10, 14, 100, 40));
    }

    #[test]
    fn test_moving_off_releases_without_click() {
        let mut state = ButtonState::new(Rect::new(10, 10, 100, 40));
        state.mouse_down((20, 20));
        state.mouse_move((300, 300));
        assert!(!state.is_pressed());
        assert!(!state.is_hovered());
        assert!(!state.mouse_up((300, 300)));
    }

    #[test]
    fn test_hover_tracks_pointer() {
        let mut state = ButtonState::new(Rect::new(10, 10, 100, 40));
        state.mouse_move((50, 30));
        assert!(state.is_hovered());
        state.mouse_move((5, 5));
        assert!(!state.is_hovered());
    }

    #[test]
    fn test_click_publishes_sound_then_clicked() {
        let mut bus = EventBus::new();
        let seen = capture(&mut bus);
        let button = Button::new("play", "PLAY", Rect::new(0, 0, 100, 40), &mut bus);

        bus.publish(down((50, 20)));
        assert!(button.state().is_pressed());
        bus.publish(up((50, 22)));

        assert_eq!(
            *seen.borrow(),
            vec![
                GameEvent::play_sound(CLICK_SOUND),
                GameEvent::ButtonClicked { id: "play".to_string() },
            ]
        );
        assert!(!button.state().is_pressed());
    }

    #[test]
    fn test_release_outside_is_not_a_click() {
        let mut bus = EventBus::new();
        let seen = capture(&mut bus);
        let _button = Button::new("go", "GO", Rect::new(0, 0, 100, 40), &mut bus);

        bus.publish(up((500, 500)));

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_detach_removes_handlers() {
        let mut bus = EventBus::new();
        let mut button = Button::new("go", "GO", Rect::new(0, 0, 100, 40), &mut bus);
        assert_eq!(bus.subscriber_count(EventKind::MouseUp), 1);

        button.detach(&mut bus);

        assert_eq!(bus.subscriber_count(EventKind::MouseUp), 0);
        assert_eq!(bus.subscriber_count(EventKind::MouseDown), 0);
        assert_eq!(bus.subscriber_count(EventKind::MouseMove), 0);
    }
}
