//! Track selection
//!
//! Arrow keys move through the track carousel, clicking a thumbnail selects
//! it, and GO fades out to the race with the kart and track choices.

use crate::error::GameResult;
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::gui::track_button_bar::DEFAULT_THUMB_SIZE;
use crate::gui::{Button, TrackButtonBar, TrackInfo};
use crate::resources::ResourceCatalog;
use crate::scene::{
    FadeState, FadeStep, Scene, SceneContext, SceneName, TransferOptions, KART_ID_OPTION,
    TRACK_OPTION,
};
use crate::text::{draw_text, line_height};
use crate::track_map::TrackMap;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub const GO_BUTTON: &str = "go";
pub const SWITCH_SOUND: &str = "menu-switch";
pub const BACKGROUND_IMAGE: &str = "track-select";

const TEXT_COLOR: Color = Color::RGB(255, 255, 255);
const TEXT_SCALE: u32 = 3;
const TEXT_MARGIN: i32 = 8;

fn bar_rect() -> Rect {
    Rect::new(19, 16, 128, 480)
}

pub struct TrackSelectState {
    pub bar: TrackButtonBar,
    pub kart_id: Option<String>,
    pub chosen: Option<String>,
    pub fade: FadeState,
}

impl TrackSelectState {
    pub fn new(tracks: Vec<TrackInfo>, thumb_size: (u32, u32), kart_id: Option<String>) -> Self {
        TrackSelectState {
            bar: TrackButtonBar::new(bar_rect(), tracks, thumb_size),
            kart_id,
            chosen: None,
            fade: FadeState::default(),
        }
    }

    /// Back to the state a fresh entry starts from: nothing chosen, no fade
    pub fn reset(&mut self) {
        self.chosen = None;
        self.fade.reset();
    }

    /// Lock in the highlighted track and start fading
    pub fn go(&mut self) {
        if self.fade.is_active() {
            return;
        }
        self.chosen = self.bar.selected().map(|t| t.key.clone());
        debug!(track = ?self.chosen, "Track selected");
        self.fade.start();
    }

    /// Options for the track scene
    pub fn transfer_options(&self) -> TransferOptions {
        let mut options = TransferOptions::new();
        if let Some(kart_id) = &self.kart_id {
            options.insert(KART_ID_OPTION, kart_id.as_str());
        }
        if let Some(track) = &self.chosen {
            options.insert(TRACK_OPTION, track.as_str());
        }
        options
    }
}

pub fn track_info(key: &str, map: &TrackMap) -> TrackInfo {
    TrackInfo {
        key: key.to_string(),
        name: map.name.clone(),
        description: map.description_lines().map(str::to_string).collect(),
        thumbnail: map.thumbnail.clone(),
    }
}

/// Tracks from the catalog, sorted by key
pub fn track_infos(resources: &ResourceCatalog) -> Vec<TrackInfo> {
    resources.tracks().map(|(key, map)| track_info(key, map)).collect()
}

pub fn subscribe_track_select(
    state: &Rc<RefCell<TrackSelectState>>,
    bus: &mut EventBus,
) -> Vec<SubscriptionId> {
    let mut subscriptions = Vec::with_capacity(4);

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::KeyUp, move |event, outbox| {
        if let GameEvent::KeyUp { key, .. } = event {
            if s.borrow_mut().bar.navigate(*key) {
                outbox.publish(GameEvent::stop_sound(SWITCH_SOUND));
                outbox.publish(GameEvent::play_sound(SWITCH_SOUND));
            }
        }
        Ok(())
    }));

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::MouseUp, move |event, _| {
        if let GameEvent::MouseUp { pos, .. } = event {
            let mut state = s.borrow_mut();
            if let Some(index) = state.bar.button_at(*pos) {
                state.bar.select(index as i64);
            }
        }
        Ok(())
    }));

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::MouseMove, move |event, _| {
        if let GameEvent::MouseMove { pos, .. } = event {
            s.borrow_mut().bar.hover(*pos);
        }
        Ok(())
    }));

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::ButtonClicked, move |event, _| {
        if let GameEvent::ButtonClicked { id } = event {
            if id == GO_BUTTON {
                s.borrow_mut().go();
            }
        }
        Ok(())
    }));

    subscriptions
}

pub struct TrackSelectScene {
    state: Rc<RefCell<TrackSelectState>>,
    subscriptions: Vec<SubscriptionId>,
    go_button: Option<Button>,
}

impl TrackSelectScene {
    pub fn new() -> Self {
        TrackSelectScene {
            state: Rc::new(RefCell::new(TrackSelectState::new(
                Vec::new(),
                DEFAULT_THUMB_SIZE,
                None,
            ))),
            subscriptions: Vec::new(),
            go_button: None,
        }
    }

    fn render(&self, ctx: &mut SceneContext<'_>) -> GameResult<()> {
        let state = self.state.borrow();
        let canvas = &mut ctx.canvas;

        if ctx.resources.has_image(BACKGROUND_IMAGE) {
            canvas.copy(ctx.resources.image(BACKGROUND_IMAGE)?, None, None)?;
        } else {
            canvas.set_draw_color(Color::RGB(20, 20, 40));
            canvas.clear();
        }

        state.bar.render(canvas, &ctx.resources)?;

        match state.bar.selected() {
            Some(track) => {
                let step = line_height(TEXT_SCALE) as i32 + TEXT_MARGIN;
                draw_text(canvas, &track.name, 200, 80, TEXT_COLOR, TEXT_SCALE)?;
                for (i, line) in track.description.iter().enumerate() {
                    let y = 80 + step * (i as i32 + 1);
                    draw_text(canvas, line, 200, y, TEXT_COLOR, 2)?;
                }
            }
            None => draw_text(canvas, "NO TRACKS", 200, 80, TEXT_COLOR, TEXT_SCALE)?,
        }

        if let Some(button) = &self.go_button {
            button.render(canvas, &ctx.resources)?;
        }

        let cover = state.fade.cover_height(ctx.config.display_height);
        if cover > 0 {
            canvas.set_draw_color(Color::RGB(0, 0, 0));
            canvas.fill_rect(Rect::new(0, 0, ctx.config.display_width, cover))?;
        }
        Ok(())
    }
}

impl Default for TrackSelectScene {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Scene<SceneContext<'a>> for TrackSelectScene {
    fn name(&self) -> SceneName {
        SceneName::TrackSelect
    }

    fn setup(&mut self, ctx: &mut SceneContext<'a>, options: &TransferOptions) -> GameResult<()> {
        let kart_id = options.get(KART_ID_OPTION).map(str::to_string);
        debug!(?kart_id, "Setting up track select scene");

        let tracks = track_infos(&ctx.resources);
        let thumb_size = tracks
            .first()
            .and_then(|t| ctx.resources.image_size(&t.thumbnail).ok())
            .unwrap_or(DEFAULT_THUMB_SIZE);

        let mut state = TrackSelectState::new(tracks, thumb_size, kart_id);
        // coming back from a race keeps the last track highlighted
        if let Some(track) = options.get(TRACK_OPTION) {
            if let Some(index) = state.bar.buttons().iter().position(|b| b.info.key == track) {
                state.bar.select(index as i64);
            }
        }
        *self.state.borrow_mut() = state;

        self.subscriptions = subscribe_track_select(&self.state, &mut ctx.bus);
        let go_rect = Rect::new(400, 400, 190, 49);
        self.go_button = Some(Button::new(GO_BUTTON, "GO!", go_rect, &mut ctx.bus));
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut SceneContext<'a>) -> GameResult<()> {
        debug!("Tearing down track select scene");
        ctx.bus.unsubscribe_all(&mut self.subscriptions);
        if let Some(mut button) = self.go_button.take() {
            button.detach(&mut ctx.bus);
        }
        self.state.borrow_mut().reset();
        Ok(())
    }

    fn update(&mut self, ctx: &mut SceneContext<'a>, _delta: f32) -> GameResult<()> {
        let step = self.state.borrow_mut().fade.advance();
        if step == FadeStep::Complete {
            let options = self.state.borrow().transfer_options();
            ctx.bus.publish(GameEvent::SwitchScene {
                name: SceneName::Track,
                options,
            });
        }

        self.render(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl2::keyboard::{Keycode, Mod};
    use sdl2::mouse::MouseButton;

    fn tracks() -> Vec<TrackInfo> {
        ["alpine", "meadow", "zigzag"]
            .iter()
            .map(|key| TrackInfo {
                key: key.to_string(),
                name: key.to_uppercase(),
                description: Vec::new(),
                thumbnail: format!("{}-thumb", key),
            })
            .collect()
    }

    fn key_up(key: Keycode) -> GameEvent {
        GameEvent::KeyUp { key, keymod: Mod::NOMOD }
    }

    fn setup(kart_id: Option<&str>) -> (EventBus, Rc<RefCell<TrackSelectState>>) {
        let mut bus = EventBus::new();
        let state = Rc::new(RefCell::new(TrackSelectState::new(
            tracks(),
            DEFAULT_THUMB_SIZE,
            kart_id.map(str::to_string),
        )));
        subscribe_track_select(&state, &mut bus);
        (bus, state)
    }

    #[test]
    fn test_keys_move_selection_and_play_switch_sound() {
        let (mut bus, state) = setup(None);
        let sounds = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::PlaySound, EventKind::StopSound] {
            let sounds = Rc::clone(&sounds);
            bus.subscribe(kind, move |event, _| {
                sounds.borrow_mut().push(event.kind());
                Ok(())
            });
        }

        bus.publish(key_up(Keycode::Down));
        bus.publish(key_up(Keycode::Return));

        assert_eq!(state.borrow().bar.selected_index(), 1);
        assert_eq!(*sounds.borrow(), vec![EventKind::StopSound, EventKind::PlaySound]);
    }

    #[test]
    fn test_go_carries_kart_and_track() {
        let (mut bus, state) = setup(Some("blue-kart"));
        bus.publish(key_up(Keycode::Right));
        bus.publish(key_up(Keycode::Right));
        bus.publish(GameEvent::ButtonClicked { id: GO_BUTTON.to_string() });

        let mut switches = Vec::new();
        for _ in 0..12 {
            let step = state.borrow_mut().fade.advance();
            if step == FadeStep::Complete {
                switches.push(state.borrow().transfer_options());
            }
        }

        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].get(KART_ID_OPTION), Some("blue-kart"));
        assert_eq!(switches[0].get(TRACK_OPTION), Some("zigzag"));
    }

    #[test]
    fn test_clicking_a_thumbnail_selects_it() {
        let (mut bus, state) = setup(None);
        let next = state.borrow().bar.buttons()[1].rect.center();

        bus.publish(GameEvent::MouseUp {
            pos: (next.x(), next.y()),
            button: MouseButton::Left,
        });

        assert_eq!(state.borrow().bar.selected_index(), 1);
    }

    #[test]
    fn test_go_without_tracks_has_no_track_option() {
        let kart_id = Some("red-kart".to_string());
        let mut state = TrackSelectState::new(Vec::new(), DEFAULT_THUMB_SIZE, kart_id);
        state.go();
        let options = state.transfer_options();
        assert_eq!(options.get(TRACK_OPTION), None);
        assert_eq!(options.get(KART_ID_OPTION), Some("red-kart"));
    }

    #[test]
    fn test_track_info_splits_description() {
        let mut map = crate::track_map::tests::small_track();
        map.description = "Rolling hills|  | Watch the gap ".to_string();

        let info = track_info("hills", &map);

        assert_eq!(info.key, "hills");
        assert_eq!(info.name, "Test Hills");
        assert_eq!(info.description, vec!["Rolling hills", "Watch the gap"]);
        assert_eq!(info.thumbnail, "thumb-hills");
    }

    #[test]
    fn test_reset_after_go_allows_a_new_fade() {
        let (mut bus, state) = setup(Some("red-kart"));
        bus.publish(GameEvent::ButtonClicked { id: GO_BUTTON.to_string() });
        while state.borrow_mut().fade.advance() != FadeStep::Complete {}

        state.borrow_mut().reset();

        let mut state = state.borrow_mut();
        assert_eq!(state.chosen, None);
        assert_eq!(state.fade.progress(), -1);
        assert_eq!(state.fade.advance(), FadeStep::Idle);
        state.go();
        assert_eq!(state.fade.advance(), FadeStep::Fading { progress: 10 });
        assert_eq!(state.chosen.as_deref(), Some("alpine"));
    }
}
