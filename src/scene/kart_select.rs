//! Kart selection
//!
//! One button per kart in the roster. Picking a kart fades out to track
//! selection, carrying the kart id along.

use crate::error::GameResult;
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::gui::Button;
use crate::kart::{kart_roster, KartProfile};
use crate::scene::{
    FadeState, FadeStep, Scene, SceneContext, SceneName, TransferOptions, KART_ID_OPTION,
};
use crate::text::draw_text_centered;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

const BUTTON_SIZE: (u32, u32) = (190, 49);
const BUTTON_SPACING: i32 = 70;
const FIRST_BUTTON_Y: i32 = 140;

#[derive(Debug, Default)]
pub struct KartSelectState {
    pub selected: Option<String>,
    pub fade: FadeState,
}

impl KartSelectState {
    /// Forget the pick and put the fade back to inactive
    pub fn reset(&mut self) {
        self.selected = None;
        self.fade.reset();
    }

    /// Record a kart pick; ignored once a fade is under way
    pub fn choose(&mut self, kart_id: &str) {
        if self.fade.is_active() {
            return;
        }
        debug!(kart_id, "Kart selected");
        self.selected = Some(kart_id.to_string());
        self.fade.start();
    }

    /// Options for the track selection scene
    pub fn transfer_options(&self) -> TransferOptions {
        let mut options = TransferOptions::new();
        if let Some(id) = &self.selected {
            options.insert(KART_ID_OPTION, id.as_str());
        }
        options
    }
}

pub fn subscribe_kart_select(
    state: &Rc<RefCell<KartSelectState>>,
    roster: &[KartProfile],
    bus: &mut EventBus,
) -> SubscriptionId {
    let ids: Vec<&'static str> = roster.iter().map(|p| p.id).collect();
    let s = Rc::clone(state);
    bus.subscribe(EventKind::ButtonClicked, move |event, _| {
        if let GameEvent::ButtonClicked { id } = event {
            if ids.contains(&id.as_str()) {
                s.borrow_mut().choose(id);
            }
        }
        Ok(())
    })
}

#[derive(Default)]
pub struct KartSelectScene {
    state: Rc<RefCell<KartSelectState>>,
    subscription: Option<SubscriptionId>,
    buttons: Vec<Button>,
}

impl KartSelectScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, ctx: &mut SceneContext<'_>) -> GameResult<()> {
        let canvas = &mut ctx.canvas;
        let width = ctx.config.display_width;

        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        let heading = Rect::new(0, 60, width, 40);
        draw_text_centered(canvas, "SELECT YOUR KART", heading, Color::RGB(255, 255, 255), 3)?;

        for button in &self.buttons {
            button.render(canvas, &ctx.resources)?;
        }

        let cover = self.state.borrow().fade.cover_height(ctx.config.display_height);
        if cover > 0 {
            canvas.set_draw_color(Color::RGB(0, 0, 0));
            canvas.fill_rect(Rect::new(0, 0, width, cover))?;
        }
        Ok(())
    }
}

impl<'a> Scene<SceneContext<'a>> for KartSelectScene {
    fn name(&self) -> SceneName {
        SceneName::KartSelect
    }

    fn setup(&mut self, ctx: &mut SceneContext<'a>, _options: &TransferOptions) -> GameResult<()> {
        debug!("Setting up kart select scene");
        self.state.borrow_mut().reset();

        let roster = kart_roster();
        let x = ctx.config.display_width as i32 / 2 - BUTTON_SIZE.0 as i32 / 2;
        self.buttons = roster
            .iter()
            .enumerate()
            .map(|(i, profile)| {
                let y = FIRST_BUTTON_Y + i as i32 * BUTTON_SPACING;
                let rect = Rect::new(x, y, BUTTON_SIZE.0, BUTTON_SIZE.1);
                Button::new(profile.id, profile.label, rect, &mut ctx.bus)
            })
            .collect();
        self.subscription = Some(subscribe_kart_select(&self.state, &roster, &mut ctx.bus));
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut SceneContext<'a>) -> GameResult<()> {
        debug!("Tearing down kart select scene");
        if let Some(id) = self.subscription.take() {
            ctx.bus.unsubscribe(id);
        }
        for mut button in self.buttons.drain(..) {
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
                name: SceneName::TrackSelect,
                options,
            });
        }

        self.render(ctx)
    }
}
