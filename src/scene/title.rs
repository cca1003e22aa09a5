//! Title screen
//!
//! Loads the resource catalog one asset per frame while showing progress.
//! The title image appears as soon as it is loaded; the PLAY button once
//! everything is. Clicking PLAY fades out to kart selection.

use crate::error::GameResult;
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::gui::button::BUTTON_UP_IMAGE;
use crate::gui::Button;
use crate::resources::ResourceCategory;
use crate::scene::{FadeState, FadeStep, Scene, SceneContext, SceneName, TransferOptions};
use crate::text::draw_text_centered;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub const TITLE_IMAGE: &str = "title";
pub const TITLE_MUSIC: &str = "title-music";
pub const PLAY_BUTTON: &str = "play";

const PERCENT_COLOR: Color = Color::RGB(255, 255, 255);
const FADE_COLOR: Color = Color::RGB(0, 0, 0);
const DEFAULT_BUTTON_SIZE: (u32, u32) = (190, 49);

/// What the title screen shows, driven by bus events
#[derive(Debug, Default)]
pub struct TitleState {
    pub show_title: bool,
    pub percent_label: Option<String>,
    pub play_ready: bool,
    pub fade: FadeState,
}

impl TitleState {
    /// Clear progress and put the fade back to inactive
    pub fn reset(&mut self) {
        *self = TitleState::default();
    }

    pub fn on_loading(&mut self, percent: f32, category: ResourceCategory, key: &str) {
        if category == ResourceCategory::Image && key == TITLE_IMAGE {
            self.show_title = true;
        } else {
            self.percent_label = Some(format!("LOADING {}%", (percent * 100.0) as i32));
        }
        if percent >= 1.0 {
            self.play_ready = true;
        }
    }

    pub fn on_loaded(&mut self) {
        self.play_ready = true;
    }
}

/// Subscribe `state` to loading progress and the PLAY button
pub fn subscribe_title(state: &Rc<RefCell<TitleState>>, bus: &mut EventBus) -> Vec<SubscriptionId> {
    let mut subscriptions = Vec::with_capacity(3);

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::ResourcesLoading, move |event, outbox| {
        if let GameEvent::ResourcesLoading { percent, category, key } = event {
            s.borrow_mut().on_loading(*percent, *category, key);
            if *category == ResourceCategory::Sound && key == TITLE_MUSIC {
                outbox.publish(title_music());
            }
        }
        Ok(())
    }));

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::ResourcesLoaded, move |_, _| {
        s.borrow_mut().on_loaded();
        Ok(())
    }));

    let s = Rc::clone(state);
    subscriptions.push(bus.subscribe(EventKind::ButtonClicked, move |event, _| {
        if let GameEvent::ButtonClicked { id } = event {
            if id == PLAY_BUTTON {
                debug!("Play clicked");
                s.borrow_mut().fade.start();
            }
        }
        Ok(())
    }));

    subscriptions
}

fn title_music() -> GameEvent {
    GameEvent::PlaySound {
        name: TITLE_MUSIC.to_string(),
        loops: -1,
        maxtime: 0,
        fade_ms: 0,
    }
}

#[derive(Default)]
pub struct TitleScene {
    state: Rc<RefCell<TitleState>>,
    subscriptions: Vec<SubscriptionId>,
    play_button: Option<Button>,
}

impl TitleScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_play_button(&mut self, ctx: &mut SceneContext<'_>) {
        let (width, height) = ctx
            .resources
            .image_size(BUTTON_UP_IMAGE)
            .unwrap_or(DEFAULT_BUTTON_SIZE);
        let screen_w = ctx.config.display_width as i32;
        let x = screen_w / 2 - width as i32 / 2;
        let y = (ctx.config.display_height as f32 * 0.75) as i32;
        self.play_button = Some(Button::new(
            PLAY_BUTTON,
            "PLAY",
            Rect::new(x, y, width, height),
            &mut ctx.bus,
        ));
    }

    fn render(&self, ctx: &mut SceneContext<'_>) -> GameResult<()> {
        let state = self.state.borrow();
        let canvas = &mut ctx.canvas;

        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();

        if state.show_title {
            canvas.copy(ctx.resources.image(TITLE_IMAGE)?, None, None)?;
        }

        match &self.play_button {
            Some(button) => button.render(canvas, &ctx.resources)?,
            None => {
                if let Some(label) = &state.percent_label {
                    let w = ctx.config.display_width;
                    let y = (ctx.config.display_height as f32 * 0.75) as i32;
                    draw_text_centered(canvas, label, Rect::new(0, y, w, 40), PERCENT_COLOR, 3)?;
                }
            }
        }

        let cover = state.fade.cover_height(ctx.config.display_height);
        if cover > 0 {
            canvas.set_draw_color(FADE_COLOR);
            canvas.fill_rect(Rect::new(0, 0, ctx.config.display_width, cover))?;
        }
        Ok(())
    }
}

impl<'a> Scene<SceneContext<'a>> for TitleScene {
    fn name(&self) -> SceneName {
        SceneName::Title
    }

    fn setup(&mut self, ctx: &mut SceneContext<'a>, _options: &TransferOptions) -> GameResult<()> {
        debug!("Setting up title scene");

        {
            let mut state = self.state.borrow_mut();
            state.reset();
            // returning after a full load shows everything straight away
            state.show_title = ctx.resources.has_image(TITLE_IMAGE);
            state.play_ready = ctx.loader.is_finished();
        }
        self.subscriptions = subscribe_title(&self.state, &mut ctx.bus);

        if ctx.resources.has_sound(TITLE_MUSIC) {
            ctx.bus.publish(title_music());
        }
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut SceneContext<'a>) -> GameResult<()> {
        debug!("Tearing down title scene");
        ctx.bus.unsubscribe_all(&mut self.subscriptions);
        if let Some(mut button) = self.play_button.take() {
            button.detach(&mut ctx.bus);
        }
        self.state.borrow_mut().reset();

        if ctx.resources.has_sound(TITLE_MUSIC) {
            ctx.bus.publish(GameEvent::stop_sound(TITLE_MUSIC));
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut SceneContext<'a>, _delta: f32) -> GameResult<()> {
        if !ctx.loader.is_finished() {
            ctx.loader.advance(&mut ctx.resources, &mut ctx.bus)?;
        }

        if self.play_button.is_none() && self.state.borrow().play_ready {
            self.make_play_button(ctx);
        }

        let step = self.state.borrow_mut().fade.advance();
        if step == FadeStep::Complete {
            ctx.bus.publish(GameEvent::SwitchScene {
                name: SceneName::KartSelect,
                options: TransferOptions::new(),
            });
        }

        self.render(ctx)
    }
}
