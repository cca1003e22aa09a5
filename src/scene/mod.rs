//! Scenes
//!
//! A scene is one full-screen mode of the game. The director keeps exactly
//! one active and switches between them when a `SwitchScene` event is
//! published.
//!
//! # Lifecycle
//!
//! - `setup` runs every time the scene becomes active and must reset all
//!   per-visit state, since the same value is reused on the next visit
//! - `update` runs once per frame, after that frame's input was published
//! - `teardown` runs when the scene is left and must drop every bus
//!   subscription it made in `setup`

pub mod director;
pub mod fade;
pub mod kart_select;
pub mod title;
pub mod track;
pub mod track_select;

pub use director::SceneDirector;
pub use fade::{FadeState, FadeStep};

use crate::config::GameConfig;
use crate::error::GameResult;
use crate::events::EventBus;
use crate::resources::{ResourceCatalog, ResourceLoader};
use kart_select::KartSelectScene;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use std::collections::HashMap;
use std::fmt;
use title::TitleScene;
use track::TrackScene;
use track_select::TrackSelectScene;

/// Transfer option carrying the chosen kart id
pub const KART_ID_OPTION: &str = "kart_id";

/// Transfer option carrying the chosen track key
pub const TRACK_OPTION: &str = "track";

/// Registered scene names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneName {
    Title,
    KartSelect,
    TrackSelect,
    Track,
}

impl SceneName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneName::Title => "title",
            SceneName::KartSelect => "kart-select",
            SceneName::TrackSelect => "track-select",
            SceneName::Track => "track",
        }
    }
}

impl fmt::Display for SceneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selections handed from a scene to the next one
///
/// Keys keep the order they were first inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferOptions(Vec<(String, String)>);

impl TransferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The lifecycle every scene implements
///
/// `C` is whatever the scene needs from the outside world each frame.
pub trait Scene<C> {
    fn name(&self) -> SceneName;

    fn setup(&mut self, ctx: &mut C, options: &TransferOptions) -> GameResult<()>;

    fn teardown(&mut self, ctx: &mut C) -> GameResult<()>;

    /// `delta` is the clamped wall-clock time since the last frame, in seconds
    fn update(&mut self, ctx: &mut C, delta: f32) -> GameResult<()>;
}

/// Contexts that carry the event bus
pub trait HasEventBus {
    fn bus(&mut self) -> &mut EventBus;
}

/// Everything a game scene reaches for during a frame
pub struct SceneContext<'a> {
    pub canvas: Canvas<Window>,
    pub texture_creator: &'a TextureCreator<WindowContext>,
    pub resources: ResourceCatalog<'a>,
    pub loader: ResourceLoader,
    pub bus: EventBus,
    pub config: GameConfig,
}

impl HasEventBus for SceneContext<'_> {
    fn bus(&mut self) -> &mut EventBus {
        &mut self.bus
    }
}

/// The game's scenes
pub enum GameScene<'a> {
    Title(TitleScene),
    KartSelect(KartSelectScene),
    TrackSelect(TrackSelectScene),
    Track(TrackScene<'a>),
}

impl<'a> Scene<SceneContext<'a>> for GameScene<'a> {
    fn name(&self) -> SceneName {
        match self {
            GameScene::Title(_) => SceneName::Title,
            GameScene::KartSelect(_) => SceneName::KartSelect,
            GameScene::TrackSelect(_) => SceneName::TrackSelect,
            GameScene::Track(_) => SceneName::Track,
        }
    }

    fn setup(&mut self, ctx: &mut SceneContext<'a>, options: &TransferOptions) -> GameResult<()> {
        match self {
            GameScene::Title(scene) => scene.setup(ctx, options),
            GameScene::KartSelect(scene) => scene.setup(ctx, options),
            GameScene::TrackSelect(scene) => scene.setup(ctx, options),
            GameScene::Track(scene) => scene.setup(ctx, options),
        }
    }

    fn teardown(&mut self, ctx: &mut SceneContext<'a>) -> GameResult<()> {
        match self {
            GameScene::Title(scene) => scene.teardown(ctx),
            GameScene::KartSelect(scene) => scene.teardown(ctx),
            GameScene::TrackSelect(scene) => scene.teardown(ctx),
            GameScene::Track(scene) => scene.teardown(ctx),
        }
    }

    fn update(&mut self, ctx: &mut SceneContext<'a>, delta: f32) -> GameResult<()> {
        match self {
            GameScene::Title(scene) => scene.update(ctx, delta),
            GameScene::KartSelect(scene) => scene.update(ctx, delta),
            GameScene::TrackSelect(scene) => scene.update(ctx, delta),
            GameScene::Track(scene) => scene.update(ctx, delta),
        }
    }
}

/// One instance of every scene, keyed by name
pub fn build_registry<'a>(config: &GameConfig) -> HashMap<SceneName, GameScene<'a>> {
    let scenes = [
        GameScene::Title(TitleScene::new()),
        GameScene::KartSelect(KartSelectScene::new()),
        GameScene::TrackSelect(TrackSelectScene::new()),
        GameScene::Track(TrackScene::new(config)),
    ];
    scenes
        .into_iter()
        .map(|scene| (Scene::<SceneContext<'a>>::name(&scene), scene))
        .collect()
}
