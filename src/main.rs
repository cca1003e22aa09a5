//! Platakart Racing!
//!
//! A small 2D kart racer: pick a kart, pick a track, drive it over rigid
//! body physics. The binary wires SDL2, the configuration, the asset
//! catalog and the scenes together and runs the frame loop.

use clap::{Parser, ValueEnum};
use std::cell::RefCell;
use std::env;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{error, info, Level};

mod audio;
mod camera;
mod config;
mod error;
mod events;
mod game;
mod gui;
mod input_system;
mod kart;
mod physics;
mod resources;
mod scene;
mod text;
mod track_map;

use audio::CatalogAudio;
use config::{resolve_config_path, GameConfig, CONFIG_PATH_ENV};
use error::GameResult;
use events::EventBus;
use resources::{resource_root, ResourceCatalog, ResourceLoader, ResourceManifest, RESOURCES_ENV};
use scene::{build_registry, SceneContext, SceneDirector, SceneName};

/// Manifest file name inside the resource root
const MANIFEST_FILE: &str = "resources.json";

const WINDOW_TITLE: &str = "Platakart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn as_level(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error | LogLevel::Critical => Level::ERROR,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "platakart", version, about = "Platakart Racing!")]
struct Cli {
    /// Lowest level of log messages to print
    #[arg(long, value_enum, ignore_case = true, default_value = "WARNING")]
    log_level: LogLevel,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level.as_level()).init();

    match run() {
        Ok(()) => {
            info!("Goodbye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Platakart stopped");
            ExitCode::FAILURE
        }
    }
}

fn run() -> GameResult<()> {
    let config_path = resolve_config_path(env::var_os(CONFIG_PATH_ENV), dirs::home_dir());
    let config = GameConfig::load(config_path.as_deref());

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let _image_context =
        sdl2::image::init(sdl2::image::InitFlag::PNG | sdl2::image::InitFlag::JPG)?;

    let window = video_subsystem
        .window(WINDOW_TITLE, config.display_width, config.display_height)
        .position_centered()
        .build()?;
    // the track scene renders into an off-screen texture
    let canvas = window.into_canvas().accelerated().target_texture().build()?;
    let texture_creator = canvas.texture_creator();
    let mut event_pump = sdl_context.event_pump()?;

    let root = resource_root(env::var_os(RESOURCES_ENV));
    let manifest = ResourceManifest::load_from_file(&root.join(MANIFEST_FILE))?;
    info!(root = %root.display(), assets = manifest.len(), "Resource manifest loaded");

    let mut bus = EventBus::new();
    audio::install(&mut bus, Rc::new(RefCell::new(CatalogAudio::new())), config.sound_enabled);

    let mut ctx = SceneContext {
        canvas,
        texture_creator: &texture_creator,
        resources: ResourceCatalog::new(&texture_creator),
        loader: ResourceLoader::new(root, &manifest),
        bus,
        config: config.clone(),
    };
    let mut director = SceneDirector::new(build_registry(&config), SceneName::Title, &mut ctx.bus)?;

    game::run(&mut director, &mut ctx, &mut event_pump)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_warning() {
        let cli = Cli::try_parse_from(["platakart"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warning);
    }

    #[test]
    fn test_log_level_names() {
        let cli = Cli::try_parse_from(["platakart", "--log-level", "DEBUG"]).unwrap();
        assert_eq!(cli.log_level.as_level(), Level::DEBUG);

        let cli = Cli::try_parse_from(["platakart", "--log-level", "critical"]).unwrap();
        assert_eq!(cli.log_level.as_level(), Level::ERROR);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["platakart", "--log-level", "LOUD"]).is_err());
    }
}
