//! Error types shared by every part of the game
//!
//! sdl2 reports failures as plain `String`s; `From<String>` lets those
//! compose with `?` alongside the structured variants.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while running the game
#[derive(Debug, Error)]
pub enum GameError {
    /// SDL2 video/render/image failure
    #[error("SDL error: {0}")]
    Sdl(String),

    /// A file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON file did not parse
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A track file parsed but its contents are inconsistent
    #[error("invalid track {}: {reason}", path.display())]
    InvalidTrack { path: PathBuf, reason: String },

    /// A scene switch named a scene that is not registered
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// A catalog lookup missed
    #[error("missing {category} resource: {key}")]
    MissingResource { category: &'static str, key: String },

    /// Kart or track physics could not be assembled
    #[error("physics error: {0}")]
    Physics(String),
}

pub type GameResult<T> = Result<T, GameError>;

impl From<String> for GameError {
    fn from(error: String) -> Self {
        GameError::Sdl(error)
    }
}

impl From<sdl2::video::WindowBuildError> for GameError {
    fn from(error: sdl2::video::WindowBuildError) -> Self {
        GameError::Sdl(error.to_string())
    }
}

impl From<sdl2::IntegerOrSdlError> for GameError {
    fn from(error: sdl2::IntegerOrSdlError) -> Self {
        GameError::Sdl(error.to_string())
    }
}

impl From<sdl2::render::TextureValueError> for GameError {
    fn from(error: sdl2::render::TextureValueError) -> Self {
        GameError::Sdl(error.to_string())
    }
}

impl From<sdl2::render::TargetRenderError> for GameError {
    fn from(error: sdl2::render::TargetRenderError) -> Self {
        GameError::Sdl(error.to_string())
    }
}
