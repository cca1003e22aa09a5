//! Screen-Space GUI
//!
//! Menu widgets drawn at fixed screen positions on top of a scene. Widgets
//! are driven by bus events rather than polled, so each one subscribes when
//! it is created and must be detached by the scene that owns it.
//!
//! # Available Components
//!
//! - [`Button`] - labelled button publishing `ButtonClicked`
//! - [`TrackButtonBar`] - keyboard-driven carousel of track thumbnails

pub mod button;
pub mod track_button_bar;

pub use button::Button;
pub use track_button_bar::{TrackButtonBar, TrackInfo};
