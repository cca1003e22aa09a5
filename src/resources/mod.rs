//! Resource loading and caching
//!
//! - `manifest`: the `resources.json` file listing every asset by category
//! - `loader`: resumable loader advanced one asset per frame
//! - `catalog`: the SDL-backed store the loader fills and scenes read from

pub mod catalog;
pub mod loader;
pub mod manifest;

pub use catalog::ResourceCatalog;
pub use loader::{AssetStore, LoadStatus, LoadTask, ResourceLoader};
pub use manifest::ResourceManifest;

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the asset root
pub const RESOURCES_ENV: &str = "PLATAKART_RESOURCES";

/// Asset categories, in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    Image,
    Sound,
    Tilemap,
    Font,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Image => "image",
            ResourceCategory::Sound => "sound",
            ResourceCategory::Tilemap => "tilemap",
            ResourceCategory::Font => "font",
        }
    }
}

/// Directory holding `resources.json` and the assets it names
pub fn resource_root(env_value: Option<OsString>) -> PathBuf {
    env_value
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("resources"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_root() {
        assert_eq!(resource_root(None), PathBuf::from("resources"));
        assert_eq!(
            resource_root(Some(OsString::from("/opt/platakart"))),
            PathBuf::from("/opt/platakart")
        );
    }
}
