//! Resource manifest
//!
//! `resources.json` at the resource root names every asset by category.
//! The loader turns it into an ordered task list.

use crate::error::{GameError, GameResult};
use crate::resources::loader::LoadTask;
use crate::resources::ResourceCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Every asset the game knows about, keyed by category then name
///
/// Paths are relative to the resource root. Missing sections are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceManifest {
    pub images: BTreeMap<String, String>,
    pub sounds: BTreeMap<String, String>,
    pub tilemaps: BTreeMap<String, String>,
    pub fonts: BTreeMap<String, String>,
}

impl ResourceManifest {
    pub fn load_from_file(path: &Path) -> GameResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| GameError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.sounds.len() + self.tilemaps.len() + self.fonts.len()
    }

    /// Flatten into load order: images, sounds, tilemaps, fonts
    pub fn tasks(&self) -> Vec<LoadTask> {
        let sections = [
            (ResourceCategory::Image, &self.images),
            (ResourceCategory::Sound, &self.sounds),
            (ResourceCategory::Tilemap, &self.tilemaps),
            (ResourceCategory::Font, &self.fonts),
        ];

        sections
            .into_iter()
            .flat_map(|(category, entries)| {
                entries.iter().map(move |(key, path)| LoadTask {
                    category,
                    key: key.clone(),
                    path: PathBuf::from(path),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_default_empty() {
        let manifest: ResourceManifest =
            serde_json::from_str(r#"{"images": {"title": "images/title.png"}}"#).unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.sounds.is_empty());
    }

    #[test]
    fn test_tasks_follow_category_order() {
        let manifest: ResourceManifest = serde_json::from_str(
            r#"{
                "fonts": {"main": "fonts/main.ttf"},
                "sounds": {"b": "b.ogg", "a": "a.ogg"},
                "images": {"title": "title.png"}
            }"#,
        )
        .unwrap();

        let order: Vec<(ResourceCategory, String)> = manifest
            .tasks()
            .into_iter()
            .map(|t| (t.category, t.key))
            .collect();

        assert_eq!(
            order,
            vec![
                (ResourceCategory::Image, "title".to_string()),
                (ResourceCategory::Sound, "a".to_string()),
                (ResourceCategory::Sound, "b".to_string()),
                (ResourceCategory::Font, "main".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ResourceManifest::load_from_file(&dir.path().join("resources.json"));
        assert!(matches!(result, Err(GameError::Io { .. })));
    }
}
