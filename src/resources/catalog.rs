//! Loaded assets
//!
//! The catalog is the [`AssetStore`] the loader fills. Scenes look assets
//! up by their manifest key once loading has finished.

use crate::error::{GameError, GameResult};
use crate::resources::loader::{AssetStore, LoadTask};
use crate::resources::ResourceCategory;
use crate::track_map::TrackMap;
use sdl2::image::LoadTexture;
use sdl2::render::{Texture, TextureCreator};
use sdl2::video::WindowContext;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Loaded assets, keyed by their manifest names
///
/// Textures borrow the renderer's texture creator, so the catalog cannot
/// outlive the canvas it was built for.
pub struct ResourceCatalog<'a> {
    texture_creator: Option<&'a TextureCreator<WindowContext>>,
    images: HashMap<String, Texture<'a>>,
    sounds: HashMap<String, Vec<u8>>,
    tracks: BTreeMap<String, TrackMap>,
    fonts: HashMap<String, PathBuf>,
}

impl<'a> ResourceCatalog<'a> {
    pub fn new(texture_creator: &'a TextureCreator<WindowContext>) -> Self {
        ResourceCatalog {
            texture_creator: Some(texture_creator),
            images: HashMap::new(),
            sounds: HashMap::new(),
            tracks: BTreeMap::new(),
            fonts: HashMap::new(),
        }
    }

    /// Catalog with no renderer; image loads fail
    #[cfg(test)]
    pub fn without_renderer() -> Self {
        ResourceCatalog {
            texture_creator: None,
            images: HashMap::new(),
            sounds: HashMap::new(),
            tracks: BTreeMap::new(),
            fonts: HashMap::new(),
        }
    }

    pub fn image(&self, key: &str) -> GameResult<&Texture<'a>> {
        self.images.get(key).ok_or_else(|| missing(ResourceCategory::Image, key))
    }

    pub fn has_image(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Pixel size of an image
    pub fn image_size(&self, key: &str) -> GameResult<(u32, u32)> {
        let query = self.image(key)?.query();
        Ok((query.width, query.height))
    }

    #[cfg(test)]
    pub fn sound(&self, key: &str) -> GameResult<&[u8]> {
        self.sounds
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| missing(ResourceCategory::Sound, key))
    }

    pub fn has_sound(&self, key: &str) -> bool {
        self.sounds.contains_key(key)
    }

    pub fn track(&self, key: &str) -> GameResult<&TrackMap> {
        self.tracks.get(key).ok_or_else(|| missing(ResourceCategory::Tilemap, key))
    }

    /// Every loaded track, sorted by key
    pub fn tracks(&self) -> impl Iterator<Item = (&str, &TrackMap)> {
        self.tracks.iter().map(|(key, map)| (key.as_str(), map))
    }

    #[cfg(test)]
    pub fn font(&self, key: &str) -> GameResult<&Path> {
        self.fonts
            .get(key)
            .map(PathBuf::as_path)
            .ok_or_else(|| missing(ResourceCategory::Font, key))
    }

    fn load_image(&mut self, key: &str, path: &Path) -> GameResult<()> {
        let creator = self
            .texture_creator
            .ok_or_else(|| GameError::Sdl(format!("no renderer to load image '{}'", key)))?;
        let texture = creator
            .load_texture(path)
            .map_err(|e| GameError::Sdl(format!("{}: {}", path.display(), e)))?;
        self.images.insert(key.to_string(), texture);
        Ok(())
    }
}

impl AssetStore for ResourceCatalog<'_> {
    fn store(&mut self, task: &LoadTask, full_path: &Path) -> GameResult<()> {
        match task.category {
            ResourceCategory::Image => self.load_image(&task.key, full_path)?,
            ResourceCategory::Sound => {
                let bytes = std::fs::read(full_path).map_err(|source| GameError::Io {
                    path: full_path.to_path_buf(),
                    source,
                })?;
                self.sounds.insert(task.key.clone(), bytes);
            }
            ResourceCategory::Tilemap => {
                let map = TrackMap::load_from_file(full_path)?;
                self.tracks.insert(task.key.clone(), map);
            }
            ResourceCategory::Font => {
                if !full_path.is_file() {
                    return Err(GameError::Io {
                        path: full_path.to_path_buf(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "font file not found",
                        ),
                    });
                }
                self.fonts.insert(task.key.clone(), full_path.to_path_buf());
            }
        }
        Ok(())
    }
}

fn missing(category: ResourceCategory, key: &str) -> GameError {
    GameError::MissingResource {
        category: category.as_str(),
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track_map::tests::small_track;

    fn task(category: ResourceCategory, key: &str) -> LoadTask {
        LoadTask {
            category,
            key: key.to_string(),
            path: PathBuf::from(key),
        }
    }

    #[test]
    fn test_sound_track_and_font_are_stored() {
        let dir = tempfile::tempdir().unwrap();
        let sound_path = dir.path().join("select.wav");
        let track_path = dir.path().join("hills.json");
        let font_path = dir.path().join("main.ttf");
        std::fs::write(&sound_path, b"RIFF").unwrap();
        std::fs::write(&track_path, serde_json::to_string(&small_track()).unwrap()).unwrap();
        std::fs::write(&font_path, b"font").unwrap();

        let mut catalog = ResourceCatalog::without_renderer();
        catalog.store(&task(ResourceCategory::Sound, "menu-select"), &sound_path).unwrap();
        catalog.store(&task(ResourceCategory::Tilemap, "hills"), &track_path).unwrap();
        catalog.store(&task(ResourceCategory::Font, "main"), &font_path).unwrap();

        assert_eq!(catalog.sound("menu-select").unwrap(), b"RIFF");
        assert!(catalog.has_sound("menu-select"));
        assert_eq!(catalog.track("hills").unwrap().name, "Test Hills");
        assert_eq!(catalog.font("main").unwrap(), font_path.as_path());
    }

    #[test]
    fn test_tracks_are_sorted_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.json");
        std::fs::write(&path, serde_json::to_string(&small_track()).unwrap()).unwrap();

        let mut catalog = ResourceCatalog::without_renderer();
        for key in ["zigzag", "alpine", "meadow"] {
            catalog.store(&task(ResourceCategory::Tilemap, key), &path).unwrap();
        }

        let keys: Vec<&str> = catalog.tracks().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["alpine", "meadow", "zigzag"]);
    }

    #[test]
    fn test_missing_lookups() {
        let catalog = ResourceCatalog::without_renderer();
        assert!(matches!(
            catalog.image("title"),
            Err(GameError::MissingResource { category: "image", .. })
        ));
        assert!(matches!(
            catalog.track("hills"),
            Err(GameError::MissingResource { category: "tilemap", .. })
        ));
    }

    #[test]
    fn test_missing_files_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ResourceCatalog::without_renderer();

        let sound_path = dir.path().join("beep.wav");
        let sound = catalog.store(&task(ResourceCategory::Sound, "beep"), &sound_path);
        assert!(matches!(sound, Err(GameError::Io { .. })));

        let font_path = dir.path().join("main.ttf");
        let font = catalog.store(&task(ResourceCategory::Font, "main"), &font_path);
        assert!(matches!(font, Err(GameError::Io { .. })));
        assert!(catalog.font("main").is_err());
    }

    #[test]
    fn test_image_without_renderer_is_an_sdl_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ResourceCatalog::without_renderer();
        let image_path = dir.path().join("title.png");
        let result = catalog.store(&task(ResourceCategory::Image, "title"), &image_path);
        assert!(matches!(result, Err(GameError::Sdl(_))));
    }
}
