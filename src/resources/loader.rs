//! Incremental resource loading
//!
//! Loading every asset up front would freeze the title screen, so the
//! loader is a cursor over the manifest's tasks. The title scene calls
//! [`ResourceLoader::advance`] once per frame; each call loads exactly one
//! asset and reports progress on the bus.

use crate::error::GameResult;
use crate::events::{EventBus, GameEvent};
use crate::resources::{ResourceCategory, ResourceManifest};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One asset to load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTask {
    pub category: ResourceCategory,
    pub key: String,
    /// Path relative to the resource root
    pub path: PathBuf,
}

/// Destination for loaded assets
pub trait AssetStore {
    /// Load the asset described by `task` from `full_path` and keep it
    fn store(&mut self, task: &LoadTask, full_path: &Path) -> GameResult<()>;
}

/// Result of a single [`ResourceLoader::advance`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadStatus {
    /// One more asset was loaded; `percent` is in `(0, 1]`
    Loaded { percent: f32 },
    /// Nothing left to do
    Finished,
}

pub struct ResourceLoader {
    root: PathBuf,
    tasks: Vec<LoadTask>,
    next: usize,
    finished: bool,
}

impl ResourceLoader {
    pub fn new(root: impl Into<PathBuf>, manifest: &ResourceManifest) -> Self {
        ResourceLoader {
            root: root.into(),
            tasks: manifest.tasks(),
            next: 0,
            finished: false,
        }
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn loaded(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Load the next asset
    ///
    /// Publishes `ResourcesLoading` for the asset, then `ResourcesLoaded`
    /// once after the last one. A load failure is returned and the task is
    /// not consumed.
    pub fn advance(
        &mut self,
        store: &mut impl AssetStore,
        bus: &mut EventBus,
    ) -> GameResult<LoadStatus> {
        if self.finished {
            return Ok(LoadStatus::Finished);
        }

        let Some(task) = self.tasks.get(self.next) else {
            self.finish(bus);
            return Ok(LoadStatus::Finished);
        };

        let full_path = self.root.join(&task.path);
        store.store(task, &full_path)?;
        let (category, key) = (task.category, task.key.clone());

        self.next += 1;
        debug!(
            category = category.as_str(),
            key = %key,
            path = %full_path.display(),
            loaded = self.loaded(),
            total = self.total(),
            "Loaded resource"
        );
        let percent = self.loaded() as f32 / self.total() as f32;
        bus.publish(GameEvent::ResourcesLoading { percent, category, key });

        if self.loaded() == self.total() {
            self.finish(bus);
        }

        Ok(LoadStatus::Loaded { percent })
    }

    fn finish(&mut self, bus: &mut EventBus) {
        self.finished = true;
        debug!(count = self.tasks.len(), root = %self.root.display(), "All resources loaded");
        bus.publish(GameEvent::ResourcesLoaded);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Store that only records what it was asked to load
    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub loaded: Vec<(ResourceCategory, String, PathBuf)>,
        pub fail_on: Option<String>,
    }

    impl AssetStore for RecordingStore {
        fn store(&mut self, task: &LoadTask, full_path: &Path) -> GameResult<()> {
            if self.fail_on.as_deref() == Some(task.key.as_str()) {
                return Err(GameError::MissingResource {
                    category: task.category.as_str(),
                    key: task.key.clone(),
                });
            }
            self.loaded.push((task.category, task.key.clone(), full_path.to_path_buf()));
            Ok(())
        }
    }

    pub(crate) fn three_item_manifest() -> ResourceManifest {
        serde_json::from_str(
            r#"{
                "images": {"title": "images/title.png"},
                "sounds": {"menu-select": "sounds/select.wav"},
                "fonts": {"main": "fonts/main.ttf"}
            }"#,
        )
        .unwrap()
    }

    fn capture(bus: &mut EventBus) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::ResourcesLoading, EventKind::ResourcesLoaded] {
            let seen = Rc::clone(&seen);
            bus.subscribe(kind, move |event, _| {
                seen.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        seen
    }

    #[test]
    fn test_progress_sequence() {
        let mut bus = EventBus::new();
        let seen = capture(&mut bus);
        let mut store = RecordingStore::default();
        let mut loader = ResourceLoader::new("/assets", &three_item_manifest());

        assert_eq!(loader.total(), 3);
        for _ in 0..3 {
            loader.advance(&mut store, &mut bus).unwrap();
        }
        assert_eq!(loader.loaded(), loader.total());

        let seen = seen.borrow();
        let percents: Vec<f32> = seen
            .iter()
            .filter_map(|e| match e {
                GameEvent::ResourcesLoading { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), 3);
        assert!((percents[0] - 1.0 / 3.0).abs() < 1e-6);
        assert!((percents[1] - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(percents[2], 1.0);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(seen.last(), Some(&GameEvent::ResourcesLoaded));
        assert_eq!(
            seen.iter().filter(|e| **e == GameEvent::ResourcesLoaded).count(),
            1
        );
        assert_eq!(store.loaded[0].2, PathBuf::from("/assets/images/title.png"));
    }

    #[test]
    fn test_advance_after_finish_is_quiet() {
        let mut bus = EventBus::new();
        let seen = capture(&mut bus);
        let mut store = RecordingStore::default();
        let mut loader = ResourceLoader::new("/assets", &three_item_manifest());

        for _ in 0..3 {
            loader.advance(&mut store, &mut bus).unwrap();
        }
        let before = seen.borrow().len();

        assert_eq!(loader.advance(&mut store, &mut bus).unwrap(), LoadStatus::Finished);
        assert_eq!(seen.borrow().len(), before);
        assert!(loader.is_finished());
        assert_eq!(store.loaded.len(), 3);
    }

    #[test]
    fn test_empty_manifest_finishes_on_first_advance() {
        let mut bus = EventBus::new();
        let seen = capture(&mut bus);
        let mut store = RecordingStore::default();
        let mut loader = ResourceLoader::new("/assets", &ResourceManifest::default());

        assert_eq!(loader.advance(&mut store, &mut bus).unwrap(), LoadStatus::Finished);
        assert_eq!(*seen.borrow(), vec![GameEvent::ResourcesLoaded]);
    }

    #[test]
    fn test_failure_propagates_without_progress() {
        let mut bus = EventBus::new();
        let seen = capture(&mut bus);
        let mut store = RecordingStore {
            fail_on: Some("title".to_string()),
            ..Default::default()
        };
        let mut loader = ResourceLoader::new("/assets", &three_item_manifest());

        assert!(loader.advance(&mut store, &mut bus).is_err());
        assert_eq!(loader.loaded(), 0);
        assert!(seen.borrow().is_empty());
    }
}
