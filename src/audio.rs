//! Sound playback requests
//!
//! Scenes and widgets never touch audio directly; they publish `PlaySound`
//! and `StopSound`. [`install`] routes those events to an [`AudioSink`].

use crate::error::{GameError, GameResult};
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::resources::ResourceCategory;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

/// A playback request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    /// Extra repeats; -1 loops until stopped
    pub loops: i32,
    /// Stop after this many milliseconds; 0 means no limit
    pub maxtime: u32,
    pub fade_ms: u32,
}

pub trait AudioSink {
    /// Start `name`; an unknown sound is an error
    fn play(&mut self, name: &str, playback: Playback) -> GameResult<()>;

    /// Stop `name` if it is playing
    fn stop(&mut self, name: &str, fade_ms: u32) -> GameResult<()>;

    /// A sound finished loading and may now be played
    fn register(&mut self, _name: &str) {}
}

/// Bookkeeping sink: no sound is ever audible
///
/// Playback is not implemented. The sink checks each request against the
/// sounds the loader reported, records what would be playing and logs it;
/// the loaded sound bytes are never decoded or mixed.
#[derive(Debug, Default)]
pub struct CatalogAudio {
    known: HashSet<String>,
    playing: HashMap<String, Playback>,
}

impl CatalogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_playing(&self, name: &str) -> bool {
        self.playing.contains_key(name)
    }

    #[cfg(test)]
    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }
}

impl AudioSink for CatalogAudio {
    fn play(&mut self, name: &str, playback: Playback) -> GameResult<()> {
        if !self.known.contains(name) {
            return Err(GameError::MissingResource {
                category: ResourceCategory::Sound.as_str(),
                key: name.to_string(),
            });
        }
        debug!(name, ?playback, "Playing sound");
        self.playing.insert(name.to_string(), playback);
        Ok(())
    }

    fn stop(&mut self, name: &str, fade_ms: u32) -> GameResult<()> {
        match self.playing.remove(name) {
            Some(_) => debug!(name, fade_ms, "Stopping sound"),
            None => trace!(name, "Stop for a sound that is not playing"),
        }
        Ok(())
    }

    fn register(&mut self, name: &str) {
        self.known.insert(name.to_string());
    }
}

/// Route sound events on `bus` to `sink`
///
/// With `enabled` false play requests are dropped; stops still go through.
pub fn install<A>(
    bus: &mut EventBus,
    sink: Rc<RefCell<A>>,
    enabled: bool,
) -> Vec<SubscriptionId>
where
    A: AudioSink + 'static,
{
    let mut subscriptions = Vec::with_capacity(3);

    let s = Rc::clone(&sink);
    subscriptions.push(bus.subscribe(EventKind::ResourcesLoading, move |event, _| {
        if let GameEvent::ResourcesLoading { category: ResourceCategory::Sound, key, .. } = event {
            s.borrow_mut().register(key);
        }
        Ok(())
    }));

    let s = Rc::clone(&sink);
    subscriptions.push(bus.subscribe(EventKind::PlaySound, move |event, _| {
        let GameEvent::PlaySound { name, loops, maxtime, fade_ms } = event else {
            return Ok(());
        };
        if !enabled {
            trace!(name, "Sound disabled, not playing");
            return Ok(());
        }
        let playback = Playback {
            loops: *loops,
            maxtime: *maxtime,
            fade_ms: *fade_ms,
        };
        s.borrow_mut().play(name, playback)
    }));

    let s = sink;
    subscriptions.push(bus.subscribe(EventKind::StopSound, move |event, _| {
        if let GameEvent::StopSound { name, fade_ms } = event {
            s.borrow_mut().stop(name, *fade_ms)?;
        }
        Ok(())
    }));

    subscriptions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound_loaded(key: &str) -> GameEvent {
        GameEvent::ResourcesLoading {
            percent: 0.5,
            category: ResourceCategory::Sound,
            key: key.to_string(),
        }
    }

    #[test]
    fn test_play_and_stop_loaded_sound() {
        let mut bus = EventBus::new();
        let audio = Rc::new(RefCell::new(CatalogAudio::new()));
        install(&mut bus, Rc::clone(&audio), true);

        bus.publish(sound_loaded("menu-select"));
        bus.publish(GameEvent::play_sound("menu-select"));
        assert!(audio.borrow().is_playing("menu-select"));

        bus.publish(GameEvent::stop_sound("menu-select"));
        assert_eq!(audio.borrow().playing_count(), 0);
    }

    #[test]
    fn test_disabled_sound_is_not_played() {
        let mut bus = EventBus::new();
        let audio = Rc::new(RefCell::new(CatalogAudio::new()));
        install(&mut bus, Rc::clone(&audio), false);

        bus.publish(sound_loaded("title-music"));
        bus.publish(GameEvent::play_sound("title-music"));

        assert!(!audio.borrow().is_playing("title-music"));
    }

    #[test]
    fn test_unknown_sound_is_an_error() {
        let mut audio = CatalogAudio::new();
        let err = audio.play("nope", Playback { loops: 0, maxtime: 0, fade_ms: 0 }).unwrap_err();
        assert!(matches!(err, GameError::MissingResource { category: "sound", .. }));
    }

    #[test]
    fn test_image_loads_do_not_register_sounds() {
        let mut bus = EventBus::new();
        let audio = Rc::new(RefCell::new(CatalogAudio::new()));
        install(&mut bus, Rc::clone(&audio), true);

        bus.publish(GameEvent::ResourcesLoading {
            percent: 1.0,
            category: ResourceCategory::Image,
            key: "title".to_string(),
        });
        bus.publish(GameEvent::play_sound("title"));

        assert!(!audio.borrow().is_playing("title"));
    }
}
