//! Scene director
//!
//! Owns every scene and the name of the active one. Scenes ask for a switch
//! by publishing `SwitchScene`; the director queues the request and applies
//! it between frames, so a scene is never torn down from inside its own
//! update or event handler.

use crate::error::{GameError, GameResult};
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::scene::{HasEventBus, Scene, SceneName, TransferOptions};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, error, info};

type PendingSwitches = Rc<RefCell<VecDeque<(SceneName, TransferOptions)>>>;

pub struct SceneDirector<S> {
    scenes: HashMap<SceneName, S>,
    active: SceneName,
    pending: PendingSwitches,
    subscription: SubscriptionId,
    started: bool,
}

impl<S> SceneDirector<S> {
    /// Take ownership of `scenes` and listen for switch requests on `bus`
    pub fn new(
        scenes: HashMap<SceneName, S>,
        initial: SceneName,
        bus: &mut EventBus,
    ) -> GameResult<Self> {
        if !scenes.contains_key(&initial) {
            return Err(GameError::UnknownScene(initial.to_string()));
        }

        let pending: PendingSwitches = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&pending);
        let subscription = bus.subscribe(EventKind::SwitchScene, move |event, _| {
            if let GameEvent::SwitchScene { name, options } = event {
                debug!(scene = %name, "Scene switch requested");
                queue.borrow_mut().push_back((*name, options.clone()));
            }
            Ok(())
        });

        Ok(SceneDirector {
            scenes,
            active: initial,
            pending,
            subscription,
            started: false,
        })
    }

    #[cfg(test)]
    pub fn active_name(&self) -> SceneName {
        self.active
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Stop listening for switch requests
    pub fn detach(&mut self, bus: &mut EventBus) {
        bus.unsubscribe(self.subscription);
    }

    /// Set up the initial scene. Only the first call does anything.
    pub fn start<C>(&mut self, ctx: &mut C) -> GameResult<()>
    where
        S: Scene<C>,
        C: HasEventBus,
    {
        if self.started {
            return Ok(());
        }
        self.started = true;
        info!(scene = %self.active, "Starting first scene");
        self.active_scene()?.setup(ctx, &TransferOptions::default())
    }

    /// Tear down the active scene and set up `name`
    ///
    /// An unregistered name is rejected before anything is torn down.
    /// Teardown failures are logged and the switch goes ahead.
    pub fn switch_scene<C>(
        &mut self,
        ctx: &mut C,
        name: SceneName,
        options: &TransferOptions,
    ) -> GameResult<()>
    where
        S: Scene<C>,
        C: HasEventBus,
    {
        if !self.scenes.contains_key(&name) {
            return Err(GameError::UnknownScene(name.to_string()));
        }

        let previous = self.active;
        if let Err(e) = self.active_scene()?.teardown(ctx) {
            error!(scene = %previous, error = %e, "Scene teardown failed");
        }

        self.active = name;
        info!(from = %previous, to = %name, ?options, "Switching scene");
        self.active_scene()?.setup(ctx, options)
    }

    /// Apply every queued switch request, oldest first
    pub fn apply_pending<C>(&mut self, ctx: &mut C) -> GameResult<()>
    where
        S: Scene<C>,
        C: HasEventBus,
    {
        loop {
            // a setup may queue another switch, so pop one at a time
            let next = self.pending.borrow_mut().pop_front();
            let Some((name, options)) = next else {
                return Ok(());
            };
            self.switch_scene(ctx, name, &options)?;
        }
    }

    /// Run one frame of the active scene, then apply switches it asked for
    pub fn update<C>(&mut self, ctx: &mut C, delta: f32) -> GameResult<()>
    where
        S: Scene<C>,
        C: HasEventBus,
    {
        self.active_scene()?.update(ctx, delta)?;
        self.apply_pending(ctx)
    }

    fn active_scene(&mut self) -> GameResult<&mut S> {
        self.scenes
            .get_mut(&self.active)
            .ok_or_else(|| GameError::UnknownScene(self.active.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCtx {
        bus: EventBus,
        log: Vec<String>,
    }

    impl HasEventBus for TestCtx {
        fn bus(&mut self) -> &mut EventBus {
            &mut self.bus
        }
    }

    /// Scene that records its lifecycle calls in the context
    struct RecordingScene {
        name: SceneName,
        switch_on_update: Option<SceneName>,
        fail_teardown: bool,
    }

    impl RecordingScene {
        fn new(name: SceneName) -> Self {
            RecordingScene {
                name,
                switch_on_update: None,
                fail_teardown: false,
            }
        }
    }

    impl Scene<TestCtx> for RecordingScene {
        fn name(&self) -> SceneName {
            self.name
        }

        fn setup(&mut self, ctx: &mut TestCtx, options: &TransferOptions) -> GameResult<()> {
            let detail = options.get("kart_id").unwrap_or("-");
            ctx.log.push(format!("setup:{}:{}", self.name, detail));
            Ok(())
        }

        fn teardown(&mut self, ctx: &mut TestCtx) -> GameResult<()> {
            ctx.log.push(format!("teardown:{}", self.name));
            if self.fail_teardown {
                return Err(GameError::Physics("teardown broke".to_string()));
            }
            Ok(())
        }

        fn update(&mut self, ctx: &mut TestCtx, _delta: f32) -> GameResult<()> {
            ctx.log.push(format!("update:{}", self.name));
            if let Some(target) = self.switch_on_update.take() {
                ctx.bus.publish(GameEvent::SwitchScene {
                    name: target,
                    options: TransferOptions::new().with("kart_id", "red-kart"),
                });
            }
            Ok(())
        }
    }

    fn director(scenes: Vec<RecordingScene>, ctx: &mut TestCtx) -> SceneDirector<RecordingScene> {
        let registry = scenes.into_iter().map(|s| (s.name, s)).collect();
        SceneDirector::new(registry, SceneName::Title, &mut ctx.bus).unwrap()
    }

    fn ctx() -> TestCtx {
        TestCtx {
            bus: EventBus::new(),
            log: Vec::new(),
        }
    }

    #[test]
    fn test_first_scene_is_set_up_without_teardown() {
        let mut ctx = ctx();
        let mut director = director(vec![RecordingScene::new(SceneName::Title)], &mut ctx);

        director.start(&mut ctx).unwrap();
        director.start(&mut ctx).unwrap();

        assert_eq!(ctx.log, vec!["setup:title:-"]);
    }

    #[test]
    fn test_teardown_runs_before_setup() {
        let mut ctx = ctx();
        let mut director = director(
            vec![
                RecordingScene::new(SceneName::Title),
                RecordingScene::new(SceneName::KartSelect),
            ],
            &mut ctx,
        );
        director.start(&mut ctx).unwrap();

        director
            .switch_scene(&mut ctx, SceneName::KartSelect, &TransferOptions::new())
            .unwrap();

        assert_eq!(ctx.log, vec!["setup:title:-", "teardown:title", "setup:kart-select:-"]);
        assert_eq!(director.active_name(), SceneName::KartSelect);
    }

    #[test]
    fn test_unknown_scene_is_rejected_without_teardown() {
        let mut ctx = ctx();
        let mut director = director(vec![RecordingScene::new(SceneName::Title)], &mut ctx);
        director.start(&mut ctx).unwrap();

        let result = director.switch_scene(&mut ctx, SceneName::Track, &TransferOptions::new());

        assert!(matches!(result, Err(GameError::UnknownScene(name)) if name == "track"));
        assert_eq!(director.active_name(), SceneName::Title);
        assert_eq!(ctx.log, vec!["setup:title:-"]);
    }

    #[test]
    fn test_unknown_initial_scene_is_rejected() {
        let mut bus = EventBus::new();
        let registry: HashMap<SceneName, RecordingScene> = HashMap::new();
        assert!(SceneDirector::new(registry, SceneName::Title, &mut bus).is_err());
    }

    #[test]
    fn test_switch_requested_during_update_applies_after_it() {
        let mut ctx = ctx();
        let mut title = RecordingScene::new(SceneName::Title);
        title.switch_on_update = Some(SceneName::KartSelect);
        let scenes = vec![title, RecordingScene::new(SceneName::KartSelect)];
        let mut director = director(scenes, &mut ctx);
        director.start(&mut ctx).unwrap();

        director.update(&mut ctx, 0.033).unwrap();

        assert_eq!(
            ctx.log,
            vec![
                "setup:title:-",
                "update:title",
                "teardown:title",
                "setup:kart-select:red-kart",
            ]
        );
        assert!(!director.has_pending());
    }

    #[test]
    fn test_switch_published_between_frames_is_queued() {
        let mut ctx = ctx();
        let mut director = director(
            vec![
                RecordingScene::new(SceneName::Title),
                RecordingScene::new(SceneName::TrackSelect),
            ],
            &mut ctx,
        );
        director.start(&mut ctx).unwrap();

        ctx.bus.publish(GameEvent::SwitchScene {
            name: SceneName::TrackSelect,
            options: TransferOptions::new(),
        });
        assert!(director.has_pending());
        assert_eq!(director.active_name(), SceneName::Title);

        director.apply_pending(&mut ctx).unwrap();
        assert_eq!(director.active_name(), SceneName::TrackSelect);
    }

    #[test]
    fn test_failed_teardown_does_not_block_switch() {
        let mut ctx = ctx();
        let mut title = RecordingScene::new(SceneName::Title);
        title.fail_teardown = true;
        let scenes = vec![title, RecordingScene::new(SceneName::KartSelect)];
        let mut director = director(scenes, &mut ctx);
        director.start(&mut ctx).unwrap();

        director
            .switch_scene(&mut ctx, SceneName::KartSelect, &TransferOptions::new())
            .unwrap();

        assert_eq!(director.active_name(), SceneName::KartSelect);
    }

    #[test]
    fn test_detach_stops_listening() {
        let mut ctx = ctx();
        let mut director = director(vec![RecordingScene::new(SceneName::Title)], &mut ctx);
        director.detach(&mut ctx.bus);

        assert_eq!(ctx.bus.subscriber_count(EventKind::SwitchScene), 0);
    }
}
