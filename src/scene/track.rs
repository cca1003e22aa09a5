//! The race itself
//!
//! Builds a physics world from the chosen track, drops the chosen kart on
//! it and steps the simulation once per frame. Everything is drawn into an
//! off-screen buffer the size of the whole track; the camera's window onto
//! that buffer goes to the screen, and the whole buffer shrunk down becomes
//! the mini-map.

use crate::camera::Camera;
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::kart::{
    find_profile, kart_roster, Direction, Kart, KartDimensions, KartSprites, KartTuning,
};
use crate::physics::{Outline, PhysicsWorld};
use crate::resources::ResourceCatalog;
use crate::scene::{Scene, SceneContext, SceneName, TransferOptions, KART_ID_OPTION, TRACK_OPTION};
use crate::track_map::TrackMap;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, Texture};
use sdl2::video::Window;
use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;
use tracing::{debug, trace};

/// Mini-map size as a fraction of the track
pub const MINI_MAP_SCALE: f32 = 0.075;

/// Where a kart starts when no track was chosen
pub const DEFAULT_START: (f32, f32) = (150.0, 150.0);

/// Thickness of the flat floor used when no track was chosen
const FLOOR_RADIUS: f32 = 5.0;

const SKY_COLOR: Color = Color::RGB(100, 149, 237);
const GROUND_COLOR: Color = Color::RGB(86, 60, 40);
const WIREFRAME_BACKGROUND: Color = Color::RGB(0, 0, 0);
const WIREFRAME_COLOR: Color = Color::RGB(0, 255, 0);
const CIRCLE_SEGMENTS: usize = 16;

/// What a key-up does to the karts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KartCommand {
    Accelerate(Direction),
    Decelerate,
    Jump,
}

pub fn command_for_key(key: Keycode) -> Option<KartCommand> {
    match key {
        Keycode::Right => Some(KartCommand::Accelerate(Direction::Right)),
        Keycode::Left => Some(KartCommand::Accelerate(Direction::Left)),
        Keycode::Up => Some(KartCommand::Jump),
        Keycode::Down => Some(KartCommand::Decelerate),
        _ => None,
    }
}

/// The simulation: one world and the karts in it
pub struct TrackState {
    pub world: PhysicsWorld,
    pub karts: Vec<Kart>,
    pub start: (f32, f32),
    /// Options the scene was entered with, handed back on exit
    pub options: TransferOptions,
}

impl TrackState {
    /// A fresh world holding the track's ground
    ///
    /// With no map the ground is a flat floor along the bottom of a
    /// `screen`-sized area and karts start at [`DEFAULT_START`].
    pub fn new(map: Option<&TrackMap>, screen: (u32, u32), options: TransferOptions) -> Self {
        let mut world = PhysicsWorld::default();

        let start = match map {
            Some(map) => {
                let runs = map.solid_runs();
                for run in &runs {
                    world.add_static_box(run.x, run.y, run.width, run.height);
                }
                debug!(track = %map.name, colliders = runs.len(), "Track ground built");
                (map.start[0], map.start[1])
            }
            None => {
                let y = screen.1 as f32 - FLOOR_RADIUS * 2.0;
                world.add_static_segment((0.0, y), (screen.0 as f32, y), FLOOR_RADIUS);
                debug!(y, "No track chosen, using a flat floor");
                DEFAULT_START
            }
        };

        TrackState {
            world,
            karts: Vec::new(),
            start,
            options,
        }
    }

    /// Put `kart` in the world and take ownership of it
    pub fn add_kart(&mut self, mut kart: Kart) -> GameResult<()> {
        kart.init_physics(&mut self.world)?;
        self.karts.push(kart);
        Ok(())
    }

    /// Apply `command` to every kart
    pub fn apply(&mut self, command: KartCommand) {
        trace!(?command, "Kart command");
        for kart in &mut self.karts {
            match command {
                KartCommand::Accelerate(direction) => kart.accelerate(&mut self.world, direction),
                KartCommand::Decelerate => kart.decelerate(&mut self.world),
                KartCommand::Jump => kart.jump(&mut self.world),
            }
        }
    }

    /// Take every kart out of the world, leaving only the ground
    pub fn remove_karts(&mut self) {
        for kart in &mut self.karts {
            kart.remove_from(&mut self.world);
        }
        self.karts.clear();
    }

    /// Position the camera should follow
    pub fn focus(&self) -> Option<(f32, f32)> {
        self.karts.first().and_then(|kart| kart.position(&self.world))
    }
}

/// Build the player's kart from the roster entry named in `options`
///
/// Sprite sizes set the kart's dimensions when both images are loaded;
/// otherwise the kart gets default dimensions and is drawn as outlines.
pub fn build_kart(
    options: &TransferOptions,
    start: (f32, f32),
    resources: &ResourceCatalog,
) -> GameResult<Kart> {
    let roster = kart_roster();
    let profile = find_profile(&roster, options.get(KART_ID_OPTION))
        .ok_or_else(|| GameError::Physics("kart roster is empty".to_string()))?;

    let has_sprites =
        resources.has_image(profile.body_image) && resources.has_image(profile.wheel_image);
    let dimensions = if has_sprites {
        KartDimensions::from_sprites(
            resources.image_size(profile.body_image)?,
            resources.image_size(profile.wheel_image)?,
        )
    } else {
        KartDimensions::default()
    };

    let kart = Kart::new(profile.id, start, dimensions, profile.performance, KartTuning::default());
    if has_sprites {
        return Ok(kart.with_sprites(KartSprites {
            body: profile.body_image.to_string(),
            wheel: profile.wheel_image.to_string(),
        }));
    }
    Ok(kart)
}

pub fn subscribe_track(
    state: &Rc<RefCell<Option<TrackState>>>,
    bus: &mut EventBus,
) -> SubscriptionId {
    let s = Rc::clone(state);
    bus.subscribe(EventKind::KeyUp, move |event, outbox| {
        let GameEvent::KeyUp { key, .. } = event else {
            return Ok(());
        };
        let mut guard = s.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return Ok(());
        };

        if *key == Keycode::Escape {
            outbox.publish(GameEvent::SwitchScene {
                name: SceneName::TrackSelect,
                options: state.options.clone(),
            });
        } else if let Some(command) = command_for_key(*key) {
            state.apply(command);
        }
        Ok(())
    })
}

pub struct TrackScene<'a> {
    physics_step: f32,
    wireframe: bool,
    show_mini_map: bool,
    state: Rc<RefCell<Option<TrackState>>>,
    map: Option<TrackMap>,
    camera: Camera,
    buffer: Option<Texture<'a>>,
    subscription: Option<SubscriptionId>,
}

impl<'a> TrackScene<'a> {
    pub fn new(config: &GameConfig) -> Self {
        TrackScene {
            physics_step: config.physics_step(),
            wireframe: config.wireframe_mode,
            show_mini_map: config.show_mini_map,
            state: Rc::new(RefCell::new(None)),
            map: None,
            camera: Camera::new(
                config.display_width,
                config.display_height,
                config.display_width,
                config.display_height,
            ),
            buffer: None,
            subscription: None,
        }
    }

    /// Size of the off-screen buffer: the whole track, or the screen
    fn extent(&self, config: &GameConfig) -> (u32, u32) {
        match &self.map {
            Some(map) => map.pixel_size(),
            None => (config.display_width, config.display_height),
        }
    }

    fn render(&mut self, ctx: &mut SceneContext<'a>) -> GameResult<()> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(());
        };
        let guard = self.state.borrow();
        let Some(state) = guard.as_ref() else {
            return Ok(());
        };

        let mut result = Ok(());
        let map = self.map.as_ref();
        let wireframe = self.wireframe;
        let resources = &ctx.resources;
        ctx.canvas.with_texture_canvas(buffer, |canvas| {
            result = draw_track(canvas, state, map, resources, wireframe);
        })?;
        result?;

        let canvas = &mut ctx.canvas;
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();

        let query = buffer.query();
        let bounds = Rect::new(0, 0, query.width, query.height);
        let (ox, oy) = self.camera.offset();
        if let Some(src) = self.camera.rect().intersection(bounds) {
            let dst = Rect::new(src.x() - ox, src.y() - oy, src.width(), src.height());
            canvas.copy(buffer, src, dst)?;
        }

        if self.show_mini_map {
            let w = ((query.width as f32 * MINI_MAP_SCALE) as u32).max(1);
            let h = ((query.height as f32 * MINI_MAP_SCALE) as u32).max(1);
            let mini = Rect::new(0, 0, w, h);
            canvas.copy(buffer, None, mini)?;
            canvas.set_draw_color(Color::RGB(255, 255, 255));
            canvas.draw_rect(mini)?;
        }
        Ok(())
    }
}

impl<'a> Scene<SceneContext<'a>> for TrackScene<'a> {
    fn name(&self) -> SceneName {
        SceneName::Track
    }

    fn setup(&mut self, ctx: &mut SceneContext<'a>, options: &TransferOptions) -> GameResult<()> {
        debug!(?options, "Setting up track scene");
        let screen = (ctx.config.display_width, ctx.config.display_height);

        self.map = match options.get(TRACK_OPTION) {
            Some(key) => Some(ctx.resources.track(key)?.clone()),
            None => None,
        };

        let mut state = TrackState::new(self.map.as_ref(), screen, options.clone());
        let kart = build_kart(options, state.start, &ctx.resources)?;
        state.add_kart(kart)?;
        debug!(
            bodies = state.world.body_count(),
            colliders = state.world.collider_count(),
            joints = state.world.joint_count(),
            "Track world ready"
        );

        let (map_w, map_h) = self.extent(&ctx.config);
        self.camera = Camera::new(screen.0, screen.1, map_w, map_h);
        if let Some((x, y)) = state.focus() {
            self.camera.center_on(x, y);
        }

        *self.state.borrow_mut() = Some(state);
        self.subscription = Some(subscribe_track(&self.state, &mut ctx.bus));
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut SceneContext<'a>) -> GameResult<()> {
        debug!("Tearing down track scene");
        if let Some(id) = self.subscription.take() {
            ctx.bus.unsubscribe(id);
        }
        let state = self.state.borrow_mut().take();
        if let Some(mut state) = state {
            state.remove_karts();
            trace!(bodies = state.world.body_count(), "Karts removed");
        }
        self.buffer = None;
        self.map = None;
        Ok(())
    }

    fn update(&mut self, ctx: &mut SceneContext<'a>, _delta: f32) -> GameResult<()> {
        if self.buffer.is_none() {
            let (w, h) = self.extent(&ctx.config);
            debug!(w, h, "Allocating track buffer");
            self.buffer = Some(ctx.texture_creator.create_texture_target(None, w, h)?);
        }

        let focus = {
            let mut guard = self.state.borrow_mut();
            guard.as_mut().and_then(|state| {
                state.world.step(self.physics_step);
                state.focus()
            })
        };
        if let Some((x, y)) = focus {
            self.camera.center_on(x, y);
        }

        self.render(ctx)
    }
}

fn draw_track(
    canvas: &mut Canvas<Window>,
    state: &TrackState,
    map: Option<&TrackMap>,
    resources: &ResourceCatalog,
    wireframe: bool,
) -> GameResult<()> {
    if wireframe {
        canvas.set_draw_color(WIREFRAME_BACKGROUND);
        canvas.clear();
        return draw_outlines(canvas, &state.world.outlines(), WIREFRAME_COLOR);
    }

    canvas.set_draw_color(SKY_COLOR);
    canvas.clear();

    match map {
        Some(map) => draw_tiles(canvas, map, resources)?,
        None => draw_outlines(canvas, &state.world.outlines(), GROUND_COLOR)?,
    }

    let mut outlined = false;
    for kart in &state.karts {
        if kart.has_sprites() {
            kart.draw(canvas, &state.world, resources, (0, 0))?;
        } else if !outlined {
            draw_outlines(canvas, &state.world.outlines(), WIREFRAME_COLOR)?;
            outlined = true;
        }
    }
    Ok(())
}

fn draw_tiles(
    canvas: &mut Canvas<Window>,
    map: &TrackMap,
    resources: &ResourceCatalog,
) -> GameResult<()> {
    let tileset = if resources.has_image(&map.tileset) {
        Some(resources.image(&map.tileset)?)
    } else {
        None
    };
    let tileset_width = tileset.map(|t| t.query().width).unwrap_or(0);

    for row in 0..map.rows as i32 {
        for column in 0..map.columns as i32 {
            let Some(tile) = map.tile(column, row) else {
                continue;
            };
            let Some((sx, sy, sw, sh)) = map.tileset_source(tile, tileset_width) else {
                continue;
            };
            let dst = Rect::new(
                column * map.tile_width as i32,
                row * map.tile_height as i32,
                map.tile_width,
                map.tile_height,
            );
            match tileset {
                Some(texture) => canvas.copy(texture, Rect::new(sx, sy, sw, sh), dst)?,
                None => {
                    canvas.set_draw_color(GROUND_COLOR);
                    canvas.fill_rect(dst)?;
                }
            }
        }
    }
    Ok(())
}

fn draw_outlines(
    canvas: &mut Canvas<Window>,
    outlines: &[Outline],
    color: Color,
) -> GameResult<()> {
    canvas.set_draw_color(color);
    for outline in outlines {
        match outline {
            Outline::Circle { center, radius, angle } => {
                let points = circle_points(*center, *radius);
                draw_closed(canvas, &points)?;
                // spoke shows the rotation
                let spoke = (center.0 + radius * angle.cos(), center.1 + radius * angle.sin());
                canvas.draw_line(to_pixel(*center), to_pixel(spoke))?;
            }
            Outline::Capsule { a, b, radius } => {
                let (dx, dy) = (b.0 - a.0, b.1 - a.1);
                let length = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
                let (nx, ny) = (-dy / length * radius, dx / length * radius);
                canvas.draw_line(to_pixel((a.0 + nx, a.1 + ny)), to_pixel((b.0 + nx, b.1 + ny)))?;
                canvas.draw_line(to_pixel((a.0 - nx, a.1 - ny)), to_pixel((b.0 - nx, b.1 - ny)))?;
                draw_closed(canvas, &circle_points(*a, *radius))?;
                draw_closed(canvas, &circle_points(*b, *radius))?;
            }
            Outline::Polygon(points) => draw_closed(canvas, points)?,
        }
    }
    Ok(())
}

fn circle_points(center: (f32, f32), radius: f32) -> Vec<(f32, f32)> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = i as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            (center.0 + radius * theta.cos(), center.1 + radius * theta.sin())
        })
        .collect()
}

fn draw_closed(canvas: &mut Canvas<Window>, points: &[(f32, f32)]) -> GameResult<()> {
    for (i, point) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        canvas.draw_line(to_pixel(*point), to_pixel(next))?;
    }
    Ok(())
}

fn to_pixel(point: (f32, f32)) -> (i32, i32) {
    (point.0.round() as i32, point.1.round() as i32)
}
