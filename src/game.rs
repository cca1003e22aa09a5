//! Frame loop
//!
//! One frame: drain SDL2 input onto the bus, apply any scene switch the
//! input asked for, wait out the frame budget, update the active scene and
//! present.

use crate::error::GameResult;
use crate::input_system::InputSystem;
use crate::scene::{GameScene, SceneContext, SceneDirector};
use sdl2::EventPump;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Longest frame time handed to a scene, in seconds
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// How often the measured frame rate is logged
const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(3);

/// Caps the frame rate and measures frame times
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    report_start: Instant,
    frames: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        FrameClock {
            last_tick: now,
            report_start: now,
            frames: 0,
        }
    }

    /// Sleep out the rest of the frame and return the frame time in seconds
    ///
    /// The result is clamped to [`MAX_FRAME_DELTA`] so a stall does not
    /// hand a huge step to the scene.
    pub fn tick(&mut self, target_fps: f32) -> f32 {
        if target_fps > 0.0 {
            let budget = Duration::from_secs_f32(1.0 / target_fps);
            let spent = self.last_tick.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }

        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.frames += 1;

        let since_report = now.duration_since(self.report_start);
        if since_report >= FPS_REPORT_INTERVAL {
            let fps = self.frames as f32 / since_report.as_secs_f32();
            debug!("Frame rate: {:.1} fps", fps);
            self.frames = 0;
            self.report_start = now;
        }

        delta.min(MAX_FRAME_DELTA)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Run frames until the window is closed
pub fn run<'a>(
    director: &mut SceneDirector<GameScene<'a>>,
    ctx: &mut SceneContext<'a>,
    event_pump: &mut EventPump,
) -> GameResult<()> {
    let input = InputSystem::new();
    let mut clock = FrameClock::new();

    director.start(ctx)?;

    loop {
        let frame = input.poll_events(event_pump);
        for event in frame.events {
            ctx.bus.publish(event);
        }
        if frame.quit {
            info!("Quit requested");
            return Ok(());
        }
        director.apply_pending(ctx)?;

        let delta = clock.tick(ctx.config.target_fps);
        director.update(ctx, delta)?;
        ctx.canvas.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_waits_for_frame_budget() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick(50.0);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_tick_clamps_long_frames() {
        let mut clock = FrameClock::new();
        clock.last_tick = Instant::now() - Duration::from_secs(2);
        assert_eq!(clock.tick(1000.0), MAX_FRAME_DELTA);
    }
}
