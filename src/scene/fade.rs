//! Fade-out transition shared by the menu scenes
//!
//! A black curtain grows down the screen by [`FADE_STEP`] percent per frame.
//! When it covers the screen the owning scene publishes its scene switch,
//! exactly once.

/// Progress added per frame, in percent
pub const FADE_STEP: i32 = 10;

const INACTIVE: i32 = -1;

/// What a call to [`FadeState::advance`] means for the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStep {
    /// No fade started
    Idle,
    /// Still covering; `progress` is in `0..100`
    Fading { progress: i32 },
    /// The screen just became covered. Returned once per fade.
    Complete,
    /// Already completed
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeState {
    progress: i32,
    finished: bool,
}

impl Default for FadeState {
    fn default() -> Self {
        FadeState {
            progress: INACTIVE,
            finished: false,
        }
    }
}

impl FadeState {
    /// Back to inactive; called from both setup and teardown
    pub fn reset(&mut self) {
        *self = FadeState::default();
    }

    /// Begin fading. A fade already running is not restarted.
    pub fn start(&mut self) {
        if self.progress < 0 {
            self.progress = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.progress >= 0
    }

    pub fn progress(&self) -> i32 {
        self.progress
    }

    pub fn advance(&mut self) -> FadeStep {
        if self.finished {
            return FadeStep::Done;
        }
        if self.progress < 0 {
            return FadeStep::Idle;
        }

        self.progress += FADE_STEP;
        if self.progress >= 100 {
            self.finished = true;
            FadeStep::Complete
        } else {
            FadeStep::Fading {
                progress: self.progress,
            }
        }
    }

    /// Height of the curtain on a screen `screen_height` pixels tall
    pub fn cover_height(&self, screen_height: u32) -> u32 {
        let progress = self.progress.clamp(0, 100) as u64;
        (screen_height as u64 * progress / 100) as u32
    }
}
