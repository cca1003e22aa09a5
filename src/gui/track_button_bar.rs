//! Track carousel
//!
//! A vertical strip of track thumbnails. The selected track sits in the
//! middle of the strip, the previous one above it and the next one below.
//! Every other thumbnail is parked off screen. Moving past either end does
//! nothing; the selection never wraps.

use crate::error::GameResult;
use crate::resources::ResourceCatalog;
use crate::text::draw_text_centered;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::{Point, Rect};
use sdl2::render::Canvas;
use sdl2::video::Window;

/// Vertical distance between neighbouring thumbnails
pub const NEIGHBOUR_OFFSET: i32 = 164;

/// Where hidden thumbnails are parked
const HIDDEN_POS: (i32, i32) = (-128, -128);

/// Thumbnail size when the image is missing
pub const DEFAULT_THUMB_SIZE: (u32, u32) = (128, 128);

/// What the menus show about a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub key: String,
    pub name: String,
    /// Description already split into display lines
    pub description: Vec<String>,
    pub thumbnail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackButton {
    pub info: TrackInfo,
    pub rect: Rect,
    pub visible: bool,
    pub hovered: bool,
}

pub struct TrackButtonBar {
    rect: Rect,
    buttons: Vec<TrackButton>,
    selected_index: usize,
}

impl TrackButtonBar {
    /// Lay out one thumbnail of `thumb_size` per track inside `rect`
    pub fn new(rect: Rect, tracks: Vec<TrackInfo>, thumb_size: (u32, u32)) -> Self {
        let buttons = tracks
            .into_iter()
            .map(|info| TrackButton {
                info,
                rect: Rect::new(HIDDEN_POS.0, HIDDEN_POS.1, thumb_size.0, thumb_size.1),
                visible: false,
                hovered: false,
            })
            .collect();

        let mut bar = TrackButtonBar {
            rect,
            buttons,
            selected_index: 0,
        };
        bar.layout();
        bar
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&TrackInfo> {
        self.buttons.get(self.selected_index).map(|b| &b.info)
    }

    pub fn buttons(&self) -> &[TrackButton] {
        &self.buttons
    }

    /// Move the selection for an arrow key
    ///
    /// Returns true for the four arrow keys, even when the selection was
    /// already at the end and did not move.
    pub fn navigate(&mut self, key: Keycode) -> bool {
        let step: i64 = match key {
            Keycode::Left | Keycode::Up => -1,
            Keycode::Right | Keycode::Down => 1,
            _ => return false,
        };
        self.select(self.selected_index as i64 + step);
        true
    }

    /// Select `index`, clamped to the available tracks
    pub fn select(&mut self, index: i64) {
        if self.buttons.is_empty() {
            self.selected_index = 0;
            return;
        }
        let last = self.buttons.len() as i64 - 1;
        self.selected_index = index.clamp(0, last) as usize;
        self.layout();
    }

    /// Index of the visible thumbnail under `pos`
    pub fn button_at(&self, pos: (i32, i32)) -> Option<usize> {
        self.buttons
            .iter()
            .position(|b| b.visible && b.rect.contains_point(Point::from(pos)))
    }

    pub fn hover(&mut self, pos: (i32, i32)) {
        for button in &mut self.buttons {
            button.hovered = button.visible && button.rect.contains_point(Point::from(pos));
        }
    }

    fn layout(&mut self) {
        for button in &mut self.buttons {
            button.visible = false;
            button.rect.reposition(HIDDEN_POS);
        }

        let index = self.selected_index;
        let center = self.rect.center();

        if let Some(button) = self.buttons.get_mut(index) {
            button.rect.center_on(center);
            button.rect.offset(4, 0);
            button.visible = true;
        }

        if index > 0 {
            let button = &mut self.buttons[index - 1];
            button.rect.center_on(center);
            button.rect.offset(-4, -NEIGHBOUR_OFFSET);
            button.visible = true;
        }

        if let Some(button) = self.buttons.get_mut(index + 1) {
            button.rect.center_on(center);
            button.rect.offset(-4, NEIGHBOUR_OFFSET);
            button.visible = true;
        }
    }

    pub fn render(
        &self,
        canvas: &mut Canvas<Window>,
        resources: &ResourceCatalog,
    ) -> GameResult<()> {
        for button in self.buttons.iter().filter(|b| b.visible) {
            if resources.has_image(&button.info.thumbnail) {
                canvas.copy(resources.image(&button.info.thumbnail)?, None, button.rect)?;
            } else {
                canvas.set_draw_color(Color::RGB(40, 40, 60));
                canvas.fill_rect(button.rect)?;
            }

            canvas.set_draw_color(Color::RGB(0, 0, 0));
            canvas.draw_rect(button.rect)?;

            if button.hovered {
                let mut highlight = button.rect;
                highlight.resize(
                    button.rect.width().saturating_sub(24),
                    button.rect.height().saturating_sub(24),
                );
                highlight.center_on(button.rect.center());
                canvas.set_draw_color(Color::RGB(0, 0, 255));
                for inset in 0..4 {
                    let mut ring = highlight;
                    ring.resize(
                        highlight.width().saturating_sub(inset * 2),
                        highlight.height().saturating_sub(inset * 2),
                    );
                    ring.center_on(highlight.center());
                    canvas.draw_rect(ring)?;
                }
            }

            let white = Color::RGB(255, 255, 255);
            draw_text_centered(canvas, &button.info.name, button.rect, white, 2)?;
        }
        Ok(())
    }
}
