//! Track camera
//!
//! The camera is a viewport-sized window onto the full track image. It
//! follows a point and is clamped so it never shows past the track edges.

use sdl2::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    x: i32,
    y: i32,
    view_width: u32,
    view_height: u32,
    map_width: u32,
    map_height: u32,
}

impl Camera {
    pub fn new(view_width: u32, view_height: u32, map_width: u32, map_height: u32) -> Self {
        Camera {
            x: 0,
            y: 0,
            view_width,
            view_height,
            map_width,
            map_height,
        }
    }

    /// Center the view on `(x, y)` as far as the map allows
    ///
    /// On an axis where the map is smaller than the view, the map is
    /// centered instead.
    pub fn center_on(&mut self, x: f32, y: f32) {
        self.x = clamp_axis(x, self.view_width, self.map_width);
        self.y = clamp_axis(y, self.view_height, self.map_height);
    }

    /// Top-left corner of the view in map pixels
    pub fn offset(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Visible part of the map
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.view_width, self.view_height)
    }
}

fn clamp_axis(center: f32, view: u32, map: u32) -> i32 {
    if map <= view {
        return -((view - map) as i32 / 2);
    }
    let max = (map - view) as f32;
    // round to avoid subpixel seams between tiles
    (center - view as f32 / 2.0).clamp(0.0, max).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centers_inside_the_map() {
        let mut camera = Camera::new(640, 480, 2000, 1000);
        camera.center_on(1000.0, 500.0);
        assert_eq!(camera.offset(), (680, 260));
        assert_eq!(camera.rect(), Rect::new(680, 260, 640, 480));
    }

    #[test]
    fn test_clamps_at_edges() {
        let mut camera = Camera::new(640, 480, 2000, 1000);
        camera.center_on(10.0, 10.0);
        assert_eq!(camera.offset(), (0, 0));
        camera.center_on(1990.0, 990.0);
        assert_eq!(camera.offset(), (1360, 520));
    }

    #[test]
    fn test_small_map_is_centered() {
        let mut camera = Camera::new(640, 480, 320, 2000);
        camera.center_on(0.0, 1000.0);
        assert_eq!(camera.offset(), (-160, 760));
    }
}
