//! Track files
//!
//! A track is a JSON file holding one row-major tile layer, the tileset and
//! thumbnail image keys, and the kart start position.

use crate::error::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tile index meaning "no tile here"
pub const EMPTY_TILE: u32 = 0;

/// A race track: one tile layer plus the metadata the menus show
///
/// Tiles are stored row-major. `0` is empty; `n >= 1` draws frame `n - 1`
/// of the tileset image and is solid ground for the physics world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMap {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Image key of the menu thumbnail
    pub thumbnail: String,
    /// Image key of the tileset
    pub tileset: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub tiles: Vec<u32>,
    /// Kart start position in pixels
    pub start: [f32; 2],
}

/// A horizontal run of solid tiles in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidRun {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TrackMap {
    pub fn load_from_file(path: &Path) -> GameResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map: TrackMap = serde_json::from_str(&content).map_err(|source| GameError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        map.validate().map_err(|reason| GameError::InvalidTrack {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(map)
    }

    fn validate(&self) -> Result<(), String> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err("tile size must be non-zero".to_string());
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(format!("grid {}x{} is empty", self.columns, self.rows));
        }
        let fits = |count: u32, size: u32| {
            count
                .checked_mul(size)
                .is_some_and(|extent| extent <= i32::MAX as u32)
        };
        if !fits(self.columns, self.tile_width) || !fits(self.rows, self.tile_height) {
            return Err(format!(
                "{}x{} tiles of {}x{} is too large",
                self.columns, self.rows, self.tile_width, self.tile_height
            ));
        }
        let expected = self.columns as usize * self.rows as usize;
        if self.tiles.len() != expected {
            return Err(format!(
                "expected {} tiles for {}x{}, found {}",
                expected,
                self.columns,
                self.rows,
                self.tiles.len()
            ));
        }
        Ok(())
    }

    /// Tile at grid position, `None` outside the map
    pub fn tile(&self, column: i32, row: i32) -> Option<u32> {
        if column < 0 || row < 0 || column >= self.columns as i32 || row >= self.rows as i32 {
            return None;
        }
        Some(self.tiles[row as usize * self.columns as usize + column as usize])
    }

    /// Full map size in pixels, saturating for maps that were never validated
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.columns.saturating_mul(self.tile_width),
            self.rows.saturating_mul(self.tile_height),
        )
    }

    /// Lines of the description, split on `|`
    pub fn description_lines(&self) -> impl Iterator<Item = &str> {
        self.description
            .split('|')
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    /// Solid tiles merged into maximal horizontal runs, one per collider
    pub fn solid_runs(&self) -> Vec<SolidRun> {
        let mut runs = Vec::new();
        let tw = self.tile_width as f32;
        let th = self.tile_height as f32;

        for row in 0..self.rows as i32 {
            let mut run_start: Option<i32> = None;
            for column in 0..=self.columns as i32 {
                let solid = matches!(self.tile(column, row), Some(t) if t != EMPTY_TILE);
                match (solid, run_start) {
                    (true, None) => run_start = Some(column),
                    (false, Some(start)) => {
                        runs.push(SolidRun {
                            x: start as f32 * tw,
                            y: row as f32 * th,
                            width: (column - start) as f32 * tw,
                            height: th,
                        });
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }

        runs
    }

    /// Source rectangle of `tile` inside a tileset `tileset_width` pixels wide
    ///
    /// Returns `(x, y, w, h)`, or `None` for the empty tile.
    pub fn tileset_source(&self, tile: u32, tileset_width: u32) -> Option<(i32, i32, u32, u32)> {
        if tile == EMPTY_TILE {
            return None;
        }
        let per_row = (tileset_width / self.tile_width).max(1);
        let frame = tile - 1;
        Some((
            ((frame % per_row) * self.tile_width) as i32,
            ((frame / per_row) * self.tile_height) as i32,
            self.tile_width,
            self.tile_height,
        ))
    }
}
