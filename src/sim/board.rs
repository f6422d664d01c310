//! Board generation
//!
//! The board is a stack of full-canvas pattern layers, each rotated about
//! the canvas center. A square "missing piece" is cut out of it; every layer
//! shows through that window, so the whole stack is the target content the
//! correct option has to reproduce.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyProfile;
use super::pattern::{Pattern, PatternFactory};
use crate::consts::*;

/// Axis-aligned rectangle of the missing piece, in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieceRect {
    /// Top-left corner
    pub origin: Vec2,
    pub width: f32,
    pub height: f32,
}

impl PieceRect {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            width: PIECE_SIZE,
            height: PIECE_SIZE,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.origin.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.origin.y
    }

    /// True if the whole rectangle lies inside a square canvas of `side`
    pub fn fits_within(&self, side: f32) -> bool {
        self.origin.x >= 0.0
            && self.origin.y >= 0.0
            && self.origin.x + self.width <= side
            && self.origin.y + self.height <= side
    }
}

/// A generated board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Pattern layers, bottom first
    pub tiles: Vec<Pattern>,
    pub missing: PieceRect,
    /// Canvas side length
    pub size: f32,
}

impl Board {
    /// Layers visible under the missing piece
    pub fn target_patterns(&self) -> &[Pattern] {
        &self.tiles
    }
}

pub struct BoardGenerator;

impl BoardGenerator {
    /// Fill a board with `num_shapes` tiles and place the missing piece
    pub fn generate<R: Rng + ?Sized>(profile: &DifficultyProfile, rng: &mut R) -> Board {
        let tiles = (0..profile.num_shapes)
            .map(|_| PatternFactory::generate(profile, rng))
            .collect();

        // Integer origin so the piece snaps to whole canvas units
        let max_origin = (BOARD_SIZE - PIECE_SIZE) as u32;
        let x = rng.random_range(0..=max_origin) as f32;
        let y = rng.random_range(0..=max_origin) as f32;

        Board {
            tiles,
            missing: PieceRect::new(x, y),
            size: BOARD_SIZE,
        }
    }
}
