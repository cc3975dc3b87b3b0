use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::foundation::core::{Rect, Vec2};
use crate::foundation::math::lerp;
use crate::scene::placement::CoverPlacement;

/// Zoom reached on the last frame when Ken Burns motion is enabled.
pub const MAX_ZOOM: f64 = 1.08;
/// Fraction of the zoom margin used for panning.
pub const PAN_EXTENT: f64 = 0.8;

/// One of the four axis-aligned Ken Burns pan directions, fixed for a whole clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum KenBurnsPath {
    /// Pan from `(-1, 0)` to `(1, 0)`.
    LeftToRight,
    /// Pan from `(1, 0)` to `(-1, 0)`.
    RightToLeft,
    /// Pan from `(0, -1)` to `(0, 1)`.
    TopToBottom,
    /// Pan from `(0, 1)` to `(0, -1)`.
    BottomToTop,
}

impl KenBurnsPath {
    /// All paths, in a stable order.
    pub const ALL: [KenBurnsPath; 4] = [
        Self::LeftToRight,
        Self::RightToLeft,
        Self::TopToBottom,
        Self::BottomToTop,
    ];

    /// Uniformly random path.
    pub fn pick(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Unit start vector.
    pub fn start(self) -> Vec2 {
        match self {
            Self::LeftToRight => Vec2::new(-1.0, 0.0),
            Self::RightToLeft => Vec2::new(1.0, 0.0),
            Self::TopToBottom => Vec2::new(0.0, -1.0),
            Self::BottomToTop => Vec2::new(0.0, 1.0),
        }
    }

    /// Unit end vector.
    pub fn end(self) -> Vec2 {
        -self.start()
    }
}

/// Camera state for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMotion {
    /// Scale applied around the placement center (1.0 = none).
    pub zoom: f64,
    /// Offset in pixels applied after zooming.
    pub pan: Vec2,
}

impl CameraMotion {
    /// No zoom, no pan.
    pub const STILL: CameraMotion = CameraMotion {
        zoom: 1.0,
        pan: Vec2::ZERO,
    };

    /// Camera for `path` at eased progress `t` (0 = first frame, 1 = last frame).
    pub fn ken_burns(path: KenBurnsPath, placement: &CoverPlacement, t: f64) -> Self {
        let zoom = lerp(1.0, MAX_ZOOM, t);
        let max_offset_x = (placement.draw_width * zoom - placement.draw_width) / 2.0;
        let max_offset_y = (placement.draw_height * zoom - placement.draw_height) / 2.0;
        let (start, end) = (path.start(), path.end());
        let pan = Vec2::new(
            lerp(start.x, end.x, t) * max_offset_x * PAN_EXTENT,
            lerp(start.y, end.y, t) * max_offset_y * PAN_EXTENT,
        );
        Self { zoom, pan }
    }

    /// The placement rectangle after zooming around its center and panning.
    pub fn apply(&self, placement: &CoverPlacement) -> Rect {
        let w = placement.draw_width * self.zoom;
        let h = placement.draw_height * self.zoom;
        let x = placement.draw_x - (w - placement.draw_width) / 2.0 + self.pan.x;
        let y = placement.draw_y - (h - placement.draw_height) / 2.0 + self.pan.y;
        Rect::new(x, y, x + w, y + h)
    }
}

/// Random source for per-compile motion: seeded when `seed` is set, OS entropy otherwise.
pub fn motion_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/motion.rs"]
mod tests;
