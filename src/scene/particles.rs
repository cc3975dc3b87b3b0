use rand::Rng;

use crate::foundation::core::{Canvas, Point};
use crate::foundation::math::wrap;

/// Minimum particle count regardless of frame size.
pub const MIN_PARTICLES: usize = 24;
/// One particle per this many pixels of frame area.
pub const PIXELS_PER_PARTICLE: u64 = 30_000;

const SWAY_FREQUENCY: f64 = 0.35;
const SWAY_SCALE: f64 = 26.0;

/// One ambient dust particle.
///
/// Motion is analytic: the position at any time is a pure function of these fields, so frames can
/// be rendered in any order.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Particle {
    /// Initial x in output pixels.
    pub x: f64,
    /// Initial y in output pixels.
    pub y: f64,
    /// Radius in pixels (0.8 to 3.0).
    pub radius: f64,
    /// Upward drift in pixels per second (8 to 26).
    pub speed: f64,
    /// Constant opacity (0.03 to 0.12).
    pub alpha: f64,
    /// Horizontal sway amplitude factor.
    pub drift: f64,
    /// Sway phase in radians.
    pub phase: f64,
}

impl Particle {
    /// Position at `time_secs`, wrapped into the canvas.
    pub fn position_at(&self, time_secs: f64, canvas: Canvas) -> Point {
        let sway = (time_secs * SWAY_FREQUENCY + self.phase).sin() * self.drift * SWAY_SCALE;
        Point::new(
            wrap(self.x + sway, f64::from(canvas.width)),
            wrap(self.y - time_secs * self.speed, f64::from(canvas.height)),
        )
    }
}

/// Particle count for a canvas: `max(24, width * height / 30000)`.
pub fn particle_count(canvas: Canvas) -> usize {
    let scaled = usize::try_from(canvas.area() / PIXELS_PER_PARTICLE).unwrap_or(usize::MAX);
    scaled.max(MIN_PARTICLES)
}

/// Generate the particle field for one compile.
pub fn create_particles(canvas: Canvas, rng: &mut impl Rng) -> Vec<Particle> {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    if canvas.area() == 0 {
        return Vec::new();
    }
    (0..particle_count(canvas))
        .map(|_| Particle {
            x: rng.random_range(0.0..w),
            y: rng.random_range(0.0..h),
            radius: rng.random_range(0.8..=3.0),
            speed: rng.random_range(8.0..=26.0),
            alpha: rng.random_range(0.03..=0.12),
            drift: rng.random_range(0.3..=1.0),
            phase: rng.random_range(0.0..std::f64::consts::TAU),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/scene/particles.rs"]
mod tests;
