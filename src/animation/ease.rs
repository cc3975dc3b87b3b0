/// Time remapping curves for camera motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Constant velocity.
    Linear,
    /// Half-cosine ease-in-out: slow start, slow finish.
    #[default]
    InOutSine,
}

impl Ease {
    /// Map `t` (clamped to `[0, 1]`) through the curve. Endpoints are fixed at 0 and 1.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InOutSine => 0.5 - 0.5 * (std::f64::consts::PI * t).cos(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
