use crate::math::ScreenPoint;

pub const DEFAULT_SMOOTHING: f32 = 0.6;

/// One step of per-tick exponential smoothing: `current + (target - current) * factor`.
///
/// Not normalised by elapsed time; irregular tick arrival changes apparent speed.
pub fn step(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Position smoothing applied to agents that were already on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolator {
    factor: f32,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

impl Interpolator {
    /// `factor` must be in `(0, 1]`, which keeps every step between current and target.
    pub fn new(factor: f32) -> Self {
        assert!(factor > 0.0 && factor <= 1.0, "smoothing factor must be in (0, 1]");
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn step(&self, current: ScreenPoint, target: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(
            step(current.x, target.x, self.factor),
            step(current.y, target.y, self.factor),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_a_fixed_share_of_the_gap() {
        assert!((step(0.0, 10.0, 0.6) - 6.0).abs() < 1e-5);
        assert_eq!(step(10.0, 0.0, 1.0), 0.0);

        let interpolator = Interpolator::default();
        let next = interpolator.step(ScreenPoint::new(50.0, 50.0), ScreenPoint::new(100.0, 0.0));
        assert!((next.x - 80.0).abs() < 1e-4);
        assert!((next.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn repeated_steps_converge_without_overshoot() {
        let interpolator = Interpolator::new(0.6);
        let target = ScreenPoint::new(200.0, 120.0);
        let mut current = ScreenPoint::ZERO;
        for _ in 0..30 {
            let next = interpolator.step(current, target);
            assert!(next.x <= target.x && next.x >= current.x);
            current = next;
        }
        assert!((current.x - target.x).abs() < 1e-3);
        assert!((current.y - target.y).abs() < 1e-3);
    }
}
