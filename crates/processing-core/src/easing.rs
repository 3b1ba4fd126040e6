//! Easing curves for camera transitions.
//!
//! Transitions use the CSS cubic-Bézier timing functions. A Bézier easing
//! curve is parametric, `(x(s), y(s))` with endpoints `(0, 0)` and `(1, 1)`,
//! so evaluating it at a progress `t` means first finding the parameter `s`
//! with `x(s) == t`. `x(s)` is monotonic for every control-point pair used
//! here, which makes a fixed-iteration bisection sufficient.

use beatcam_script_model::beat::Transition;

/// Bisection steps used to invert `x(s)`; 2^-16 is far below one pixel of
/// camera movement.
pub const SOLVER_ITERATIONS: usize = 16;

/// A cubic-Bézier timing curve with implicit endpoints `(0,0)` and `(1,1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p1x: f64,
    pub p1y: f64,
    pub p2x: f64,
    pub p2y: f64,
}

impl CubicBezier {
    pub const LINEAR: CubicBezier = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
    pub const EASE: CubicBezier = CubicBezier::new(0.25, 0.1, 0.25, 1.0);
    pub const EASE_IN: CubicBezier = CubicBezier::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: CubicBezier = CubicBezier::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: CubicBezier = CubicBezier::new(0.42, 0.0, 0.58, 1.0);

    pub const fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        Self { p1x, p1y, p2x, p2y }
    }

    /// Curve for a named transition; `None` for cuts, holds, and unknown names.
    pub fn for_transition(transition: &Transition) -> Option<CubicBezier> {
        match transition {
            Transition::Linear => Some(Self::LINEAR),
            Transition::Ease => Some(Self::EASE),
            Transition::EaseIn => Some(Self::EASE_IN),
            Transition::EaseOut => Some(Self::EASE_OUT),
            Transition::EaseInOut => Some(Self::EASE_IN_OUT),
            Transition::Cut | Transition::Hold | Transition::Unknown(_) => None,
        }
    }

    /// Eased output for progress `t` (expected in `[0, 1]`).
    pub fn solve(&self, t: f64) -> f64 {
        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..SOLVER_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if self.x_at(mid) < t {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.y_at((lo + hi) / 2.0)
    }

    fn x_at(&self, s: f64) -> f64 {
        bezier_component(s, self.p1x, self.p2x)
    }

    fn y_at(&self, s: f64) -> f64 {
        bezier_component(s, self.p1y, self.p2y)
    }
}

fn bezier_component(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * p1 * s * inv * inv + 3.0 * p2 * s * s * inv + s * s * s
}

/// Evaluate a transition's easing at progress `t`.
///
/// `t` is clamped to `[0, 1]`. Cuts, holds, and unrecognized transitions
/// return `1.0` (snap to target). Curve endpoints are exact: `ease(0) == 0`
/// and `ease(1) == 1`.
pub fn ease(t: f64, transition: &Transition) -> f64 {
    let Some(curve) = CubicBezier::for_transition(transition) else {
        return 1.0;
    };

    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        curve.solve(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [Transition; 5] = [
        Transition::Linear,
        Transition::Ease,
        Transition::EaseIn,
        Transition::EaseOut,
        Transition::EaseInOut,
    ];

    #[test]
    fn test_endpoints_are_exact() {
        for transition in &CURVES {
            assert_eq!(ease(0.0, transition), 0.0, "{transition}");
            assert_eq!(ease(1.0, transition), 1.0, "{transition}");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        for transition in &CURVES {
            assert_eq!(ease(-0.5, transition), 0.0);
            assert_eq!(ease(3.0, transition), 1.0);
            assert_eq!(ease(f64::NAN, transition), 0.0);
        }
    }

    #[test]
    fn test_snap_transitions_return_one() {
        let unknown = Transition::from("spring");
        for t in [0.0, 0.001, 0.25, 0.5, 0.99, 1.0] {
            assert_eq!(ease(t, &Transition::Cut), 1.0);
            assert_eq!(ease(t, &Transition::Hold), 1.0);
            assert_eq!(ease(t, &unknown), 1.0);
        }
    }

    #[test]
    fn test_linear_is_identity_within_solver_precision() {
        for i in 1..20 {
            let t = i as f64 / 20.0;
            let y = ease(t, &Transition::Linear);
            assert!((y - t).abs() < 1e-4, "t={t} y={y}");
        }
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        for i in 1..10 {
            let t = i as f64 / 20.0;
            let a = ease(t, &Transition::EaseInOut);
            let b = ease(1.0 - t, &Transition::EaseInOut);
            assert!((a + b - 1.0).abs() < 1e-3, "t={t}");
        }
        assert!((ease(0.5, &Transition::EaseInOut) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_curve_shapes() {
        // ease-in starts slow, ease-out starts fast.
        assert!(ease(0.25, &Transition::EaseIn) < 0.25);
        assert!(ease(0.25, &Transition::EaseOut) > 0.25);
        // CSS `ease` is front-loaded: ~0.8 at the halfway point.
        let mid = ease(0.5, &Transition::Ease);
        assert!((mid - 0.8024).abs() < 5e-3, "ease(0.5)={mid}");
    }

    #[test]
    fn test_curves_are_monotonic() {
        for transition in &CURVES {
            let mut prev = 0.0;
            for i in 0..=100 {
                let y = ease(i as f64 / 100.0, transition);
                assert!(y + 1e-9 >= prev, "{transition} not monotonic at {i}");
                assert!((0.0..=1.0).contains(&y));
                prev = y;
            }
        }
    }
}
