//! Sine-wave "breathing" brightness curve.

/// Breathing speed used while in range.
pub const SLOW_BREATH: f64 = 2.0;

/// Breathing speed used while critically high.
pub const FAST_BREATH: f64 = 8.0;

/// Duty cycle (0..=100) of a breathing light at time `now_secs`.
///
/// `brightness(t, s) = (sin(t * s) + 1) / 2 * 100`, so the curve is periodic
/// with period `2π / s` and passes through 50 at `t = 0`. Non-finite phases
/// fall back to the midpoint so the result always stays in range.
pub fn brightness(now_secs: f64, speed: f64) -> f64 {
    let phase = now_secs * speed;
    if !phase.is_finite() {
        return 50.0;
    }
    ((phase.sin() + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0)
}
