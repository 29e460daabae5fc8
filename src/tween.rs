//! Easing curves and single-value tweens.

use std::f64::consts::PI;

/// An easing curve mapping linear time `t` in [0, 1] to eased progress.
///
/// Power curves are numbered the way animation engines usually name them:
/// `power1` is quadratic, `power2` cubic, `power3` quartic, `power4` quintic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    PowerIn(u8),
    PowerOut(u8),
    PowerInOut(u8),
    ExpoOut,
    ExpoInOut,
    SineInOut,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::PowerOut(2)
    }
}

impl Easing {
    /// Parse an easing name such as `"power2.out"` or `"expo.inOut"`.
    ///
    /// A bare `"powerN"` means the `out` variant.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("none") || name.eq_ignore_ascii_case("linear") {
            return Some(Easing::Linear);
        }

        let (family, direction) = match name.split_once('.') {
            Some((family, direction)) => (family, direction),
            None => (name, "out"),
        };

        if let Some(level) = family.strip_prefix("power") {
            let level = level.parse::<u8>().ok().filter(|l| (1..=4).contains(l))?;
            return match direction {
                "in" => Some(Easing::PowerIn(level)),
                "out" => Some(Easing::PowerOut(level)),
                "inOut" => Some(Easing::PowerInOut(level)),
                _ => None,
            };
        }

        match (family, direction) {
            ("expo", "out") => Some(Easing::ExpoOut),
            ("expo", "inOut") => Some(Easing::ExpoInOut),
            ("sine", "inOut") => Some(Easing::SineInOut),
            _ => None,
        }
    }

    /// Parse an easing name, falling back to `power2.out` when unknown.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    /// Apply the curve. Input is clamped to [0, 1].
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::PowerIn(level) => t.powi(level as i32 + 1),
            Easing::PowerOut(level) => 1.0 - (1.0 - t).powi(level as i32 + 1),
            Easing::PowerInOut(level) => {
                let p = level as i32 + 1;
                if t < 0.5 {
                    2f64.powi(p - 1) * t.powi(p)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(p) / 2.0
                }
            }
            Easing::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Easing::ExpoInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
        }
    }
}

/// Whether a tween stops at its end value or starts over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    Once,
    Forever,
}

/// Interpolates one value from `from` to `to` over `duration` seconds.
///
/// The tween holds no clock; the owner feeds elapsed time through
/// [`Tween::advance`].
///
/// ```rust
/// use exo_motion::{Easing, Tween};
///
/// let mut tween = Tween::new(0.0, 100.0, 1.0, Easing::Linear);
/// assert_eq!(tween.advance(0.25), 25.0);
/// assert_eq!(tween.advance(1.0), 100.0);
/// assert!(tween.is_finished());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Delay before the tween starts, in seconds
    pub delay: f64,
    pub easing: Easing,
    pub repeat: Repeat,
    elapsed: f64,
}

impl Tween {
    /// Tween from `from` to `to` over `duration` seconds.
    pub fn new(from: f64, to: f64, duration: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            delay: 0.0,
            easing,
            repeat: Repeat::Once,
            elapsed: 0.0,
        }
    }

    /// Seconds to wait before the first run.
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Repeat mode after the first run.
    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Move time forward by `dt` seconds and return the new value.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        self.value()
    }

    /// Seconds since the tween was created, including the delay.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// True once the delay has passed.
    #[inline]
    pub fn has_started(&self) -> bool {
        self.elapsed >= self.delay
    }

    /// Linear progress in [0, 1] before easing.
    pub fn progress(&self) -> f64 {
        let local = self.elapsed - self.delay;
        if local <= 0.0 {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        match self.repeat {
            Repeat::Once => (local / self.duration).min(1.0),
            Repeat::Forever => (local % self.duration) / self.duration,
        }
    }

    /// Current eased value.
    pub fn value(&self) -> f64 {
        self.from + (self.to - self.from) * self.easing.apply(self.progress())
    }

    /// Repeating tweens never finish.
    pub fn is_finished(&self) -> bool {
        self.repeat == Repeat::Once && self.elapsed >= self.delay + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::PowerIn(2),
        Easing::PowerOut(1),
        Easing::PowerInOut(4),
        Easing::ExpoOut,
        Easing::ExpoInOut,
        Easing::SineInOut,
    ];

    #[test]
    fn test_easing_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-9, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-3, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_easing_clamps_input() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
        assert_eq!(Easing::Linear.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_in_out_symmetry() {
        for easing in [Easing::PowerInOut(2), Easing::ExpoInOut, Easing::SineInOut] {
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-9, "{easing:?}");
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Easing::parse("none"), Some(Easing::Linear));
        assert_eq!(Easing::parse("power2.out"), Some(Easing::PowerOut(2)));
        assert_eq!(Easing::parse("power4.inOut"), Some(Easing::PowerInOut(4)));
        assert_eq!(Easing::parse("power3"), Some(Easing::PowerOut(3)));
        assert_eq!(Easing::parse("expo.inOut"), Some(Easing::ExpoInOut));
        assert_eq!(Easing::parse("power9.out"), None);
        assert_eq!(Easing::parse("bounce.out"), None);
        assert_eq!(Easing::from_name("bounce.out"), Easing::PowerOut(2));
    }

    #[test]
    fn test_delay() {
        let mut tween = Tween::new(10.0, 20.0, 1.0, Easing::Linear).with_delay(0.5);
        assert_eq!(tween.advance(0.25), 10.0);
        assert!(!tween.has_started());
        assert_eq!(tween.advance(0.75), 15.0);
        assert!(tween.has_started());
        assert!(!tween.is_finished());
        tween.advance(0.5);
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 20.0);
    }

    #[test]
    fn test_repeat_forever_wraps() {
        let mut tween = Tween::new(0.0, -50.0, 2.0, Easing::Linear).with_repeat(Repeat::Forever);
        assert_eq!(tween.advance(1.0), -25.0);
        assert_eq!(tween.advance(2.0), -25.0);
        tween.advance(100.0);
        assert!(!tween.is_finished());
    }

    #[test]
    fn test_zero_duration_jumps() {
        let mut tween = Tween::new(0.0, 1.0, 0.0, Easing::ExpoOut);
        assert_eq!(tween.advance(0.016), 1.0);
        assert!(tween.is_finished());
    }
}
