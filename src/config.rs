//! Runtime options passed to the motion layer at startup.
//!
//! All fields are optional on the wire; anything missing takes its
//! default so older page markup keeps working.

#[cfg(any(feature = "web", feature = "toml"))]
use crate::error::{MotionError, MotionResult};

/// Default per-frame smoothing coefficient.
pub const DEFAULT_SMOOTHING: f64 = 0.1;

/// Default scroll distance before the navigation may hide.
pub const DEFAULT_NAV_THRESHOLD: f64 = 100.0;

/// Options for the virtual scroll engine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SmoothScrollOptions {
    /// Fraction of the remaining distance covered each frame, in (0, 1]
    pub smoothing: f64,
}

impl Default for SmoothScrollOptions {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl SmoothScrollOptions {
    /// The smoothing factor, falling back to the default when out of range.
    pub fn effective_smoothing(&self) -> f64 {
        if self.smoothing.is_finite() && self.smoothing > 0.0 {
            self.smoothing.min(1.0)
        } else {
            DEFAULT_SMOOTHING
        }
    }
}

/// Options for the navigation bar.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct NavigationOptions {
    /// Hide the bar while scrolling down
    pub hide_on_scroll: bool,
    /// Scroll offset below which the bar always shows
    pub threshold: f64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            hide_on_scroll: true,
            threshold: DEFAULT_NAV_THRESHOLD,
        }
    }
}

/// Top-level options recognised by the initialization entry point.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Options {
    pub disable_smooth_scroll: bool,
    pub smooth_scroll: SmoothScrollOptions,
    pub navigation: NavigationOptions,
}

impl Options {
    /// Parse options from a JSON object string.
    ///
    /// An empty string yields the defaults.
    #[cfg(feature = "web")]
    pub fn from_json_str(s: &str) -> MotionResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(s).map_err(|e| MotionError::Options(e.to_string()))
    }

    /// Parse options from a TOML string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> MotionResult<Self> {
        toml::from_str(s).map_err(|e| MotionError::Options(e.to_string()))
    }

    /// Whether the virtual scroll engine should be attempted at all.
    #[inline]
    pub fn smooth_scroll_enabled(&self) -> bool {
        !self.disable_smooth_scroll
    }
}
