//! Parsing of the class and data-attribute contract used to opt page
//! elements into effects.

use thiserror::Error;

use crate::loader::FrameSource;

/// Class names that select effects.
pub mod class {
    /// Headline split into lines that reveal on view
    pub const TITLE: &str = "title";
    /// Horizontally looping track
    pub const MARQUEE: &str = "marquee";
    /// Link with an underline hover animation
    pub const LINK: &str = "link";
    /// Generic fade-in on view
    pub const ANIMATE: &str = "animate";
    /// Site navigation bar
    pub const NAVIGATION: &str = "nav";
    /// Button toggling the navigation overlay
    pub const MENU_TOGGLE: &str = "menu-toggle";
    /// Navigation overlay panel
    pub const MENU: &str = "menu";
    /// One line inside a `.title`
    pub const TITLE_LINE: &str = "line";
    /// Underline inside a `.link`
    pub const LINK_LINE: &str = "link-line";
    /// Moving track inside a `.marquee`
    pub const MARQUEE_TRACK: &str = "marquee-track";
}

pub const PARALLAX: &str = "data-exo-parallax";
pub const BLOOM: &str = "data-exo-bloom";
pub const CANVAS: &str = "data-exo-canvas";
pub const FOLDER: &str = "data-exo-folder";
pub const PREFIX: &str = "data-exo-prefix";
pub const EXTENSION: &str = "data-exo-extension";
pub const FADE_IN: &str = "data-exo-fade-in";
pub const VIDEO: &str = "data-exo-video";

/// Parallax speed used when the attribute is present but empty.
pub const DEFAULT_PARALLAX_SPEED: f64 = 0.2;

/// Largest accepted absolute parallax speed.
pub const MAX_PARALLAX_SPEED: f64 = 5.0;

/// Longest accepted fade-in delay, in seconds.
pub const MAX_FADE_DELAY: f64 = 10.0;

/// Largest accepted frame count for a canvas sequence.
pub const MAX_FRAME_COUNT: usize = 10_000;

/// A malformed effect attribute.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("{attribute}: expected a number, got {value:?}")]
    InvalidNumber { attribute: &'static str, value: String },
    #[error("{attribute}: unknown value {value:?}")]
    UnknownVariant { attribute: &'static str, value: String },
    #[error("{attribute}: {value} is outside {min}..={max}")]
    OutOfRange {
        attribute: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{attribute} is required")]
    Missing { attribute: &'static str },
}

fn parse_number(attribute: &'static str, raw: &str) -> Result<f64, AttributeError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AttributeError::InvalidNumber {
            attribute,
            value: trimmed.to_string(),
        }),
    }
}

fn in_range(attribute: &'static str, value: f64, min: f64, max: f64) -> Result<f64, AttributeError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(AttributeError::OutOfRange {
            attribute,
            value,
            min,
            max,
        })
    }
}

/// Parse a `data-exo-parallax` speed. Empty means the default.
///
/// ```rust
/// use exo_motion::attributes::parse_parallax;
///
/// assert_eq!(parse_parallax("").unwrap(), 0.2);
/// assert_eq!(parse_parallax("-0.5").unwrap(), -0.5);
/// assert!(parse_parallax("fast").is_err());
/// ```
pub fn parse_parallax(raw: &str) -> Result<f64, AttributeError> {
    if raw.trim().is_empty() {
        return Ok(DEFAULT_PARALLAX_SPEED);
    }
    let speed = parse_number(PARALLAX, raw)?;
    in_range(PARALLAX, speed, -MAX_PARALLAX_SPEED, MAX_PARALLAX_SPEED)
}

/// How an image zoom is driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BloomMode {
    /// Scale up while hovered
    #[default]
    Hover,
    /// Scale down as the image scrolls through the viewport
    Scroll,
}

/// Parse a `data-exo-bloom` mode. Empty means hover.
pub fn parse_bloom(raw: &str) -> Result<BloomMode, AttributeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "hover" => Ok(BloomMode::Hover),
        "scroll" => Ok(BloomMode::Scroll),
        other => Err(AttributeError::UnknownVariant {
            attribute: BLOOM,
            value: other.to_string(),
        }),
    }
}

/// Parse a `data-exo-fade-in` delay in seconds. Empty means no delay.
pub fn parse_fade_in(raw: &str) -> Result<f64, AttributeError> {
    if raw.trim().is_empty() {
        return Ok(0.0);
    }
    let delay = parse_number(FADE_IN, raw)?;
    in_range(FADE_IN, delay, 0.0, MAX_FADE_DELAY)
}

/// Build a frame source from a canvas element's attributes.
///
/// `frame_count` comes from `data-exo-canvas` and `folder` from
/// `data-exo-folder`; prefix and extension fall back to defaults.
pub fn parse_canvas(
    frame_count: &str,
    folder: Option<&str>,
    prefix: Option<&str>,
    extension: Option<&str>,
) -> Result<FrameSource, AttributeError> {
    let count = parse_number(CANVAS, frame_count)?;
    if count.fract() != 0.0 {
        return Err(AttributeError::InvalidNumber {
            attribute: CANVAS,
            value: frame_count.trim().to_string(),
        });
    }
    let count = in_range(CANVAS, count, 1.0, MAX_FRAME_COUNT as f64)? as usize;

    let folder = folder
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(AttributeError::Missing { attribute: FOLDER })?;

    let mut source = FrameSource::new(folder, count);
    if let Some(prefix) = prefix {
        source = source.with_prefix(prefix.trim());
    }
    if let Some(extension) = extension.map(str::trim).filter(|e| !e.is_empty()) {
        source = source.with_extension(extension);
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallax() {
        assert_eq!(parse_parallax("  ").unwrap(), DEFAULT_PARALLAX_SPEED);
        assert_eq!(parse_parallax("1.5").unwrap(), 1.5);
        assert!(matches!(
            parse_parallax("12"),
            Err(AttributeError::OutOfRange { value, .. }) if value == 12.0
        ));
        assert!(matches!(parse_parallax("NaN"), Err(AttributeError::InvalidNumber { .. })));
    }

    #[test]
    fn test_bloom() {
        assert_eq!(parse_bloom("").unwrap(), BloomMode::Hover);
        assert_eq!(parse_bloom("Scroll").unwrap(), BloomMode::Scroll);
        let err = parse_bloom("spin").unwrap_err();
        assert_eq!(err.to_string(), "data-exo-bloom: unknown value \"spin\"");
    }

    #[test]
    fn test_fade_in() {
        assert_eq!(parse_fade_in("").unwrap(), 0.0);
        assert_eq!(parse_fade_in("0.3").unwrap(), 0.3);
        assert!(parse_fade_in("-1").is_err());
    }

    #[test]
    fn test_canvas() {
        let source = parse_canvas("150", Some("/seq/hero"), None, Some("webp")).unwrap();
        assert_eq!(source.frame_count, 150);
        assert_eq!(source.url(3), "/seq/hero/frame_0003.webp");

        let source = parse_canvas(" 12 ", Some("a"), Some("img"), Some("")).unwrap();
        assert_eq!(source.url(0), "a/img0000.jpg");
    }

    #[test]
    fn test_canvas_errors() {
        assert_eq!(
            parse_canvas("150", None, None, None),
            Err(AttributeError::Missing { attribute: FOLDER })
        );
        assert_eq!(
            parse_canvas("150", Some("  "), None, None),
            Err(AttributeError::Missing { attribute: FOLDER })
        );
        assert!(matches!(
            parse_canvas("0", Some("a"), None, None),
            Err(AttributeError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_canvas("2.5", Some("a"), None, None),
            Err(AttributeError::InvalidNumber { .. })
        ));
    }
}
