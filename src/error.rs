//! Error types shared across the crate.

use thiserror::Error;

use crate::attributes::AttributeError;

/// Errors raised while setting up or driving motion effects.
#[derive(Debug, Error)]
pub enum MotionError {
    /// The animation capability was not available at startup.
    #[error("animation engine unavailable; motion effects disabled")]
    MissingAnimator,
    /// A frame sequence was configured with zero frames.
    #[error("frame sequence must contain at least one frame")]
    EmptySequence,
    /// A frame index outside the sequence was reported.
    #[error("frame index {index} out of range for {count} frames")]
    FrameOutOfRange { index: usize, count: usize },
    /// An element carried a malformed data attribute.
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    /// Options could not be decoded.
    #[error("invalid options: {0}")]
    Options(String),
}

/// Result alias used by fallible operations in this crate.
pub type MotionResult<T> = Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{parse_canvas, FOLDER};

    fn canvas_source(folder: Option<&str>) -> MotionResult<usize> {
        Ok(parse_canvas("150", folder, None, None)?.frame_count)
    }

    #[test]
    fn test_attribute_errors_convert() {
        let err = canvas_source(None).unwrap_err();
        assert!(matches!(err, MotionError::Attribute(AttributeError::Missing { attribute: FOLDER })));
        assert_eq!(err.to_string(), "data-exo-folder is required");
        assert_eq!(canvas_source(Some("frames")).unwrap(), 150);
    }
}
