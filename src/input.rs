//! Mapping of raw wheel, touch, and keyboard input to scroll motion.

/// Distance moved by a single arrow key press, in CSS pixels.
pub const ARROW_STEP: f64 = 50.0;

/// Fraction of the viewport height moved by a page key.
pub const PAGE_FRACTION: f64 = 0.8;

/// Keys that move the virtual scroll position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollKey {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
}

/// How a key press changes the scroll target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyMotion {
    /// Move the target by a relative amount
    By(f64),
    /// Jump to the top of the document
    Top,
    /// Jump to the bottom of the document
    Bottom,
}

impl ScrollKey {
    /// Map a DOM `KeyboardEvent.key` value to a scroll key.
    ///
    /// Space pages down, Shift+Space pages up. Anything else is ignored.
    ///
    /// ```rust
    /// use exo_motion::ScrollKey;
    ///
    /// assert_eq!(ScrollKey::from_key("ArrowDown", false), Some(ScrollKey::ArrowDown));
    /// assert_eq!(ScrollKey::from_key(" ", true), Some(ScrollKey::PageUp));
    /// assert_eq!(ScrollKey::from_key("a", false), None);
    /// ```
    pub fn from_key(key: &str, shift: bool) -> Option<Self> {
        match key {
            "ArrowUp" | "Up" => Some(ScrollKey::ArrowUp),
            "ArrowDown" | "Down" => Some(ScrollKey::ArrowDown),
            "PageUp" => Some(ScrollKey::PageUp),
            "PageDown" => Some(ScrollKey::PageDown),
            " " | "Spacebar" if shift => Some(ScrollKey::PageUp),
            " " | "Spacebar" => Some(ScrollKey::PageDown),
            "Home" => Some(ScrollKey::Home),
            "End" => Some(ScrollKey::End),
            _ => None,
        }
    }

    /// Resolve the key into a motion for a viewport of the given height.
    pub fn motion(self, viewport_height: f64) -> KeyMotion {
        let page = viewport_height * PAGE_FRACTION;
        match self {
            ScrollKey::ArrowUp => KeyMotion::By(-ARROW_STEP),
            ScrollKey::ArrowDown => KeyMotion::By(ARROW_STEP),
            ScrollKey::PageUp => KeyMotion::By(-page),
            ScrollKey::PageDown => KeyMotion::By(page),
            ScrollKey::Home => KeyMotion::Top,
            ScrollKey::End => KeyMotion::Bottom,
        }
    }
}

/// Tracks the last touch position so drags become scroll deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct TouchTracker {
    last_y: Option<f64>,
}

impl TouchTracker {
    /// A tracker with no touch in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// A finger went down at `client_y`.
    pub fn begin(&mut self, client_y: f64) {
        self.last_y = Some(client_y);
    }

    /// The finger moved to `client_y`. Returns the scroll delta, positive
    /// when dragging upwards (content moves down the page).
    pub fn move_to(&mut self, client_y: f64) -> Option<f64> {
        let last = self.last_y.replace(client_y)?;
        Some(last - client_y)
    }

    /// The gesture ended.
    pub fn end(&mut self) {
        self.last_y = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(ScrollKey::from_key("ArrowUp", false), Some(ScrollKey::ArrowUp));
        assert_eq!(ScrollKey::from_key("PageDown", true), Some(ScrollKey::PageDown));
        assert_eq!(ScrollKey::from_key(" ", false), Some(ScrollKey::PageDown));
        assert_eq!(ScrollKey::from_key("Home", false), Some(ScrollKey::Home));
        assert_eq!(ScrollKey::from_key("End", false), Some(ScrollKey::End));
        assert_eq!(ScrollKey::from_key("Enter", false), None);
    }

    #[test]
    fn test_key_motion() {
        assert_eq!(ScrollKey::ArrowDown.motion(1000.0), KeyMotion::By(50.0));
        assert_eq!(ScrollKey::ArrowUp.motion(1000.0), KeyMotion::By(-50.0));
        assert_eq!(ScrollKey::PageDown.motion(1000.0), KeyMotion::By(800.0));
        assert_eq!(ScrollKey::PageUp.motion(1000.0), KeyMotion::By(-800.0));
        assert_eq!(ScrollKey::Home.motion(1000.0), KeyMotion::Top);
        assert_eq!(ScrollKey::End.motion(1000.0), KeyMotion::Bottom);
    }

    #[test]
    fn test_touch_tracker() {
        let mut touch = TouchTracker::new();
        assert_eq!(touch.move_to(100.0), None);

        touch.begin(500.0);
        assert_eq!(touch.move_to(450.0), Some(50.0));
        assert_eq!(touch.move_to(470.0), Some(-20.0));

        touch.end();
        assert_eq!(touch.move_to(300.0), None);
    }
}
