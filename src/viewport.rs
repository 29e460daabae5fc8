//! Viewport measurements and device classification.

/// Widths at or below this many CSS pixels are treated as mobile.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// Fraction of the viewport height an element's top must rise above
/// before it counts as "in view".
pub const VIEW_TRIGGER_FRACTION: f64 = 0.85;

/// Size and capabilities of the visible browser area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: f64,
    /// Height in CSS pixels
    pub height: f64,
    /// Physical pixels per CSS pixel
    pub device_pixel_ratio: f64,
    /// Whether the device reports touch input
    pub touch: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl Viewport {
    /// Create a non-touch viewport with a pixel ratio of 1.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            device_pixel_ratio: 1.0,
            touch: false,
        }
    }

    /// Set the device pixel ratio. Non-positive or non-finite values become 1.
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
        self
    }

    /// Mark the viewport as touch capable.
    pub fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    /// Touch devices and narrow screens keep native scrolling.
    #[inline]
    pub fn is_mobile(&self) -> bool {
        self.touch || self.width <= MOBILE_BREAKPOINT
    }

    /// Total scrollable distance for a document of the given height.
    #[inline]
    pub fn max_scroll(&self, document_height: f64) -> f64 {
        (document_height - self.height).max(0.0)
    }

    /// Check whether a document-space rect is in view at `scroll_y`.
    pub fn is_in_view(&self, scroll_y: f64, rect: &ElementRect) -> bool {
        let trigger_line = scroll_y + self.height * VIEW_TRIGGER_FRACTION;
        rect.top < trigger_line && rect.bottom() > scroll_y
    }
}

/// An element's bounds in document coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementRect {
    pub top: f64,
    pub height: f64,
}

impl ElementRect {
    /// Bounds starting at document offset `top`.
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    /// Document offset of the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// How far the element has travelled through the viewport:
    /// 0 when its top touches the viewport bottom, 1 when its bottom
    /// leaves the viewport top.
    pub fn progress_through(&self, scroll_y: f64, viewport_height: f64) -> f64 {
        let span = viewport_height + self.height;
        if span <= 0.0 {
            return 0.0;
        }
        ((scroll_y + viewport_height - self.top) / span).clamp(0.0, 1.0)
    }
}

#[cfg(feature = "web")]
pub mod web {
    use super::Viewport;

    /// Read the current viewport from the browser window.
    pub fn read_viewport(window: &web_sys::Window) -> Option<Viewport> {
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        let touch = window.navigator().max_touch_points() > 0;
        Some(
            Viewport::new(width, height)
                .with_device_pixel_ratio(window.device_pixel_ratio())
                .with_touch(touch),
        )
    }

    /// Full height of the document content in CSS pixels.
    pub fn document_height(document: &web_sys::Document) -> f64 {
        let body = document.body().map(|b| b.scroll_height()).unwrap_or(0);
        let root = document
            .document_element()
            .map(|e| e.scroll_height())
            .unwrap_or(0);
        body.max(root) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_classification() {
        assert!(!Viewport::new(1280.0, 800.0).is_mobile());
        assert!(Viewport::new(768.0, 1024.0).is_mobile());
        assert!(Viewport::new(390.0, 844.0).is_mobile());
        assert!(Viewport::new(1920.0, 1080.0).with_touch(true).is_mobile());
    }

    #[test]
    fn test_max_scroll() {
        let vp = Viewport::new(1280.0, 800.0);
        assert_eq!(vp.max_scroll(1800.0), 1000.0);
        assert_eq!(vp.max_scroll(600.0), 0.0);
    }

    #[test]
    fn test_invalid_pixel_ratio() {
        let vp = Viewport::new(100.0, 100.0).with_device_pixel_ratio(0.0);
        assert_eq!(vp.device_pixel_ratio, 1.0);
        let vp = Viewport::new(100.0, 100.0).with_device_pixel_ratio(f64::NAN);
        assert_eq!(vp.device_pixel_ratio, 1.0);
    }

    #[test]
    fn test_in_view() {
        let vp = Viewport::new(1280.0, 1000.0);
        let rect = ElementRect::new(1200.0, 300.0);

        // Trigger line is at scroll_y + 850
        assert!(!vp.is_in_view(0.0, &rect));
        assert!(vp.is_in_view(400.0, &rect));
        // Scrolled fully past
        assert!(!vp.is_in_view(1600.0, &rect));
    }

    #[test]
    fn test_progress_through() {
        let rect = ElementRect::new(1000.0, 200.0);
        assert_eq!(rect.progress_through(0.0, 800.0), 0.0);
        assert_eq!(rect.progress_through(200.0, 800.0), 0.0);
        assert!((rect.progress_through(700.0, 800.0) - 0.5).abs() < 1e-9);
        assert_eq!(rect.progress_through(1200.0, 800.0), 1.0);
    }
}
