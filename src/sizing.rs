//! Canvas sizing and cover-fit calculations.

/// Size of a canvas in CSS pixels together with the display density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    /// Visible width in CSS pixels
    pub css_width: f64,
    /// Visible height in CSS pixels
    pub css_height: f64,
    /// Physical pixels per CSS pixel
    pub device_pixel_ratio: f64,
}

impl CanvasSize {
    /// Backing store for a canvas of CSS size `css_width` x `css_height`.
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width: css_width.max(0.0),
            css_height: css_height.max(0.0),
            device_pixel_ratio: if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
        }
    }

    /// Size a canvas to fill the viewport.
    pub fn from_viewport(viewport: &crate::Viewport) -> Self {
        Self::new(viewport.width, viewport.height, viewport.device_pixel_ratio)
    }

    /// Width of the backing store in device pixels (at least 1).
    #[inline]
    pub fn backing_width(&self) -> u32 {
        ((self.css_width * self.device_pixel_ratio).round() as u32).max(1)
    }

    /// Height of the backing store in device pixels (at least 1).
    #[inline]
    pub fn backing_height(&self) -> u32 {
        ((self.css_height * self.device_pixel_ratio).round() as u32).max(1)
    }
}

/// Destination rectangle for drawing an image, in backing-store pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scale an image to cover the whole canvas, centering the overflow.
///
/// The image is scaled up until both axes are covered; the axis with
/// spare length is cropped evenly on both sides. Returns `None` when
/// either size is degenerate.
///
/// ## Example
///
/// ```rust
/// use exo_motion::cover_fit;
///
/// // 16:9 image on a square canvas: height fits, width overflows
/// let rect = cover_fit(1600, 900, 900.0, 900.0).unwrap();
/// assert_eq!(rect.height, 900.0);
/// assert_eq!(rect.width, 1600.0);
/// assert_eq!(rect.x, -350.0);
/// assert_eq!(rect.y, 0.0);
/// ```
pub fn cover_fit(image_width: u32, image_height: u32, canvas_width: f64, canvas_height: f64) -> Option<DrawRect> {
    if image_width == 0 || image_height == 0 || canvas_width <= 0.0 || canvas_height <= 0.0 {
        return None;
    }
    let iw = image_width as f64;
    let ih = image_height as f64;

    let scale = (canvas_width / iw).max(canvas_height / ih);
    let width = iw * scale;
    let height = ih * scale;

    Some(DrawRect {
        x: (canvas_width - width) / 2.0,
        y: (canvas_height - height) / 2.0,
        width,
        height,
    })
}
