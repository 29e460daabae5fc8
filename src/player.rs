//! Scroll-scrubbed image sequence playback.
//!
//! A [`FramePlayer`] picks the frame proportional to scroll progress and
//! paints it onto a [`FrameSurface`] with a cover fit. Nothing is drawn
//! until every frame of the sequence has settled.

use crate::error::MotionResult;
use crate::loader::{FrameSequence, FrameSource, FrameStatus, SettleProgress};
use crate::sizing::{cover_fit, CanvasSize, DrawRect};

/// Drawing target for a frame player.
pub trait FrameSurface {
    /// Resize the backing store and visible size.
    fn resize(&mut self, size: CanvasSize);

    /// Clear the whole surface.
    fn clear(&mut self, size: CanvasSize);

    /// Draw the frame at `index` into `rect` (backing-store pixels).
    fn draw_frame(&mut self, index: usize, rect: DrawRect) -> Result<(), String>;
}

/// Frame index for a progress value.
///
/// Progress itself is not clamped; only the resulting index is, so
/// values past either end select the first or last frame.
///
/// ```rust
/// use exo_motion::frame_index_for;
///
/// assert_eq!(frame_index_for(0.0, 150), 0);
/// assert_eq!(frame_index_for(0.5, 150), 75);
/// assert_eq!(frame_index_for(0.999, 150), 149);
/// assert_eq!(frame_index_for(1.0, 150), 149);
/// ```
pub fn frame_index_for(progress: f64, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let raw = (progress * frame_count as f64).floor();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw as usize).min(frame_count - 1)
    }
}

/// Plays an image sequence against scroll progress.
#[derive(Debug)]
pub struct FramePlayer<S: FrameSurface> {
    source: FrameSource,
    sequence: FrameSequence,
    surface: S,
    size: CanvasSize,
    current_frame: usize,
    drawn_frame: Option<usize>,
}

impl<S: FrameSurface> FramePlayer<S> {
    /// Create a player and size its surface. Fails for an empty source.
    pub fn new(mut surface: S, source: FrameSource, size: CanvasSize) -> MotionResult<Self> {
        let sequence = FrameSequence::new(source.frame_count)?;
        surface.resize(size);
        Ok(Self {
            source,
            sequence,
            surface,
            size,
            current_frame: 0,
            drawn_frame: None,
        })
    }

    /// Where the frames are loaded from.
    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    /// The surface frames are drawn onto.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Frame selected by the latest progress update.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.sequence.is_ready()
    }

    #[inline]
    pub fn load_progress(&self) -> SettleProgress {
        self.sequence.progress()
    }

    /// Backing store size of the surface.
    #[inline]
    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// A frame finished decoding. Paints the first frame once the whole
    /// sequence has settled.
    pub fn on_frame_loaded(&mut self, index: usize, width: u32, height: u32) -> MotionResult<bool> {
        let ready = self.sequence.mark_loaded(index, width, height)?;
        if ready {
            self.render();
        }
        Ok(ready)
    }

    /// A frame failed to load. It still counts toward readiness and is
    /// drawn as blank.
    pub fn on_frame_failed(&mut self, index: usize) -> MotionResult<bool> {
        tracing::warn!(index, url = %self.source.url(index), "frame failed to load");
        let ready = self.sequence.mark_failed(index)?;
        if ready {
            self.render();
        }
        Ok(ready)
    }

    /// Select the frame for `progress`, repainting only if it changed.
    ///
    /// Returns true if the surface was repainted.
    pub fn update_frame(&mut self, progress: f64) -> bool {
        let index = frame_index_for(progress, self.sequence.frame_count());
        self.current_frame = index;
        if self.drawn_frame == Some(index) {
            return false;
        }
        self.render()
    }

    /// Clear the surface and draw the current frame.
    ///
    /// Does nothing until the sequence is ready. Failed frames leave the
    /// surface blank.
    pub fn render(&mut self) -> bool {
        if !self.sequence.is_ready() {
            return false;
        }
        let index = self.current_frame;
        self.surface.clear(self.size);
        self.drawn_frame = Some(index);

        if let Some(FrameStatus::Loaded { width, height }) = self.sequence.status(index) {
            let canvas_w = self.size.backing_width() as f64;
            let canvas_h = self.size.backing_height() as f64;
            if let Some(rect) = cover_fit(width, height, canvas_w, canvas_h) {
                if let Err(err) = self.surface.draw_frame(index, rect) {
                    tracing::warn!(index, "frame draw failed: {}", err);
                }
            }
        }
        true
    }

    /// Re-apply sizing and repaint the current frame.
    pub fn on_resize(&mut self, size: CanvasSize) -> bool {
        self.size = size;
        self.surface.resize(size);
        self.drawn_frame = None;
        self.render()
    }
}

/// Web-specific canvas surface and image loading.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

    /// A frame player drawing into a canvas element.
    pub type CanvasPlayer = FramePlayer<CanvasSurface>;

    /// [`FrameSurface`] backed by a 2D canvas and one image per frame.
    #[derive(Debug)]
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        context: CanvasRenderingContext2d,
        images: Vec<HtmlImageElement>,
    }

    impl CanvasSurface {
        /// Create a surface with one (not yet requested) image per frame.
        pub fn new(canvas: HtmlCanvasElement, frame_count: usize) -> Result<Self, String> {
            let context = canvas
                .get_context("2d")
                .map_err(|_| "Failed to get 2d context")?
                .ok_or("No 2d context available")?
                .dyn_into::<CanvasRenderingContext2d>()
                .map_err(|_| "Failed to cast to CanvasRenderingContext2d")?;

            let images = (0..frame_count)
                .map(|_| HtmlImageElement::new().map_err(|_| "Failed to create image element".to_string()))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Self {
                canvas,
                context,
                images,
            })
        }

        pub fn canvas(&self) -> &HtmlCanvasElement {
            &self.canvas
        }

        /// Decoded image for frame `index`.
        pub fn image(&self, index: usize) -> Option<&HtmlImageElement> {
            self.images.get(index)
        }
    }

    impl FrameSurface for CanvasSurface {
        fn resize(&mut self, size: CanvasSize) {
            self.canvas.set_width(size.backing_width());
            self.canvas.set_height(size.backing_height());
            let style = self.canvas.style();
            let width = format!("{}px", size.css_width);
            let height = format!("{}px", size.css_height);
            for (name, value) in [("width", width), ("height", height)] {
                if let Err(err) = style.set_property(name, &value) {
                    tracing::debug!("canvas {} not applied: {:?}", name, err);
                }
            }
        }

        fn clear(&mut self, size: CanvasSize) {
            self.context.clear_rect(
                0.0,
                0.0,
                size.backing_width() as f64,
                size.backing_height() as f64,
            );
        }

        fn draw_frame(&mut self, index: usize, rect: DrawRect) -> Result<(), String> {
            let image = self.images.get(index).ok_or("Frame image missing")?;
            self.context
                .draw_image_with_html_image_element_and_dw_and_dh(image, rect.x, rect.y, rect.width, rect.height)
                .map_err(|_| "Failed to draw frame image".to_string())
        }
    }

    /// Create a player for `canvas` and request every frame.
    ///
    /// Loads run independently; each completion holds only a weak
    /// reference, so dropping the player discards late results.
    pub fn start_canvas_player(canvas: HtmlCanvasElement, source: FrameSource, size: CanvasSize) -> Result<Rc<RefCell<CanvasPlayer>>, String> {
        let surface = CanvasSurface::new(canvas, source.frame_count)?;
        let player = FramePlayer::new(surface, source, size).map_err(|e| e.to_string())?;
        let player = Rc::new(RefCell::new(player));

        let requests: Vec<(usize, String, HtmlImageElement)> = {
            let p = player.borrow();
            p.source()
                .urls()
                .into_iter()
                .enumerate()
                .filter_map(|(i, url)| p.surface().image(i).map(|img| (i, url, img.clone())))
                .collect()
        };

        for (index, url, image) in requests {
            image.set_src(&url);
            let weak = Rc::downgrade(&player);
            wasm_bindgen_futures::spawn_local(settle_frame(weak, index, image));
        }

        Ok(player)
    }

    async fn settle_frame(player: Weak<RefCell<CanvasPlayer>>, index: usize, image: HtmlImageElement) {
        let decoded = JsFuture::from(image.decode()).await;
        let Some(player) = player.upgrade() else {
            return;
        };
        let mut player = player.borrow_mut();
        let result = match decoded {
            Ok(_) => player.on_frame_loaded(index, image.natural_width(), image.natural_height()),
            Err(_) => player.on_frame_failed(index),
        };
        if let Err(err) = result {
            tracing::warn!("frame {} not recorded: {}", index, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        resizes: Vec<CanvasSize>,
        clears: usize,
        draws: Vec<(usize, DrawRect)>,
    }

    impl FrameSurface for RecordingSurface {
        fn resize(&mut self, size: CanvasSize) {
            self.resizes.push(size);
        }

        fn clear(&mut self, _size: CanvasSize) {
            self.clears += 1;
        }

        fn draw_frame(&mut self, index: usize, rect: DrawRect) -> Result<(), String> {
            self.draws.push((index, rect));
            Ok(())
        }
    }

    fn player(frames: usize) -> FramePlayer<RecordingSurface> {
        FramePlayer::new(
            RecordingSurface::default(),
            FrameSource::new("seq", frames),
            CanvasSize::new(800.0, 450.0, 2.0),
        )
        .unwrap()
    }

    fn load_all(player: &mut FramePlayer<RecordingSurface>) {
        for i in 0..player.source().frame_count {
            player.on_frame_loaded(i, 1600, 900).unwrap();
        }
    }

    #[test]
    fn test_index_selection() {
        assert_eq!(frame_index_for(0.0, 1), 0);
        assert_eq!(frame_index_for(1.0, 1), 0);
        assert_eq!(frame_index_for(-0.3, 150), 0);
        assert_eq!(frame_index_for(1.7, 150), 149);
        assert_eq!(frame_index_for(f64::NAN, 150), 0);
        assert_eq!(frame_index_for(f64::INFINITY, 150), 149);
        assert_eq!(frame_index_for(0.5, 0), 0);

        for n in 1..40usize {
            for step in 0..=100 {
                let p = step as f64 / 100.0;
                let expected = ((p * n as f64).floor() as usize).min(n - 1);
                assert_eq!(frame_index_for(p, n), expected);
            }
        }
    }

    #[test]
    fn test_sizes_surface_on_create() {
        let player = player(3);
        assert_eq!(player.surface().resizes.len(), 1);
        assert_eq!(player.surface().resizes[0].backing_width(), 1600);
        assert!(FramePlayer::new(RecordingSurface::default(), FrameSource::new("x", 0), CanvasSize::new(1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_no_draw_before_ready() {
        let mut player = player(3);
        player.on_frame_loaded(0, 1600, 900).unwrap();
        assert!(!player.update_frame(0.9));
        assert_eq!(player.current_frame(), 2);
        assert_eq!(player.surface().clears, 0);

        player.on_frame_loaded(1, 1600, 900).unwrap();
        assert!(player.on_frame_loaded(2, 1600, 900).unwrap());

        // First paint uses the most recent selection
        assert_eq!(player.surface().draws.len(), 1);
        assert_eq!(player.surface().draws[0].0, 2);
    }

    #[test]
    fn test_scrub_selects_frames() {
        let mut player = player(150);
        load_all(&mut player);

        assert!(player.update_frame(0.5));
        assert_eq!(player.current_frame(), 75);
        assert!(player.update_frame(0.999));
        assert_eq!(player.current_frame(), 149);

        let (index, rect) = *player.surface().draws.last().unwrap();
        assert_eq!(index, 149);
        assert_eq!(rect.width, 1600.0);
        assert_eq!(rect.height, 900.0);
    }

    #[test]
    fn test_redundant_updates_do_not_redraw() {
        let mut player = player(150);
        load_all(&mut player);
        player.update_frame(0.5);

        let draws = player.surface().draws.len();
        let clears = player.surface().clears;
        // 0.5 .. 0.5066 all map to frame 75
        for p in [0.5, 0.501, 0.503, 0.5066] {
            assert!(!player.update_frame(p));
        }
        assert_eq!(player.surface().draws.len(), draws);
        assert_eq!(player.surface().clears, clears);

        assert!(player.update_frame(0.51));
        assert_eq!(player.surface().draws.len(), draws + 1);
    }

    #[test]
    fn test_all_frames_failed() {
        let mut player = player(150);
        let mut ready = false;
        for i in 0..150 {
            ready |= player.on_frame_failed(i).unwrap();
        }
        assert!(ready);
        assert!(player.is_ready());
        assert_eq!(player.load_progress().failed, 150);

        // Frames render as blank: cleared, never drawn
        assert!(player.update_frame(0.3));
        assert!(player.update_frame(0.8));
        assert!(player.surface().draws.is_empty());
        assert_eq!(player.surface().clears, 3);
    }

    #[test]
    fn test_resize_forces_redraw() {
        let mut player = player(10);
        load_all(&mut player);
        player.update_frame(0.45);
        let draws = player.surface().draws.len();

        assert!(player.on_resize(CanvasSize::new(400.0, 400.0, 1.0)));
        assert_eq!(player.surface().resizes.len(), 2);
        assert_eq!(player.surface().draws.len(), draws + 1);

        let (index, rect) = *player.surface().draws.last().unwrap();
        assert_eq!(index, 4);
        assert!((rect.height - 400.0).abs() < 1e-9);
        assert!((rect.x + (rect.width - 400.0) / 2.0).abs() < 1e-9);
    }
}
