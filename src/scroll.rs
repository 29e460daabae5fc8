//! Virtual scroll engine with exponential smoothing.
//!
//! Native scrolling is replaced by a target offset that input moves
//! immediately and a displayed offset that eases toward it once per frame.
//! The target is clamped at input time, so the displayed position can lag
//! behind but never leaves the document.

use crate::animator::{AnimationHandle, Animator, Property, TargetId, TweenSpec};
use crate::config::SmoothScrollOptions;
use crate::events::ScrollProgressEvent;
use crate::input::{KeyMotion, ScrollKey};
use crate::tween::Easing;
use crate::viewport::Viewport;

/// Below this distance the displayed offset snaps onto the target.
pub const SETTLE_EPSILON: f64 = 0.01;

/// Easing used by [`VirtualScroll::scroll_to`].
pub const SCROLL_TO_EASING: Easing = Easing::ExpoInOut;

/// Default duration of [`VirtualScroll::scroll_to`], in seconds.
pub const DEFAULT_SCROLL_TO_DURATION: f64 = 1.2;

/// Raw scroll numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollState {
    /// Smoothed offset that is displayed
    pub current: f64,
    /// Offset input is driving toward, always within `[0, max_scroll]`
    pub target: f64,
    /// Total scrollable distance
    pub max_scroll: f64,
    /// Fraction of the remaining distance covered per frame
    pub ease_factor: f64,
}

impl ScrollState {
    fn new(ease_factor: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            max_scroll: 0.0,
            ease_factor,
        }
    }

    #[inline]
    fn clamp_target(&mut self) {
        self.target = self.target.clamp(0.0, self.max_scroll.max(0.0));
    }
}

/// Lifecycle of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Never started
    Idle,
    /// Intercepting input and easing every frame
    Running,
    /// Stopped; native scrolling is in charge
    Stopped,
}

/// Result of a viewport change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Engine not running; nothing changed
    Inactive,
    /// Scroll bounds were recomputed
    Remeasured,
    /// The viewport became mobile and the engine stopped
    TornDown,
}

/// Smoothed virtual scroll engine.
///
/// The engine does no timing of its own: the owner calls [`tick`](Self::tick)
/// once per frame and applies [`translate_y`](Self::translate_y) to the
/// scrolled content.
///
/// ```rust
/// use exo_motion::{ScrollKey, SmoothScrollOptions, Viewport, VirtualScroll};
///
/// let mut engine = VirtualScroll::new(&SmoothScrollOptions::default());
/// assert!(engine.start(Viewport::new(1280.0, 800.0), 1800.0));
///
/// engine.on_key(ScrollKey::End);
/// assert_eq!(engine.state().target, 1000.0);
///
/// let event = engine.tick().unwrap();
/// assert_eq!(event.scroll_y, 100.0);
/// assert_eq!(event.progress, 0.1);
/// ```
#[derive(Clone, Debug)]
pub struct VirtualScroll {
    state: ScrollState,
    viewport: Viewport,
    status: EngineState,
    scroll_tween: Option<AnimationHandle>,
}

impl VirtualScroll {
    /// An idle engine; nothing moves until `start`.
    pub fn new(options: &SmoothScrollOptions) -> Self {
        Self {
            state: ScrollState::new(options.effective_smoothing()),
            viewport: Viewport::default(),
            status: EngineState::Idle,
            scroll_tween: None,
        }
    }

    /// Start intercepting scroll input.
    ///
    /// Returns false, leaving native scrolling untouched, on mobile
    /// viewports. Calling it while already running just remeasures.
    pub fn start(&mut self, viewport: Viewport, document_height: f64) -> bool {
        if viewport.is_mobile() {
            tracing::debug!(width = viewport.width, "mobile viewport, virtual scroll not started");
            return false;
        }
        self.viewport = viewport;
        self.state.max_scroll = viewport.max_scroll(document_height);
        self.state.clamp_target();
        if self.status != EngineState::Running {
            tracing::debug!(max_scroll = self.state.max_scroll, "virtual scroll started");
        }
        self.status = EngineState::Running;
        true
    }

    /// Restore native scrolling. Returns true if the engine was running.
    pub fn stop(&mut self) -> bool {
        if self.status != EngineState::Running {
            return false;
        }
        self.status = EngineState::Stopped;
        self.scroll_tween = None;
        self.state.current = 0.0;
        self.state.target = 0.0;
        tracing::debug!("virtual scroll stopped");
        true
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.status == EngineState::Running
    }

    /// Whether the engine is idle or running.
    #[inline]
    pub fn status(&self) -> EngineState {
        self.status
    }

    /// Snapshot of current, target and bounds.
    #[inline]
    pub fn state(&self) -> ScrollState {
        self.state
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Move the target by a wheel delta.
    pub fn on_wheel(&mut self, delta_y: f64) {
        self.scroll_by(delta_y);
    }

    /// Move the target by a touch drag delta.
    pub fn on_touch_drag(&mut self, delta_y: f64) {
        self.scroll_by(delta_y);
    }

    /// Move the target for a navigation key.
    pub fn on_key(&mut self, key: ScrollKey) {
        if !self.is_running() {
            return;
        }
        match key.motion(self.viewport.height) {
            KeyMotion::By(delta) => self.scroll_by(delta),
            KeyMotion::Top => self.set_target(0.0),
            KeyMotion::Bottom => self.set_target(self.state.max_scroll),
        }
    }

    fn scroll_by(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let target = self.state.target + delta;
        self.set_target(target);
    }

    /// Overwrite the target, clamped into the scrollable range.
    ///
    /// This is the single write path for input and for `scroll_to`
    /// animation; whichever writes last in a frame wins.
    pub fn set_target(&mut self, target: f64) {
        if !self.is_running() || target.is_nan() {
            return;
        }
        self.state.target = target;
        self.state.clamp_target();
    }

    /// Recompute bounds after a viewport or layout change.
    pub fn on_resize(&mut self, viewport: Viewport, document_height: f64) -> ResizeOutcome {
        if !self.is_running() {
            return ResizeOutcome::Inactive;
        }
        if viewport.is_mobile() {
            tracing::debug!(width = viewport.width, "viewport became mobile, tearing down virtual scroll");
            self.stop();
            return ResizeOutcome::TornDown;
        }
        self.viewport = viewport;
        self.state.max_scroll = viewport.max_scroll(document_height);
        self.state.clamp_target();
        self.state.current = self.state.current.min(self.state.max_scroll);
        ResizeOutcome::Remeasured
    }

    /// Advance one frame and report progress.
    ///
    /// Returns `None` when the engine is not running.
    pub fn tick(&mut self) -> Option<ScrollProgressEvent> {
        if !self.is_running() {
            return None;
        }
        let s = &mut self.state;
        let remaining = s.target - s.current;
        if remaining.abs() < SETTLE_EPSILON {
            s.current = s.target;
        } else {
            s.current += remaining * s.ease_factor;
        }
        Some(ScrollProgressEvent::new(s.current, s.max_scroll))
    }

    /// Vertical translation to apply to the scrolled content.
    #[inline]
    pub fn translate_y(&self) -> f64 {
        -self.state.current
    }

    /// Ease the target to `offset` over `duration` seconds through the
    /// animator. Manual input keeps working while this runs.
    pub fn scroll_to(&mut self, animator: &mut dyn Animator, offset: f64, duration: f64) -> Option<AnimationHandle> {
        if !self.is_running() || offset.is_nan() {
            return None;
        }
        if let Some(previous) = self.scroll_tween.take() {
            animator.kill(previous);
        }
        let to = offset.clamp(0.0, self.state.max_scroll);
        let spec = TweenSpec::from_to(self.state.target, to, duration.max(0.0)).easing(SCROLL_TO_EASING);
        let handle = animator.animate(TargetId::SCROLL, Property::ScrollTarget, spec);
        self.scroll_tween = Some(handle);
        Some(handle)
    }
}

/// Web-specific DOM plumbing for the scroll engine.
#[cfg(feature = "web")]
pub mod web {
    use wasm_bindgen::JsValue;
    use web_sys::HtmlElement;

    const PINNED: [(&str, &str); 5] = [
        ("position", "fixed"),
        ("top", "0"),
        ("left", "0"),
        ("width", "100%"),
        ("will-change", "transform"),
    ];

    /// Pin the body in place so the engine owns the scroll position.
    pub fn pin_body(body: &HtmlElement) -> Result<(), JsValue> {
        let style = body.style();
        for (name, value) in PINNED {
            style.set_property(name, value)?;
        }
        Ok(())
    }

    /// Translate the body by the engine's offset.
    pub fn apply_translation(body: &HtmlElement, translate_y: f64) -> Result<(), JsValue> {
        let value = format!("translate3d(0px, {:.2}px, 0px)", translate_y);
        body.style().set_property("transform", &value)
    }

    /// Undo [`pin_body`] and any applied translation.
    pub fn restore_body(body: &HtmlElement) -> Result<(), JsValue> {
        let style = body.style();
        for (name, _) in PINNED {
            style.remove_property(name)?;
        }
        style.remove_property("transform")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::TweenAnimator;

    fn running(max_scroll: f64) -> VirtualScroll {
        let mut engine = VirtualScroll::new(&SmoothScrollOptions::default());
        let viewport = Viewport::new(1280.0, 800.0);
        assert!(engine.start(viewport, max_scroll + viewport.height));
        engine
    }

    #[test]
    fn test_mobile_never_starts() {
        let mut engine = VirtualScroll::new(&SmoothScrollOptions::default());
        assert!(!engine.start(Viewport::new(390.0, 844.0), 5000.0));
        assert_eq!(engine.status(), EngineState::Idle);

        engine.on_wheel(100.0);
        assert_eq!(engine.state().target, 0.0);
        assert_eq!(engine.tick(), None);
    }

    #[test]
    fn test_target_stays_in_bounds() {
        let mut engine = running(1000.0);
        let inputs: [&dyn Fn(&mut VirtualScroll); 8] = [
            &|e: &mut VirtualScroll| e.on_wheel(-500.0),
            &|e: &mut VirtualScroll| e.on_wheel(400.0),
            &|e: &mut VirtualScroll| e.on_touch_drag(900.0),
            &|e: &mut VirtualScroll| e.on_key(ScrollKey::PageDown),
            &|e: &mut VirtualScroll| e.on_key(ScrollKey::ArrowDown),
            &|e: &mut VirtualScroll| e.on_key(ScrollKey::Home),
            &|e: &mut VirtualScroll| e.on_key(ScrollKey::ArrowUp),
            &|e: &mut VirtualScroll| e.on_wheel(f64::INFINITY),
        ];
        for round in 0..20 {
            for (i, input) in inputs.iter().enumerate() {
                if (round + i) % 3 != 0 {
                    input(&mut engine);
                }
                let target = engine.state().target;
                assert!((0.0..=1000.0).contains(&target), "target {target} out of bounds");
                engine.tick();
            }
        }
    }

    #[test]
    fn test_key_motions() {
        let mut engine = running(1000.0);
        engine.on_key(ScrollKey::ArrowDown);
        assert_eq!(engine.state().target, 50.0);
        engine.on_key(ScrollKey::PageDown);
        assert_eq!(engine.state().target, 50.0 + 640.0);
        engine.on_key(ScrollKey::End);
        assert_eq!(engine.state().target, 1000.0);
        engine.on_key(ScrollKey::ArrowDown);
        assert_eq!(engine.state().target, 1000.0);
        engine.on_key(ScrollKey::Home);
        assert_eq!(engine.state().target, 0.0);
        engine.on_key(ScrollKey::ArrowUp);
        assert_eq!(engine.state().target, 0.0);
    }

    #[test]
    fn test_geometric_convergence() {
        let mut engine = running(1000.0);
        engine.on_key(ScrollKey::End);

        let first = engine.tick().unwrap();
        assert!((first.scroll_y - 100.0).abs() < 1e-9);

        for _ in 0..9 {
            engine.tick();
        }
        let expected = 1000.0 * (1.0 - 0.9f64.powi(10));
        assert!((engine.state().current - expected).abs() < 1e-6);
        assert!((engine.state().current - 651.0).abs() < 1.0);
    }

    #[test]
    fn test_monotonic_without_overshoot() {
        let mut engine = running(1000.0);
        engine.on_wheel(730.0);

        let mut gap = (engine.state().target - engine.state().current).abs();
        for _ in 0..500 {
            engine.tick();
            let s = engine.state();
            assert!(s.current <= s.target, "overshoot: {} > {}", s.current, s.target);
            let next = (s.target - s.current).abs();
            if gap < SETTLE_EPSILON {
                assert_eq!(next, 0.0);
            } else {
                assert!(next < gap);
            }
            gap = next;
        }
        assert_eq!(engine.state().current, 730.0);
    }

    #[test]
    fn test_progress_zero_when_nothing_to_scroll() {
        let mut engine = running(0.0);
        engine.on_wheel(200.0);
        let event = engine.tick().unwrap();
        assert_eq!(event.progress, 0.0);
        assert_eq!(event.scroll_y, 0.0);
    }

    #[test]
    fn test_resize_remeasures() {
        let mut engine = running(1000.0);
        engine.on_key(ScrollKey::End);
        for _ in 0..200 {
            engine.tick();
        }

        let outcome = engine.on_resize(Viewport::new(1280.0, 800.0), 1300.0);
        assert_eq!(outcome, ResizeOutcome::Remeasured);
        assert_eq!(engine.state().max_scroll, 500.0);
        assert_eq!(engine.state().target, 500.0);
        assert_eq!(engine.state().current, 500.0);
    }

    #[test]
    fn test_resize_to_mobile_tears_down() {
        let mut engine = running(1000.0);
        engine.on_wheel(300.0);
        engine.tick();

        let outcome = engine.on_resize(Viewport::new(600.0, 900.0), 3000.0);
        assert_eq!(outcome, ResizeOutcome::TornDown);
        assert_eq!(engine.status(), EngineState::Stopped);

        let before = engine.state();
        engine.on_wheel(100.0);
        assert_eq!(engine.tick(), None);
        assert_eq!(engine.state(), before);
        assert_eq!(engine.translate_y(), 0.0);

        assert_eq!(engine.on_resize(Viewport::new(1280.0, 800.0), 3000.0), ResizeOutcome::Inactive);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut engine = running(1000.0);
        assert!(engine.stop());
        assert!(!engine.stop());
        assert_eq!(engine.status(), EngineState::Stopped);
    }

    #[test]
    fn test_scroll_to_through_animator() {
        let mut engine = running(1000.0);
        let mut animator = TweenAnimator::new();

        let handle = engine.scroll_to(&mut animator, 5000.0, 1.0).unwrap();
        assert!(animator.is_running(handle));

        let mut last = 0.0;
        for _ in 0..70 {
            for write in animator.advance(1.0 / 60.0) {
                if write.property == Property::ScrollTarget {
                    engine.set_target(write.value);
                }
            }
            assert!(engine.state().target >= last);
            last = engine.state().target;
        }
        assert_eq!(engine.state().target, 1000.0);
        assert!(!animator.is_running(handle));
    }

    #[test]
    fn test_manual_input_races_scroll_to() {
        let mut engine = running(1000.0);
        let mut animator = TweenAnimator::new();
        engine.scroll_to(&mut animator, 800.0, 1.0);

        for write in animator.advance(0.5) {
            engine.set_target(write.value);
        }
        assert!((engine.state().target - 400.0).abs() < 1e-6);

        // Wheel input lands after the animator wrote this frame
        engine.on_wheel(-350.0);
        assert!((engine.state().target - 50.0).abs() < 1e-6);

        // Next animator write wins again
        for write in animator.advance(0.1) {
            engine.set_target(write.value);
        }
        assert!(engine.state().target > 400.0);
    }

    #[test]
    fn test_scroll_to_replaces_previous() {
        let mut engine = running(1000.0);
        let mut animator = TweenAnimator::new();
        let first = engine.scroll_to(&mut animator, 800.0, 1.0).unwrap();
        let second = engine.scroll_to(&mut animator, 200.0, 1.0).unwrap();
        assert!(!animator.is_running(first));
        assert!(animator.is_running(second));
    }
}
