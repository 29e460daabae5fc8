//! Per-frame callback scheduling.
//!
//! A [`FrameScheduler`] runs a callback once per frame until its
//! [`CancelToken`] is cancelled. The token is checked before every
//! invocation, so cancelling from inside the callback stops the loop
//! before the next frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared flag that stops a frame loop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    /// A live token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the loop before its next frame.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Owns a frame loop and cancels it when dropped.
#[derive(Debug)]
pub struct LoopGuard(CancelToken);

impl LoopGuard {
    /// Take ownership of the loop behind `token`.
    pub fn new(token: CancelToken) -> Self {
        Self(token)
    }

    /// Stop the loop now rather than on drop.
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Timing information passed to frame callbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTick {
    /// Timestamp of this frame in milliseconds
    pub timestamp_ms: f64,
    /// Milliseconds since the previous frame of the same loop
    pub delta_ms: f64,
    /// Frames delivered to this loop so far, starting at 0
    pub frame: u64,
}

impl FrameTick {
    /// Frame delta in seconds.
    #[inline]
    pub fn delta_secs(&self) -> f64 {
        self.delta_ms / 1000.0
    }
}

/// Frame delta assumed for the first frame of a loop.
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

pub type FrameCallback = Box<dyn FnMut(FrameTick)>;

/// Something that can call back once per display frame.
pub trait FrameScheduler {
    /// Start calling `callback` every frame. Cancel the returned token to stop.
    fn run_every_frame(&self, callback: FrameCallback) -> CancelToken;
}

struct ManualLoop {
    token: CancelToken,
    callback: FrameCallback,
    last_ms: Option<f64>,
    frame: u64,
}

/// Scheduler driven by hand, for tests and headless use.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use exo_motion::{FrameScheduler, ManualScheduler};
///
/// let scheduler = ManualScheduler::new();
/// let frames = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&frames);
/// let token = scheduler.run_every_frame(Box::new(move |_| counter.set(counter.get() + 1)));
///
/// scheduler.advance(16.0);
/// scheduler.advance(16.0);
/// token.cancel();
/// scheduler.advance(16.0);
/// assert_eq!(frames.get(), 2);
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    loops: RefCell<Vec<ManualLoop>>,
    now_ms: Cell<f64>,
}

impl ManualScheduler {
    /// A scheduler whose time only moves on `advance`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward and run one frame of every live loop.
    ///
    /// Returns the number of callbacks invoked.
    pub fn advance(&self, delta_ms: f64) -> usize {
        let now = self.now_ms.get() + delta_ms.max(0.0);
        self.now_ms.set(now);

        // Take the loops out so callbacks may schedule new ones.
        let mut running = std::mem::take(&mut *self.loops.borrow_mut());
        let mut invoked = 0;
        for lp in running.iter_mut() {
            if lp.token.is_cancelled() {
                continue;
            }
            let tick = FrameTick {
                timestamp_ms: now,
                delta_ms: lp.last_ms.map_or(NOMINAL_FRAME_MS, |last| now - last),
                frame: lp.frame,
            };
            lp.last_ms = Some(now);
            lp.frame += 1;
            (lp.callback)(tick);
            invoked += 1;
        }
        running.retain(|lp| !lp.token.is_cancelled());

        let mut loops = self.loops.borrow_mut();
        let added = std::mem::take(&mut *loops);
        *loops = running;
        loops.extend(added);
        invoked
    }

    /// Number of loops that have not been cancelled.
    pub fn active_loops(&self) -> usize {
        self.loops
            .borrow()
            .iter()
            .filter(|lp| !lp.token.is_cancelled())
            .count()
    }

    /// Current clock value in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn run_every_frame(&self, callback: FrameCallback) -> CancelToken {
        let token = CancelToken::new();
        self.loops.borrow_mut().push(ManualLoop {
            token: token.clone(),
            callback,
            last_ms: None,
            frame: 0,
        });
        token
    }
}

/// `requestAnimationFrame` backed scheduler.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    type RafClosure = Closure<dyn FnMut(f64)>;

    /// Scheduler that runs callbacks from `requestAnimationFrame`.
    #[derive(Clone, Debug)]
    pub struct RafScheduler {
        window: web_sys::Window,
    }

    impl RafScheduler {
        /// Schedule on `window`'s animation frames.
        pub fn new(window: web_sys::Window) -> Self {
            Self { window }
        }
    }

    fn request(window: &web_sys::Window, slot: &Rc<RefCell<Option<RafClosure>>>) {
        if let Some(closure) = slot.borrow().as_ref() {
            if let Err(err) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                tracing::warn!("requestAnimationFrame failed: {:?}", err);
            }
        }
    }

    impl FrameScheduler for RafScheduler {
        fn run_every_frame(&self, mut callback: FrameCallback) -> CancelToken {
            let token = CancelToken::new();
            let slot: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));

            let loop_slot = Rc::clone(&slot);
            let loop_token = token.clone();
            let window = self.window.clone();
            let mut last_ms: Option<f64> = None;
            let mut frame = 0u64;

            *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp_ms: f64| {
                if loop_token.is_cancelled() {
                    // Dropping the closure breaks the Rc cycle.
                    let _ = loop_slot.borrow_mut().take();
                    return;
                }
                let tick = FrameTick {
                    timestamp_ms,
                    delta_ms: last_ms.map_or(NOMINAL_FRAME_MS, |last| timestamp_ms - last),
                    frame,
                };
                last_ms = Some(timestamp_ms);
                frame += 1;
                callback(tick);
                request(&window, &loop_slot);
            }) as Box<dyn FnMut(f64)>));

            request(&self.window, &slot);
            token
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_carry_timing() {
        let scheduler = ManualScheduler::new();
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        scheduler.run_every_frame(Box::new(move |tick| sink.borrow_mut().push(tick)));

        scheduler.advance(10.0);
        scheduler.advance(20.0);

        let ticks = ticks.borrow();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].frame, 0);
        assert_eq!(ticks[0].delta_ms, NOMINAL_FRAME_MS);
        assert_eq!(ticks[1].frame, 1);
        assert_eq!(ticks[1].timestamp_ms, 30.0);
        assert_eq!(ticks[1].delta_ms, 20.0);
    }

    #[test]
    fn test_cancel_from_inside_callback() {
        let scheduler = ManualScheduler::new();
        let count = Rc::new(Cell::new(0));
        let token_slot: Rc<RefCell<Option<CancelToken>>> = Rc::new(RefCell::new(None));

        let c = Rc::clone(&count);
        let slot = Rc::clone(&token_slot);
        let token = scheduler.run_every_frame(Box::new(move |_| {
            c.set(c.get() + 1);
            if c.get() == 3 {
                if let Some(token) = slot.borrow().as_ref() {
                    token.cancel();
                }
            }
        }));
        *token_slot.borrow_mut() = Some(token);

        for _ in 0..10 {
            scheduler.advance(16.0);
        }
        assert_eq!(count.get(), 3);
        assert_eq!(scheduler.active_loops(), 0);
    }

    #[test]
    fn test_guard_stops_loop_on_drop() {
        let scheduler = ManualScheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let guard = LoopGuard::new(scheduler.run_every_frame(Box::new(move |_| c.set(c.get() + 1))));

        scheduler.advance(16.0);
        drop(guard);
        scheduler.advance(16.0);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.active_loops(), 0);
    }

    #[test]
    fn test_schedule_from_inside_callback() {
        let scheduler = Rc::new(ManualScheduler::new());
        let inner_runs = Rc::new(Cell::new(0));

        let sched = Rc::clone(&scheduler);
        let runs = Rc::clone(&inner_runs);
        let mut spawned = false;
        scheduler.run_every_frame(Box::new(move |_| {
            if !spawned {
                spawned = true;
                let runs = Rc::clone(&runs);
                sched.run_every_frame(Box::new(move |_| runs.set(runs.get() + 1)));
            }
        }));

        scheduler.advance(16.0);
        assert_eq!(scheduler.active_loops(), 2);
        assert_eq!(inner_runs.get(), 0);

        scheduler.advance(16.0);
        assert_eq!(inner_runs.get(), 1);
    }
}
