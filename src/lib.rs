//! # exo-motion
//!
//! Scroll-linked motion core for marketing pages.
//!
//! This crate provides platform-agnostic state and logic for:
//! - Smoothed virtual scrolling with clamped targets and progress events
//! - Scroll-scrubbed canvas frame sequences with cover-fit drawing
//! - Declarative page effects (reveals, parallax, zoom, marquee, navigation)
//!   driven through an injectable [`Animator`]
//! - Frame scheduling with explicit cancellation
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for options and events
//! - `toml` - Load [`Options`] from TOML
//! - `web` - Enable the browser runtime (DOM listeners, canvas,
//!   `requestAnimationFrame`, the `ExoMotion` wasm handle, `tracing` output
//!   in the browser console)
//! - `console_error_panic_hook` - Forward panics to the browser console
//!
//! ## Example
//!
//! ```rust
//! use exo_motion::{frame_index_for, ScrollKey, SmoothScrollOptions, Viewport, VirtualScroll};
//!
//! let mut engine = VirtualScroll::new(&SmoothScrollOptions::default());
//! engine.start(Viewport::new(1440.0, 900.0), 10_900.0);
//! engine.on_key(ScrollKey::End);
//!
//! for _ in 0..10 {
//!     engine.tick();
//! }
//! let progress = engine.tick().unwrap().progress;
//! let frame = frame_index_for(progress, 150);
//! assert!(frame > 0 && frame < 150);
//! ```

mod animator;
pub mod attributes;
mod config;
mod context;
pub mod effects;
mod error;
mod events;
mod input;
mod loader;
mod logging;
mod player;
mod scheduler;
mod scroll;
mod sizing;
mod tween;
mod viewport;

pub use animator::{
    AnimationHandle, Animator, Property, PropertyWrite, StyleState, TargetId, Timeline, TimelineStep, TweenAnimator,
    TweenSpec,
};
pub use config::{NavigationOptions, Options, SmoothScrollOptions};
pub use context::{Capabilities, MotionContext};
pub use effects::{Effect, LayoutProbe};
pub use error::{MotionError, MotionResult};
pub use events::{ListenerId, ProgressBus, ScrollProgressEvent, SCROLL_EVENT};
pub use input::{KeyMotion, ScrollKey, TouchTracker};
pub use loader::{FrameSequence, FrameSource, FrameStatus, LoadingPhase, SettleProgress};
pub use player::{frame_index_for, FramePlayer, FrameSurface};
pub use scheduler::{CancelToken, FrameCallback, FrameScheduler, FrameTick, LoopGuard, ManualScheduler};
pub use scroll::{EngineState, ResizeOutcome, ScrollState, VirtualScroll};
pub use sizing::{cover_fit, CanvasSize, DrawRect};
pub use tween::{Easing, Repeat, Tween};
pub use viewport::{ElementRect, Viewport};

#[cfg(feature = "web")]
pub use animator::web::StyleAnimator;
#[cfg(feature = "web")]
pub use context::web::ExoMotion;
#[cfg(feature = "web")]
pub use events::web::dispatch_scroll_event;
#[cfg(feature = "web")]
pub use player::web::{start_canvas_player, CanvasPlayer, CanvasSurface};
#[cfg(feature = "web")]
pub use scheduler::web::RafScheduler;
