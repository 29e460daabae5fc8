//! The animation capability the motion layer drives.
//!
//! Effects never touch styles directly. They describe what should move
//! through the [`Animator`] trait, and whoever owns the animator decides
//! how property writes reach the page. [`TweenAnimator`] is the built-in
//! deterministic implementation; the `web` submodule wraps it with inline
//! style output.

use std::collections::HashMap;

use crate::tween::{Easing, Repeat, Tween};

/// Handle identifying an animated element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

impl TargetId {
    /// Pseudo-target for the virtual scroll position.
    pub const SCROLL: TargetId = TargetId(u32::MAX);
}

/// An animatable property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Opacity,
    /// Horizontal offset in pixels
    X,
    /// Vertical offset in pixels
    Y,
    /// Horizontal offset as a percentage of the element's width
    XPercent,
    /// Vertical offset as a percentage of the element's height
    YPercent,
    Scale,
    /// The virtual scroll engine's target offset
    ScrollTarget,
}

impl Property {
    /// Value assumed when nothing has been written yet.
    pub fn initial_value(self) -> f64 {
        match self {
            Property::Opacity | Property::Scale => 1.0,
            _ => 0.0,
        }
    }
}

/// A single value written to a target's property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyWrite {
    pub target: TargetId,
    pub property: Property,
    pub value: f64,
}

/// Handle to a running tween or timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationHandle(u64);

/// Declarative description of one property animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenSpec {
    /// Start value; `None` starts from the current value
    pub from: Option<f64>,
    pub to: f64,
    /// Seconds
    pub duration: f64,
    /// Seconds
    pub delay: f64,
    pub easing: Easing,
    pub repeat: Repeat,
}

impl TweenSpec {
    /// Animate to `to` over `duration` seconds with the default easing.
    pub fn to(to: f64, duration: f64) -> Self {
        Self {
            from: None,
            to,
            duration,
            delay: 0.0,
            easing: Easing::default(),
            repeat: Repeat::Once,
        }
    }

    /// Animate from an explicit start value.
    pub fn from_to(from: f64, to: f64, duration: f64) -> Self {
        Self {
            from: Some(from),
            ..Self::to(to, duration)
        }
    }

    /// Easing curve, `Linear` by default.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Seconds to wait before starting.
    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// Repeat mode.
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }
}

/// One step of a [`Timeline`], starting `offset` seconds into it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineStep {
    pub target: TargetId,
    pub property: Property,
    pub spec: TweenSpec,
    pub offset: f64,
}

/// A sequence of property animations sharing one clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
    cursor: f64,
}

impl Timeline {
    /// An empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step that starts when the previous step ends.
    pub fn then(mut self, target: TargetId, property: Property, spec: TweenSpec) -> Self {
        let offset = self.cursor;
        self.cursor = offset + spec.delay.max(0.0) + spec.duration.max(0.0);
        self.steps.push(TimelineStep {
            target,
            property,
            spec,
            offset,
        });
        self
    }

    /// Animate several targets with the same spec, each starting `stagger`
    /// seconds after the previous one, beginning at the cursor.
    pub fn stagger(mut self, targets: &[TargetId], property: Property, spec: TweenSpec, stagger: f64) -> Self {
        let start = self.cursor;
        let mut end = start;
        for (i, &target) in targets.iter().enumerate() {
            let offset = start + stagger.max(0.0) * i as f64;
            end = end.max(offset + spec.delay.max(0.0) + spec.duration.max(0.0));
            self.steps.push(TimelineStep {
                target,
                property,
                spec,
                offset,
            });
        }
        self.cursor = end;
        self
    }

    /// Steps in insertion order.
    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// Total length of the timeline in seconds.
    pub fn duration(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| s.offset + s.spec.delay.max(0.0) + s.spec.duration.max(0.0))
            .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Capability for setting and animating element properties.
///
/// Implementations accumulate work and emit it from [`Animator::advance`],
/// which the owner calls once per frame.
pub trait Animator {
    /// Write a value immediately.
    fn set(&mut self, target: TargetId, property: Property, value: f64);

    /// Animate one property. A newer animation of the same property on the
    /// same target replaces the older one.
    fn animate(&mut self, target: TargetId, property: Property, spec: TweenSpec) -> AnimationHandle;

    /// Start a sequenced timeline.
    fn timeline(&mut self, timeline: Timeline) -> AnimationHandle;

    /// Stop an animation, leaving properties at their current values.
    fn kill(&mut self, handle: AnimationHandle);

    /// Stop every animation touching `target`.
    fn kill_target(&mut self, target: TargetId);

    /// Move all animations forward by `dt` seconds and return the writes
    /// produced since the last call.
    fn advance(&mut self, dt: f64) -> Vec<PropertyWrite>;

    /// Whether any animation is still running.
    fn is_animating(&self) -> bool;
}

#[derive(Clone, Debug)]
struct Track {
    handle: AnimationHandle,
    target: TargetId,
    property: Property,
    tween: Tween,
    from_resolved: bool,
    /// Part of a timeline rather than a standalone tween
    sequenced: bool,
}

/// Deterministic in-memory animator.
///
/// ```rust
/// use exo_motion::{Animator, Property, TargetId, TweenAnimator, TweenSpec, Easing};
///
/// let mut animator = TweenAnimator::new();
/// let card = TargetId(1);
/// animator.animate(card, Property::Opacity, TweenSpec::from_to(0.0, 1.0, 1.0).easing(Easing::Linear));
///
/// let writes = animator.advance(0.5);
/// assert_eq!(writes[0].value, 0.5);
/// assert_eq!(animator.value(card, Property::Opacity), 0.5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TweenAnimator {
    values: HashMap<(TargetId, Property), f64>,
    tracks: Vec<Track>,
    pending: Vec<PropertyWrite>,
    next_handle: u64,
}

impl TweenAnimator {
    /// An animator with no registered targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to a property, or its initial value.
    pub fn value(&self, target: TargetId, property: Property) -> f64 {
        self.values
            .get(&(target, property))
            .copied()
            .unwrap_or_else(|| property.initial_value())
    }

    /// Number of running tracks (timeline steps count individually).
    pub fn active_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether a handle still has running tracks.
    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        self.tracks.iter().any(|t| t.handle == handle)
    }

    fn allocate(&mut self) -> AnimationHandle {
        self.next_handle += 1;
        AnimationHandle(self.next_handle)
    }

    fn push_track(&mut self, handle: AnimationHandle, target: TargetId, property: Property, spec: &TweenSpec, offset: f64, sequenced: bool) {
        let tween = Tween::new(spec.from.unwrap_or(0.0), spec.to, spec.duration, spec.easing)
            .with_delay(offset + spec.delay.max(0.0))
            .with_repeat(spec.repeat);
        self.tracks.push(Track {
            handle,
            target,
            property,
            tween,
            from_resolved: spec.from.is_some(),
            sequenced,
        });
    }
}

impl Animator for TweenAnimator {
    fn set(&mut self, target: TargetId, property: Property, value: f64) {
        self.values.insert((target, property), value);
        self.pending.push(PropertyWrite {
            target,
            property,
            value,
        });
    }

    fn animate(&mut self, target: TargetId, property: Property, spec: TweenSpec) -> AnimationHandle {
        // Overwrite standalone tweens on the same property; timelines keep theirs.
        self.tracks
            .retain(|t| t.sequenced || t.target != target || t.property != property);
        let handle = self.allocate();
        self.push_track(handle, target, property, &spec, 0.0, false);
        handle
    }

    fn timeline(&mut self, timeline: Timeline) -> AnimationHandle {
        let handle = self.allocate();
        for step in timeline.steps() {
            self.push_track(handle, step.target, step.property, &step.spec, step.offset, true);
        }
        handle
    }

    fn kill(&mut self, handle: AnimationHandle) {
        self.tracks.retain(|t| t.handle != handle);
    }

    fn kill_target(&mut self, target: TargetId) {
        self.tracks.retain(|t| t.target != target);
    }

    fn advance(&mut self, dt: f64) -> Vec<PropertyWrite> {
        let mut writes = std::mem::take(&mut self.pending);

        for track in &mut self.tracks {
            track.tween.advance(dt);
            if !track.tween.has_started() {
                continue;
            }
            let key = (track.target, track.property);
            if !track.from_resolved {
                track.tween.from = self
                    .values
                    .get(&key)
                    .copied()
                    .unwrap_or_else(|| track.property.initial_value());
                track.from_resolved = true;
            }
            let value = track.tween.value();
            self.values.insert(key, value);
            writes.push(PropertyWrite {
                target: track.target,
                property: track.property,
                value,
            });
        }

        self.tracks.retain(|t| !t.tween.is_finished());
        writes
    }

    fn is_animating(&self) -> bool {
        !self.tracks.is_empty()
    }
}

/// Accumulated transform and opacity state for one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleState {
    pub opacity: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub scale: f64,
    has_transform: bool,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            opacity: None,
            x: 0.0,
            y: 0.0,
            x_percent: 0.0,
            y_percent: 0.0,
            scale: 1.0,
            has_transform: false,
        }
    }
}

impl StyleState {
    /// Fold a property write into the state. Returns false for properties
    /// that do not map to element styles.
    pub fn apply(&mut self, property: Property, value: f64) -> bool {
        match property {
            Property::Opacity => {
                self.opacity = Some(value.clamp(0.0, 1.0));
                return true;
            }
            Property::X => self.x = value,
            Property::Y => self.y = value,
            Property::XPercent => self.x_percent = value,
            Property::YPercent => self.y_percent = value,
            Property::Scale => self.scale = value,
            Property::ScrollTarget => return false,
        }
        self.has_transform = true;
        true
    }

    /// CSS `transform` value, or `None` when no transform was ever written.
    ///
    /// ```rust
    /// use exo_motion::{Property, StyleState};
    ///
    /// let mut style = StyleState::default();
    /// style.apply(Property::YPercent, 100.0);
    /// style.apply(Property::Scale, 1.1);
    /// assert_eq!(
    ///     style.transform_css().as_deref(),
    ///     Some("translate(0%, 100%) translate3d(0px, 0px, 0px) scale(1.1)")
    /// );
    /// ```
    pub fn transform_css(&self) -> Option<String> {
        if !self.has_transform {
            return None;
        }
        Some(format!(
            "translate({}%, {}%) translate3d({}px, {}px, 0px) scale({})",
            round3(self.x_percent),
            round3(self.y_percent),
            round3(self.x),
            round3(self.y),
            round3(self.scale)
        ))
    }

    /// CSS `opacity` value, if one was written.
    pub fn opacity_css(&self) -> Option<String> {
        self.opacity.map(|o| round3(o).to_string())
    }

    /// Inline style properties to write, skipping ones never touched.
    pub fn css_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = Vec::with_capacity(2);
        if let Some(transform) = self.transform_css() {
            props.push(("transform", transform));
        }
        if let Some(opacity) = self.opacity_css() {
            props.push(("opacity", opacity));
        }
        props
    }
}

fn round3(v: f64) -> f64 {
    let r = (v * 1000.0).round() / 1000.0;
    // Avoid printing "-0"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Web-specific animator writing inline styles.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use web_sys::HtmlElement;

    /// [`TweenAnimator`] that applies its writes to registered elements.
    ///
    /// Writes to [`Property::ScrollTarget`] and to unregistered targets are
    /// passed through untouched for the caller to route.
    #[derive(Debug, Default)]
    pub struct StyleAnimator {
        inner: TweenAnimator,
        elements: HashMap<TargetId, (HtmlElement, StyleState)>,
        next_target: u32,
    }

    impl StyleAnimator {
        /// A style animator with no registered elements.
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an element and get its target handle.
        pub fn register(&mut self, element: HtmlElement) -> TargetId {
            let id = TargetId(self.next_target);
            self.next_target += 1;
            self.elements.insert(id, (element, StyleState::default()));
            id
        }

        /// Every registered element with its handle.
        pub fn elements(&self) -> impl Iterator<Item = (TargetId, &HtmlElement)> + '_ {
            self.elements.iter().map(|(id, (el, _))| (*id, el))
        }

        /// Remove inline styles written by this animator and forget all
        /// registered elements.
        pub fn clear(&mut self) {
            for (target, (element, _)) in self.elements.drain() {
                self.inner.kill_target(target);
                let style = element.style();
                for name in ["transform", "opacity"] {
                    if let Err(err) = style.remove_property(name) {
                        tracing::debug!("{} not removed from target {}: {:?}", name, target.0, err);
                    }
                }
            }
        }

        fn write_styles(&mut self, writes: &[PropertyWrite]) {
            let mut touched = Vec::new();
            for write in writes {
                if let Some((_, state)) = self.elements.get_mut(&write.target) {
                    if state.apply(write.property, write.value) && !touched.contains(&write.target) {
                        touched.push(write.target);
                    }
                }
            }
            for target in touched {
                if let Some((element, state)) = self.elements.get(&target) {
                    let style = element.style();
                    for (name, value) in state.css_properties() {
                        if let Err(err) = style.set_property(name, &value) {
                            tracing::debug!("{} not applied to target {}: {:?}", name, target.0, err);
                        }
                    }
                }
            }
        }
    }

    impl Animator for StyleAnimator {
        fn set(&mut self, target: TargetId, property: Property, value: f64) {
            self.inner.set(target, property, value);
        }

        fn animate(&mut self, target: TargetId, property: Property, spec: TweenSpec) -> AnimationHandle {
            self.inner.animate(target, property, spec)
        }

        fn timeline(&mut self, timeline: Timeline) -> AnimationHandle {
            self.inner.timeline(timeline)
        }

        fn kill(&mut self, handle: AnimationHandle) {
            self.inner.kill(handle);
        }

        fn kill_target(&mut self, target: TargetId) {
            self.inner.kill_target(target);
        }

        fn advance(&mut self, dt: f64) -> Vec<PropertyWrite> {
            let writes = self.inner.advance(dt);
            self.write_styles(&writes);
            writes
        }

        fn is_animating(&self) -> bool {
            self.inner.is_animating()
        }
    }
}
