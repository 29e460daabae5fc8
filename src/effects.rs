//! Declarative page effects driven through the [`Animator`].
//!
//! Each effect owns the targets it was created for, reacts to scroll
//! progress and pointer events, and undoes its styling on dispose.
//! Layout comes from a [`LayoutProbe`] at refresh time; effects never
//! query the page themselves.

use std::collections::HashMap;

use crate::animator::{Animator, Property, TargetId, Timeline, TweenSpec};
use crate::attributes::BloomMode;
use crate::config::NavigationOptions;
use crate::events::ScrollProgressEvent;
use crate::tween::{Easing, Repeat};
use crate::viewport::{ElementRect, Viewport};

/// Distance in pixels fade-in elements start below their resting place.
pub const FADE_DISTANCE: f64 = 40.0;

/// Scale reached by hovered images.
pub const BLOOM_HOVER_SCALE: f64 = 1.1;

/// Scale of scroll-driven images when they enter the viewport.
pub const BLOOM_SCROLL_SCALE: f64 = 1.2;

/// Seconds between successive title lines.
pub const TITLE_STAGGER: f64 = 0.1;

/// Seconds for a marquee track to travel half its width.
pub const DEFAULT_MARQUEE_DURATION: f64 = 20.0;

/// Source of element bounds in document coordinates.
pub trait LayoutProbe {
    fn bounds(&self, target: TargetId) -> Option<ElementRect>;
}

impl LayoutProbe for HashMap<TargetId, ElementRect> {
    fn bounds(&self, target: TargetId) -> Option<ElementRect> {
        self.get(&target).copied()
    }
}

/// A page effect bound to one or more targets.
pub trait Effect {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Effects that measure element positions against the scroll offset
    /// need the scroll-trigger capability.
    fn requires_scroll_trigger(&self) -> bool {
        false
    }

    /// Apply initial styles.
    fn setup(&mut self, _animator: &mut dyn Animator) {}

    /// Re-measure layout.
    fn refresh(&mut self, _probe: &dyn LayoutProbe) {}

    fn on_scroll(&mut self, _event: &ScrollProgressEvent, _viewport: &Viewport, _animator: &mut dyn Animator) {}

    fn on_pointer(&mut self, _target: TargetId, _entered: bool, _animator: &mut dyn Animator) {}

    /// Stop animations and restore resting styles.
    fn dispose(&mut self, animator: &mut dyn Animator);
}

/// Fade and rise into place the first time the element is in view.
#[derive(Clone, Debug)]
pub struct FadeIn {
    target: TargetId,
    delay: f64,
    bounds: Option<ElementRect>,
    revealed: bool,
}

impl FadeIn {
    /// Fade `target` in `delay` seconds after it enters view.
    pub fn new(target: TargetId, delay: f64) -> Self {
        Self {
            target,
            delay: delay.max(0.0),
            bounds: None,
            revealed: false,
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

impl Effect for FadeIn {
    fn name(&self) -> &'static str {
        "fade-in"
    }

    fn requires_scroll_trigger(&self) -> bool {
        true
    }

    fn setup(&mut self, animator: &mut dyn Animator) {
        animator.set(self.target, Property::Opacity, 0.0);
        animator.set(self.target, Property::Y, FADE_DISTANCE);
    }

    fn refresh(&mut self, probe: &dyn LayoutProbe) {
        self.bounds = probe.bounds(self.target);
    }

    fn on_scroll(&mut self, event: &ScrollProgressEvent, viewport: &Viewport, animator: &mut dyn Animator) {
        if self.revealed {
            return;
        }
        let Some(bounds) = self.bounds else {
            return;
        };
        if viewport.is_in_view(event.scroll_y, &bounds) {
            self.revealed = true;
            let spec = TweenSpec::to(1.0, 1.0).delay(self.delay).easing(Easing::PowerOut(2));
            animator.animate(self.target, Property::Opacity, spec);
            animator.animate(self.target, Property::Y, TweenSpec { to: 0.0, ..spec });
        }
    }

    fn dispose(&mut self, animator: &mut dyn Animator) {
        animator.kill_target(self.target);
        animator.set(self.target, Property::Opacity, 1.0);
        animator.set(self.target, Property::Y, 0.0);
    }
}

/// Headline whose lines slide up one after another when in view.
#[derive(Clone, Debug)]
pub struct TitleReveal {
    title: TargetId,
    lines: Vec<TargetId>,
    bounds: Option<ElementRect>,
    revealed: bool,
}

impl TitleReveal {
    /// Reveal `lines` of the headline `title` in order.
    pub fn new(title: TargetId, lines: Vec<TargetId>) -> Self {
        Self {
            title,
            lines,
            bounds: None,
            revealed: false,
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

impl Effect for TitleReveal {
    fn name(&self) -> &'static str {
        "title-reveal"
    }

    fn requires_scroll_trigger(&self) -> bool {
        true
    }

    fn setup(&mut self, animator: &mut dyn Animator) {
        for &line in &self.lines {
            animator.set(line, Property::YPercent, 100.0);
        }
    }

    fn refresh(&mut self, probe: &dyn LayoutProbe) {
        self.bounds = probe.bounds(self.title);
    }

    fn on_scroll(&mut self, event: &ScrollProgressEvent, viewport: &Viewport, animator: &mut dyn Animator) {
        if self.revealed || self.lines.is_empty() {
            return;
        }
        let Some(bounds) = self.bounds else {
            return;
        };
        if viewport.is_in_view(event.scroll_y, &bounds) {
            self.revealed = true;
            let spec = TweenSpec::to(0.0, 1.0).easing(Easing::PowerOut(4));
            let timeline = Timeline::new().stagger(&self.lines, Property::YPercent, spec, TITLE_STAGGER);
            animator.timeline(timeline);
        }
    }

    fn dispose(&mut self, animator: &mut dyn Animator) {
        for &line in &self.lines {
            animator.kill_target(line);
            animator.set(line, Property::YPercent, 0.0);
        }
    }
}

/// Vertical offset proportional to the element's progress through the
/// viewport.
#[derive(Clone, Debug)]
pub struct Parallax {
    target: TargetId,
    speed: f64,
    bounds: Option<ElementRect>,
}

impl Parallax {
    /// Drift `target` at `speed` times the viewport height.
    pub fn new(target: TargetId, speed: f64) -> Self {
        Self {
            target,
            speed,
            bounds: None,
        }
    }

    /// Offset in pixels for the given progress through the viewport.
    /// Zero when the element is centered.
    pub fn offset(speed: f64, progress: f64, viewport_height: f64) -> f64 {
        (0.5 - progress) * speed * viewport_height
    }
}

impl Effect for Parallax {
    fn name(&self) -> &'static str {
        "parallax"
    }

    fn requires_scroll_trigger(&self) -> bool {
        true
    }

    fn refresh(&mut self, probe: &dyn LayoutProbe) {
        self.bounds = probe.bounds(self.target);
    }

    fn on_scroll(&mut self, event: &ScrollProgressEvent, viewport: &Viewport, animator: &mut dyn Animator) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let progress = bounds.progress_through(event.scroll_y, viewport.height);
        animator.set(self.target, Property::Y, Self::offset(self.speed, progress, viewport.height));
    }

    fn dispose(&mut self, animator: &mut dyn Animator) {
        animator.kill_target(self.target);
        animator.set(self.target, Property::Y, 0.0);
    }
}

/// Image zoom on hover or while scrolling past.
#[derive(Clone, Debug)]
pub struct Bloom {
    target: TargetId,
    mode: BloomMode,
    bounds: Option<ElementRect>,
}

impl Bloom {
    /// Zoom `target` on hover or while scrolling past.
    pub fn new(target: TargetId, mode: BloomMode) -> Self {
        Self {
            target,
            mode,
            bounds: None,
        }
    }
}

impl Effect for Bloom {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn requires_scroll_trigger(&self) -> bool {
        self.mode == BloomMode::Scroll
    }

    fn refresh(&mut self, probe: &dyn LayoutProbe) {
        self.bounds = probe.bounds(self.target);
    }

    fn on_scroll(&mut self, event: &ScrollProgressEvent, viewport: &Viewport, animator: &mut dyn Animator) {
        if self.mode != BloomMode::Scroll {
            return;
        }
        let Some(bounds) = self.bounds else {
            return;
        };
        let progress = bounds.progress_through(event.scroll_y, viewport.height);
        let scale = BLOOM_SCROLL_SCALE - (BLOOM_SCROLL_SCALE - 1.0) * progress;
        animator.set(self.target, Property::Scale, scale);
    }

    fn on_pointer(&mut self, target: TargetId, entered: bool, animator: &mut dyn Animator) {
        if self.mode != BloomMode::Hover || target != self.target {
            return;
        }
        let scale = if entered { BLOOM_HOVER_SCALE } else { 1.0 };
        animator.animate(
            self.target,
            Property::Scale,
            TweenSpec::to(scale, 0.8).easing(Easing::PowerOut(2)),
        );
    }

    fn dispose(&mut self, animator: &mut dyn Animator) {
        animator.kill_target(self.target);
        animator.set(self.target, Property::Scale, 1.0);
    }
}

/// Endless horizontal loop of a duplicated track.
#[derive(Clone, Debug)]
pub struct Marquee {
    track: TargetId,
    duration: f64,
}

impl Marquee {
    /// Scroll `track` left once every `duration` seconds.
    pub fn new(track: TargetId, duration: f64) -> Self {
        Self {
            track,
            duration: if duration > 0.0 { duration } else { DEFAULT_MARQUEE_DURATION },
        }
    }
}

impl Effect for Marquee {
    fn name(&self) -> &'static str {
        "marquee"
    }

    fn setup(&mut self, animator: &mut dyn Animator) {
        let spec = TweenSpec::from_to(0.0, -50.0, self.duration)
            .easing(Easing::Linear)
            .repeat(Repeat::Forever);
        animator.animate(self.track, Property::XPercent, spec);
    }

    fn dispose(&mut self, animator: &mut dyn Animator) {
        animator.kill_target(self.track);
        animator.set(self.track, Property::XPercent, 0.0);
    }
}

/// Underline that wipes in on hover and out the other side on leave.
#[derive(Clone, Debug)]
pub struct LinkHover {
    link: TargetId,
    underline: TargetId,
}

impl LinkHover {
    /// Slide `underline` in and out when `link` is hovered.
    pub fn new(link: TargetId, underline: TargetId) -> Self {
        Self { link, underline }
    }
}

impl Effect for LinkHover {
    fn name(&self) -> &'static str {
        "link-hover"
    }

    fn setup(&mut self, animator: &mut dyn Animator) {
        animator.set(self.underline, Property::XPercent, -100.0);
    }

    fn on_pointer(&mut self, target: TargetId, entered: bool, animator: &mut dyn Animator) {
        if target != self.link {
            return;
        }
        let spec = if entered {
            TweenSpec::from_to(-100.0, 0.0, 0.4)
        } else {
            TweenSpec::to(100.0, 0.4)
        };
        animator.animate(self.underline, Property::XPercent, spec.easing(Easing::PowerOut(3)));
    }

    fn dispose(&mut self, animator: &mut dyn Animator) {
        animator.kill_target(self.underline);
        animator.set(self.underline, Property::XPercent, 0.0);
    }
}

/// Navigation bar that hides while scrolling down and an overlay menu.
#[derive(Clone, Debug)]
pub struct Navigation {
    bar: TargetId,
    menu: Option<TargetId>,
    menu_links: Vec<TargetId>,
    options: NavigationOptions,
    hidden: bool,
    open: bool,
    last_scroll_y: f64,
}

impl Navigation {
    /// Navigation bar with no menu attached.
    pub fn new(bar: TargetId, options: NavigationOptions) -> Self {
        Self {
            bar,
            menu: None,
            menu_links: Vec::new(),
            options,
            hidden: false,
            open: false,
            last_scroll_y: 0.0,
        }
    }

    /// Attach the overlay menu and the links inside it.
    pub fn with_menu(mut self, menu: TargetId, links: Vec<TargetId>) -> Self {
        self.menu = Some(menu);
        self.menu_links = links;
        self
    }

    /// Apply the closed-menu styles.
    pub fn setup(&mut self, animator: &mut dyn Animator) {
        if let Some(menu) = self.menu {
            animator.set(menu, Property::XPercent, 100.0);
            for &link in &self.menu_links {
                animator.set(link, Property::Opacity, 0.0);
            }
        }
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn show(&mut self, animator: &mut dyn Animator) {
        if self.hidden {
            self.hidden = false;
            animator.animate(self.bar, Property::YPercent, TweenSpec::to(0.0, 0.4).easing(Easing::PowerOut(2)));
        }
    }

    fn hide(&mut self, animator: &mut dyn Animator) {
        if !self.hidden {
            self.hidden = true;
            animator.animate(self.bar, Property::YPercent, TweenSpec::to(-100.0, 0.4).easing(Easing::PowerOut(2)));
        }
    }

    /// Hide the bar when scrolling down past the threshold, show it when scrolling up.
    pub fn on_scroll(&mut self, event: &ScrollProgressEvent, animator: &mut dyn Animator) {
        let delta = event.scroll_y - self.last_scroll_y;
        self.last_scroll_y = event.scroll_y;

        if !self.options.hide_on_scroll || self.open {
            return;
        }
        if event.scroll_y <= self.options.threshold || delta < 0.0 {
            self.show(animator);
        } else if delta > 0.0 {
            self.hide(animator);
        }
    }

    /// Open or close the overlay. Returns the new open state.
    pub fn toggle(&mut self, animator: &mut dyn Animator) -> bool {
        let Some(menu) = self.menu else {
            return false;
        };
        self.open = !self.open;
        animator.kill_target(menu);
        if self.open {
            self.show(animator);
            let slide = TweenSpec::to(0.0, 0.8).easing(Easing::ExpoInOut);
            let fade = TweenSpec::from_to(0.0, 1.0, 0.5).easing(Easing::PowerOut(2));
            let timeline = Timeline::new()
                .then(menu, Property::XPercent, slide)
                .stagger(&self.menu_links, Property::Opacity, fade, 0.08);
            animator.timeline(timeline);
        } else {
            for &link in &self.menu_links {
                animator.kill_target(link);
                animator.set(link, Property::Opacity, 0.0);
            }
            animator.animate(menu, Property::XPercent, TweenSpec::to(100.0, 0.6).easing(Easing::ExpoInOut));
        }
        self.open
    }

    /// Reset every style the bar touched.
    pub fn dispose(&mut self, animator: &mut dyn Animator) {
        animator.kill_target(self.bar);
        animator.set(self.bar, Property::YPercent, 0.0);
        if let Some(menu) = self.menu {
            animator.kill_target(menu);
            animator.set(menu, Property::XPercent, 100.0);
        }
        for &link in &self.menu_links {
            animator.kill_target(link);
        }
        self.hidden = false;
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::TweenAnimator;

    fn event(scroll_y: f64) -> ScrollProgressEvent {
        ScrollProgressEvent::new(scroll_y, 5000.0)
    }

    fn settle(animator: &mut TweenAnimator) {
        for _ in 0..300 {
            animator.advance(1.0 / 60.0);
        }
    }

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 1000.0,
        device_pixel_ratio: 1.0,
        touch: false,
    };

    #[test]
    fn test_fade_in_reveals_once() {
        let target = TargetId(1);
        let mut animator = TweenAnimator::new();
        let mut fade = FadeIn::new(target, 0.0);
        fade.setup(&mut animator);
        assert_eq!(animator.value(target, Property::Opacity), 0.0);
        assert_eq!(animator.value(target, Property::Y), FADE_DISTANCE);

        let probe = HashMap::from([(target, ElementRect::new(2000.0, 400.0))]);
        fade.refresh(&probe);

        fade.on_scroll(&event(0.0), &VIEWPORT, &mut animator);
        assert!(!fade.is_revealed());
        assert!(!animator.is_animating());

        fade.on_scroll(&event(1500.0), &VIEWPORT, &mut animator);
        assert!(fade.is_revealed());
        settle(&mut animator);
        assert_eq!(animator.value(target, Property::Opacity), 1.0);
        assert_eq!(animator.value(target, Property::Y), 0.0);

        // Scrolling away and back does not replay
        fade.on_scroll(&event(0.0), &VIEWPORT, &mut animator);
        fade.on_scroll(&event(1500.0), &VIEWPORT, &mut animator);
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_fade_in_without_bounds_stays_hidden() {
        let target = TargetId(1);
        let mut animator = TweenAnimator::new();
        let mut fade = FadeIn::new(target, 0.0);
        fade.setup(&mut animator);
        fade.on_scroll(&event(1500.0), &VIEWPORT, &mut animator);
        assert!(!fade.is_revealed());

        fade.dispose(&mut animator);
        assert_eq!(animator.value(target, Property::Opacity), 1.0);
    }

    #[test]
    fn test_title_lines_stagger() {
        let title = TargetId(10);
        let lines = vec![TargetId(11), TargetId(12), TargetId(13)];
        let mut animator = TweenAnimator::new();
        let mut reveal = TitleReveal::new(title, lines.clone());
        reveal.setup(&mut animator);
        reveal.refresh(&HashMap::from([(title, ElementRect::new(100.0, 200.0))]));

        reveal.on_scroll(&event(0.0), &VIEWPORT, &mut animator);
        assert!(reveal.is_revealed());

        animator.advance(0.05);
        // Only the first line has started moving
        assert!(animator.value(lines[0], Property::YPercent) < 100.0);
        assert_eq!(animator.value(lines[2], Property::YPercent), 100.0);

        settle(&mut animator);
        for line in lines {
            assert_eq!(animator.value(line, Property::YPercent), 0.0);
        }
    }

    #[test]
    fn test_parallax_offset() {
        assert_eq!(Parallax::offset(0.2, 0.5, 1000.0), 0.0);
        assert_eq!(Parallax::offset(0.2, 0.0, 1000.0), 100.0);
        assert_eq!(Parallax::offset(0.2, 1.0, 1000.0), -100.0);

        let target = TargetId(3);
        let mut animator = TweenAnimator::new();
        let mut parallax = Parallax::new(target, 0.2);
        parallax.refresh(&HashMap::from([(target, ElementRect::new(1000.0, 1000.0))]));
        // Halfway through: (1000 + 1000 - 1000) / 2000
        parallax.on_scroll(&event(1000.0), &VIEWPORT, &mut animator);
        assert_eq!(animator.value(target, Property::Y), 0.0);
    }

    #[test]
    fn test_bloom_hover() {
        let target = TargetId(4);
        let mut animator = TweenAnimator::new();
        let mut bloom = Bloom::new(target, BloomMode::Hover);
        assert!(!bloom.requires_scroll_trigger());

        bloom.on_pointer(TargetId(99), true, &mut animator);
        assert!(!animator.is_animating());

        bloom.on_pointer(target, true, &mut animator);
        settle(&mut animator);
        assert!((animator.value(target, Property::Scale) - BLOOM_HOVER_SCALE).abs() < 1e-9);

        bloom.on_pointer(target, false, &mut animator);
        settle(&mut animator);
        assert!((animator.value(target, Property::Scale) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bloom_scroll() {
        let target = TargetId(5);
        let mut animator = TweenAnimator::new();
        let mut bloom = Bloom::new(target, BloomMode::Scroll);
        assert!(bloom.requires_scroll_trigger());
        bloom.refresh(&HashMap::from([(target, ElementRect::new(1000.0, 0.0))]));

        bloom.on_scroll(&event(0.0), &VIEWPORT, &mut animator);
        assert!((animator.value(target, Property::Scale) - BLOOM_SCROLL_SCALE).abs() < 1e-9);
        bloom.on_scroll(&event(1000.0), &VIEWPORT, &mut animator);
        assert!((animator.value(target, Property::Scale) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_marquee_loops() {
        let track = TargetId(6);
        let mut animator = TweenAnimator::new();
        let mut marquee = Marquee::new(track, 10.0);
        marquee.setup(&mut animator);

        animator.advance(5.0);
        assert_eq!(animator.value(track, Property::XPercent), -25.0);
        animator.advance(10.0);
        assert_eq!(animator.value(track, Property::XPercent), -25.0);

        marquee.dispose(&mut animator);
        assert!(!animator.is_animating());
        assert_eq!(animator.value(track, Property::XPercent), 0.0);
    }

    #[test]
    fn test_link_hover() {
        let link = TargetId(7);
        let line = TargetId(8);
        let mut animator = TweenAnimator::new();
        let mut hover = LinkHover::new(link, line);
        hover.setup(&mut animator);
        assert_eq!(animator.value(line, Property::XPercent), -100.0);

        hover.on_pointer(link, true, &mut animator);
        settle(&mut animator);
        assert_eq!(animator.value(line, Property::XPercent), 0.0);

        hover.on_pointer(link, false, &mut animator);
        settle(&mut animator);
        assert_eq!(animator.value(line, Property::XPercent), 100.0);
    }

    #[test]
    fn test_navigation_hides_on_scroll_down() {
        let bar = TargetId(20);
        let mut animator = TweenAnimator::new();
        let mut nav = Navigation::new(bar, NavigationOptions::default());

        nav.on_scroll(&event(50.0), &mut animator);
        assert!(!nav.is_hidden());

        nav.on_scroll(&event(300.0), &mut animator);
        assert!(nav.is_hidden());
        settle(&mut animator);
        assert_eq!(animator.value(bar, Property::YPercent), -100.0);

        nav.on_scroll(&event(250.0), &mut animator);
        assert!(!nav.is_hidden());

        nav.on_scroll(&event(400.0), &mut animator);
        assert!(nav.is_hidden());
        // Back above the threshold always shows
        nav.on_scroll(&event(90.0), &mut animator);
        assert!(!nav.is_hidden());
    }

    #[test]
    fn test_navigation_hide_disabled() {
        let mut animator = TweenAnimator::new();
        let options = NavigationOptions {
            hide_on_scroll: false,
            threshold: 100.0,
        };
        let mut nav = Navigation::new(TargetId(20), options);
        nav.on_scroll(&event(300.0), &mut animator);
        nav.on_scroll(&event(900.0), &mut animator);
        assert!(!nav.is_hidden());
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_navigation_menu_toggle() {
        let bar = TargetId(20);
        let menu = TargetId(21);
        let links = vec![TargetId(22), TargetId(23)];
        let mut animator = TweenAnimator::new();
        let mut nav = Navigation::new(bar, NavigationOptions::default()).with_menu(menu, links.clone());
        nav.setup(&mut animator);
        assert_eq!(animator.value(menu, Property::XPercent), 100.0);

        assert!(nav.toggle(&mut animator));
        settle(&mut animator);
        assert_eq!(animator.value(menu, Property::XPercent), 0.0);
        assert_eq!(animator.value(links[1], Property::Opacity), 1.0);

        // Never hides while open
        nav.on_scroll(&event(600.0), &mut animator);
        nav.on_scroll(&event(900.0), &mut animator);
        assert!(!nav.is_hidden());

        assert!(!nav.toggle(&mut animator));
        settle(&mut animator);
        assert_eq!(animator.value(menu, Property::XPercent), 100.0);
        assert_eq!(animator.value(links[0], Property::Opacity), 0.0);
    }

    #[test]
    fn test_navigation_without_menu() {
        let mut animator = TweenAnimator::new();
        let mut nav = Navigation::new(TargetId(20), NavigationOptions::default());
        assert!(!nav.toggle(&mut animator));
        assert!(!nav.is_open());
    }
}
