//! Page-level lifecycle: one context owns the animator, the scroll engine,
//! the progress bus and every live effect.

use crate::animator::{AnimationHandle, Animator, Property, TargetId};
use crate::config::Options;
use crate::effects::{Effect, LayoutProbe, Navigation};
use crate::error::{MotionError, MotionResult};
use crate::events::{ListenerId, ProgressBus, ScrollProgressEvent};
use crate::input::ScrollKey;
use crate::scheduler::FrameTick;
use crate::scroll::{ResizeOutcome, VirtualScroll, DEFAULT_SCROLL_TO_DURATION};
use crate::viewport::Viewport;

/// Optional capabilities detected once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Element bounds can be measured against the scroll offset. Effects
    /// that need it are skipped when it is missing.
    pub scroll_trigger: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { scroll_trigger: true }
    }
}

/// Owner of everything the motion layer does on one page.
///
/// ```rust
/// use exo_motion::{Capabilities, FrameTick, MotionContext, Options, ScrollKey, TweenAnimator, Viewport};
///
/// let mut ctx = MotionContext::new(
///     Options::default(),
///     Capabilities::default(),
///     Some(TweenAnimator::new()),
///     Viewport::new(1280.0, 800.0),
/// )
/// .unwrap();
/// ctx.init(1800.0);
///
/// ctx.on_key(ScrollKey::End);
/// let event = ctx.frame(FrameTick::default()).unwrap();
/// assert_eq!(event.scroll_y, 100.0);
/// ```
pub struct MotionContext<A: Animator> {
    options: Options,
    capabilities: Capabilities,
    animator: A,
    engine: VirtualScroll,
    bus: ProgressBus,
    effects: Vec<Box<dyn Effect>>,
    navigation: Option<Navigation>,
    viewport: Viewport,
    document_height: f64,
    native_scroll_y: f64,
    initialized: bool,
    destroyed: bool,
}

impl<A: Animator> std::fmt::Debug for MotionContext<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionContext")
            .field("options", &self.options)
            .field("engine", &self.engine.status())
            .field("effects", &self.effects.len())
            .field("initialized", &self.initialized)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl<A: Animator> MotionContext<A> {
    /// Create the context. Fails without an animator; nothing is applied
    /// to the page in that case.
    pub fn new(options: Options, capabilities: Capabilities, animator: Option<A>, viewport: Viewport) -> MotionResult<Self> {
        let Some(animator) = animator else {
            tracing::error!("animation engine missing, motion effects disabled");
            return Err(MotionError::MissingAnimator);
        };
        let engine = VirtualScroll::new(&options.smooth_scroll);
        Ok(Self {
            options,
            capabilities,
            animator,
            engine,
            bus: ProgressBus::new(),
            effects: Vec::new(),
            navigation: None,
            viewport,
            document_height: viewport.height,
            native_scroll_y: 0.0,
            initialized: false,
            destroyed: false,
        })
    }

    /// Start the scroll engine unless disabled or on mobile.
    ///
    /// Without the engine, the last known native offset is broadcast right
    /// away so content already on screen is revealed. Returns false if
    /// already initialized or destroyed.
    pub fn init(&mut self, document_height: f64) -> bool {
        if self.initialized || self.destroyed {
            return false;
        }
        self.initialized = true;
        self.document_height = document_height;
        if self.options.smooth_scroll_enabled() {
            self.engine.start(self.viewport, document_height);
        }
        tracing::info!(
            smooth_scroll = self.engine.is_running(),
            effects = self.effects.len(),
            "motion initialized"
        );
        self.on_native_scroll(self.native_scroll_y);
        true
    }

    /// Register an effect and apply its initial styles.
    ///
    /// Returns false when the effect needs a missing capability.
    pub fn add_effect(&mut self, mut effect: Box<dyn Effect>) -> bool {
        if self.destroyed {
            return false;
        }
        if effect.requires_scroll_trigger() && !self.capabilities.scroll_trigger {
            tracing::debug!(effect = effect.name(), "scroll trigger unavailable, effect skipped");
            return false;
        }
        effect.setup(&mut self.animator);
        self.effects.push(effect);
        true
    }

    /// Install the navigation bar and apply its initial styles.
    pub fn set_navigation(&mut self, mut navigation: Navigation) {
        navigation.setup(&mut self.animator);
        self.navigation = Some(navigation);
    }

    /// Open or close the navigation overlay. Returns the new open state.
    pub fn toggle_menu(&mut self) -> bool {
        match self.navigation.as_mut() {
            Some(nav) => nav.toggle(&mut self.animator),
            None => false,
        }
    }

    /// Receive every progress event broadcast from now on.
    pub fn subscribe(&mut self, listener: impl FnMut(&ScrollProgressEvent) + 'static) -> ListenerId {
        self.bus.subscribe(listener)
    }

    /// Stop delivering progress events to a listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Forward a wheel delta. Returns true when the engine consumed it and
    /// the native scroll should be suppressed.
    pub fn on_wheel(&mut self, delta_y: f64) -> bool {
        if !self.engine.is_running() {
            return false;
        }
        self.engine.on_wheel(delta_y);
        true
    }

    /// Forward a touch drag delta. Returns true when consumed.
    pub fn on_touch_drag(&mut self, delta_y: f64) -> bool {
        if !self.engine.is_running() {
            return false;
        }
        self.engine.on_touch_drag(delta_y);
        true
    }

    /// Forward a navigation key. Returns true when consumed.
    pub fn on_key(&mut self, key: ScrollKey) -> bool {
        if !self.engine.is_running() {
            return false;
        }
        self.engine.on_key(key);
        true
    }

    /// Native scroll position changed. Only broadcast while the engine is
    /// inactive, so consumers keep receiving progress on mobile.
    pub fn on_native_scroll(&mut self, scroll_y: f64) -> Option<ScrollProgressEvent> {
        if self.destroyed || self.engine.is_running() {
            return None;
        }
        self.native_scroll_y = scroll_y;
        if !self.initialized {
            return None;
        }
        let event = ScrollProgressEvent::new(scroll_y, self.viewport.max_scroll(self.document_height));
        self.broadcast(&event);
        Some(event)
    }

    /// The viewport changed size. Recomputes scroll bounds and effect
    /// layout from `probe`.
    ///
    /// When this tears the engine down, the displayed offset is kept in
    /// [`native_scroll_y`](Self::native_scroll_y) so the page can be put
    /// back where it was.
    pub fn on_resize(&mut self, viewport: Viewport, document_height: f64, probe: &dyn LayoutProbe) -> ResizeOutcome {
        self.viewport = viewport;
        self.document_height = document_height;
        let displayed = self.engine.state().current;
        let outcome = self.engine.on_resize(viewport, document_height);
        if outcome == ResizeOutcome::TornDown {
            self.animator.kill_target(TargetId::SCROLL);
            self.native_scroll_y = displayed;
        }
        for effect in &mut self.effects {
            effect.refresh(probe);
        }
        outcome
    }

    /// Re-measure scroll bounds and every effect's layout.
    ///
    /// Without the engine, progress at the last native offset is broadcast
    /// against the new layout and returned.
    pub fn refresh(&mut self, probe: &dyn LayoutProbe, document_height: f64) -> Option<ScrollProgressEvent> {
        self.document_height = document_height;
        self.engine.on_resize(self.viewport, document_height);
        for effect in &mut self.effects {
            effect.refresh(probe);
        }
        self.on_native_scroll(self.native_scroll_y)
    }

    /// Ease the virtual scroll position to `offset`. Returns `None` when
    /// the engine is inactive and the caller should scroll natively.
    pub fn scroll_to(&mut self, offset: f64, duration: Option<f64>) -> Option<AnimationHandle> {
        let duration = duration.unwrap_or(DEFAULT_SCROLL_TO_DURATION);
        self.engine.scroll_to(&mut self.animator, offset, duration)
    }

    /// A pointer entered or left a target.
    pub fn pointer(&mut self, target: TargetId, entered: bool) {
        for effect in &mut self.effects {
            effect.on_pointer(target, entered, &mut self.animator);
        }
    }

    /// Run one display frame.
    ///
    /// Advances animations, routes scroll-target writes into the engine,
    /// then ticks the engine and broadcasts its progress.
    pub fn frame(&mut self, tick: FrameTick) -> Option<ScrollProgressEvent> {
        if self.destroyed {
            return None;
        }
        for write in self.animator.advance(tick.delta_secs()) {
            if write.property == Property::ScrollTarget {
                self.engine.set_target(write.value);
            }
        }
        let event = self.engine.tick()?;
        self.broadcast(&event);
        Some(event)
    }

    fn broadcast(&mut self, event: &ScrollProgressEvent) {
        self.bus.emit(event);
        if let Some(nav) = self.navigation.as_mut() {
            nav.on_scroll(event, &mut self.animator);
        }
        for effect in &mut self.effects {
            effect.on_scroll(event, &self.viewport, &mut self.animator);
        }
    }

    /// Dispose every effect, drop listeners and stop the engine.
    ///
    /// Returns false if already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        for effect in &mut self.effects {
            effect.dispose(&mut self.animator);
        }
        self.effects.clear();
        if let Some(mut nav) = self.navigation.take() {
            nav.dispose(&mut self.animator);
        }
        self.animator.kill_target(TargetId::SCROLL);
        self.bus.clear();
        self.engine.stop();
        tracing::info!("motion destroyed");
        true
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Options the context was created with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The virtual scroll engine.
    pub fn engine(&self) -> &VirtualScroll {
        &self.engine
    }

    /// The animator effects write through.
    pub fn animator(&self) -> &A {
        &self.animator
    }

    /// Mutable access to the animator, e.g. to register elements.
    pub fn animator_mut(&mut self) -> &mut A {
        &mut self.animator
    }

    /// The navigation bar, if one was installed.
    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    /// Current viewport.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Last native scroll offset seen, or the offset displayed when the
    /// engine was torn down.
    #[inline]
    pub fn native_scroll_y(&self) -> f64 {
        self.native_scroll_y
    }

    /// Number of live effects.
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Number of progress listeners.
    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }
}

/// Browser entry point.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{
        console, AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlCanvasElement,
        HtmlElement, HtmlMediaElement, KeyboardEvent, TouchEvent, WheelEvent, Window,
    };

    use crate::animator::web::StyleAnimator;
    use crate::attributes::{self, class, AttributeError, BloomMode};
    use crate::effects::{Bloom, FadeIn, LinkHover, Marquee, Parallax, TitleReveal, DEFAULT_MARQUEE_DURATION};
    use crate::events::web::dispatch_scroll_event;
    use crate::input::TouchTracker;
    use crate::loader::FrameSource;
    use crate::logging::web::init_console_logging;
    use crate::player::web::{start_canvas_player, CanvasPlayer};
    use crate::scheduler::web::RafScheduler;
    use crate::scheduler::{FrameScheduler, LoopGuard};
    use crate::scroll::web::{apply_translation, pin_body, restore_body};
    use crate::sizing::CanvasSize;
    use crate::viewport::web::{document_height, read_viewport};
    use crate::viewport::ElementRect;

    type SharedContext = Rc<RefCell<MotionContext<StyleAnimator>>>;

    struct Listener {
        target: EventTarget,
        kind: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    }

    impl Listener {
        fn remove(&self) {
            if let Err(err) = self
                .target
                .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
            {
                tracing::debug!("{} listener not removed: {:?}", self.kind, err);
            }
        }
    }

    #[derive(Default)]
    struct Listeners(Vec<Listener>);

    impl Listeners {
        fn add(&mut self, target: &EventTarget, kind: &'static str, handler: impl FnMut(Event) + 'static) {
            self.add_with_passive(target, kind, true, handler);
        }

        /// Non-passive listeners may call `preventDefault`.
        fn add_with_passive(&mut self, target: &EventTarget, kind: &'static str, passive: bool, handler: impl FnMut(Event) + 'static) {
            let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            let added = target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            );
            match added {
                Ok(()) => self.0.push(Listener {
                    target: target.clone(),
                    kind,
                    closure,
                }),
                Err(err) => tracing::warn!("failed to listen for {}: {:?}", kind, err),
            }
        }

        fn remove_all(&mut self) {
            for listener in self.0.drain(..) {
                listener.remove();
            }
        }
    }

    impl Drop for Listeners {
        fn drop(&mut self) {
            self.remove_all();
        }
    }

    /// Everything `init` attached to the page. Dropping it detaches all of
    /// it and puts native scrolling back.
    struct Runtime {
        window: Window,
        body: HtmlElement,
        context: SharedContext,
        players: Rc<RefCell<Vec<Rc<RefCell<CanvasPlayer>>>>>,
        listeners: Listeners,
        frame_loop: LoopGuard,
    }

    impl Drop for Runtime {
        fn drop(&mut self) {
            self.frame_loop.cancel();
            self.listeners.remove_all();
            match self.context.try_borrow_mut() {
                Ok(mut ctx) => {
                    ctx.destroy();
                    ctx.animator_mut().clear();
                }
                Err(_) => tracing::warn!("motion context busy during teardown"),
            }
            if let Ok(mut players) = self.players.try_borrow_mut() {
                players.clear();
            }
            if let Err(err) = restore_body(&self.body) {
                tracing::warn!("failed to restore body styles: {:?}", err);
            }
        }
    }

    /// Motion layer handle exposed to JavaScript.
    #[wasm_bindgen]
    pub struct ExoMotion {
        options: Options,
        runtime: Option<Runtime>,
        destroyed: bool,
    }

    fn all(root: &Document, selector: &str) -> Vec<HtmlElement> {
        match root.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.get(i))
                .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn within(root: &Element, selector: &str) -> Vec<HtmlElement> {
        match root.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.get(i))
                .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn first_within(root: &Element, selector: &str) -> Option<HtmlElement> {
        root.query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn has_method(target: &JsValue, name: &str) -> bool {
        js_sys::Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
    }

    fn is_typing(document: &Document) -> bool {
        document.active_element().is_some_and(|el| {
            matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
                || el.dyn_ref::<HtmlElement>().is_some_and(|h| h.is_content_editable())
        })
    }

    /// Bounds of every registered element in document coordinates.
    fn measure(context: &MotionContext<StyleAnimator>, window: &Window) -> HashMap<TargetId, ElementRect> {
        let scroll_y = if context.engine().is_running() {
            context.engine().state().current
        } else {
            window.scroll_y().unwrap_or(0.0)
        };
        context
            .animator()
            .elements()
            .map(|(id, el)| {
                let rect = el.get_bounding_client_rect();
                (id, ElementRect::new(rect.top() + scroll_y, rect.height()))
            })
            .collect()
    }

    /// Re-measure registered elements and re-broadcast when the engine is
    /// off. The returned event is meant for [`announce`].
    fn remeasure(context: &SharedContext, window: &Window, document: &Document) -> Option<ScrollProgressEvent> {
        let mut ctx = context.borrow_mut();
        let probe = measure(&ctx, window);
        ctx.refresh(&probe, document_height(document))
    }

    fn announce(window: &Window, event: Option<ScrollProgressEvent>) {
        if let Some(event) = event {
            if let Err(err) = dispatch_scroll_event(window, &event) {
                tracing::debug!("scroll event not dispatched: {:?}", err);
            }
        }
    }

    fn read_attribute<T>(
        element: &Element,
        name: &str,
        parse: impl FnOnce(&str) -> Result<T, AttributeError>,
    ) -> MotionResult<T> {
        let raw = element.get_attribute(name).unwrap_or_default();
        Ok(parse(&raw)?)
    }

    fn canvas_source(canvas: &HtmlCanvasElement) -> MotionResult<FrameSource> {
        let source = attributes::parse_canvas(
            &canvas.get_attribute(attributes::CANVAS).unwrap_or_default(),
            canvas.get_attribute(attributes::FOLDER).as_deref(),
            canvas.get_attribute(attributes::PREFIX).as_deref(),
            canvas.get_attribute(attributes::EXTENSION).as_deref(),
        )?;
        Ok(source)
    }

    fn report(err: &MotionError) {
        console::error_1(&JsValue::from_str(&format!("exo-motion: {}", err)));
    }

    #[wasm_bindgen]
    impl ExoMotion {
        /// Parse options from a JSON string. Missing or empty means defaults.
        #[wasm_bindgen(constructor)]
        pub fn new(options_json: Option<String>) -> Result<ExoMotion, JsValue> {
            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
            init_console_logging();

            let options = Options::from_json_str(options_json.as_deref().unwrap_or("")).map_err(|e| {
                report(&e);
                JsValue::from_str(&e.to_string())
            })?;
            Ok(Self {
                options,
                runtime: None,
                destroyed: false,
            })
        }

        /// Discover elements, bind listeners and start the frame loop.
        /// Calling it again does nothing.
        pub fn init(&mut self) -> Result<(), JsValue> {
            if self.runtime.is_some() || self.destroyed {
                return Ok(());
            }
            let window = web_sys::window().ok_or("no window")?;
            let document = window.document().ok_or("no document")?;
            let body = document.body().ok_or("no body")?;

            let animator = has_method(&window, "requestAnimationFrame").then(StyleAnimator::new);
            let scroll_trigger = document
                .document_element()
                .is_some_and(|root| has_method(&root, "getBoundingClientRect"));
            let viewport = read_viewport(&window).unwrap_or_default();

            let context = match MotionContext::new(self.options.clone(), Capabilities { scroll_trigger }, animator, viewport) {
                Ok(context) => Rc::new(RefCell::new(context)),
                Err(err) => {
                    report(&err);
                    return Ok(());
                }
            };

            let mut listeners = Listeners::default();
            let players = Rc::new(RefCell::new(Vec::new()));
            discover(&document, &context, &players, &mut listeners, viewport);

            let smooth = {
                let mut ctx = context.borrow_mut();
                ctx.on_native_scroll(window.scroll_y().unwrap_or(0.0));
                ctx.init(document_height(&document));
                ctx.engine().is_running()
            };

            bind_input(&window, &document, &body, &context, &players, &mut listeners);

            let frame_loop = {
                let context = Rc::clone(&context);
                let window = window.clone();
                let body = body.clone();
                RafScheduler::new(window.clone()).run_every_frame(Box::new(move |tick| {
                    let (event, translate) = {
                        let mut ctx = context.borrow_mut();
                        let event = ctx.frame(tick);
                        let translate = ctx.engine().is_running().then(|| ctx.engine().translate_y());
                        (event, translate)
                    };
                    if let Some(translate_y) = translate {
                        if let Err(err) = apply_translation(&body, translate_y) {
                            tracing::debug!("translation not applied: {:?}", err);
                        }
                    }
                    announce(&window, event);
                }))
            };

            let runtime = Runtime {
                window,
                body,
                context,
                players,
                listeners,
                frame_loop: LoopGuard::new(frame_loop),
            };
            if smooth {
                pin_body(&runtime.body)?;
            }
            announce(&runtime.window, remeasure(&runtime.context, &runtime.window, &document));
            self.runtime = Some(runtime);
            Ok(())
        }

        /// Re-measure layout after the page changed.
        pub fn refresh(&mut self) {
            let Some(runtime) = self.runtime.as_ref() else {
                return;
            };
            let Some(document) = runtime.window.document() else {
                return;
            };
            announce(&runtime.window, remeasure(&runtime.context, &runtime.window, &document));
        }

        /// Tear down every effect and restore native scrolling.
        pub fn destroy(&mut self) {
            self.destroyed = true;
            self.runtime = None;
        }

        /// Ease to `offset` over `duration` seconds (1.2 by default).
        #[wasm_bindgen(js_name = scrollTo)]
        pub fn scroll_to(&mut self, offset: f64, duration: Option<f64>) {
            let Some(runtime) = self.runtime.as_ref() else {
                return;
            };
            let handle = runtime.context.borrow_mut().scroll_to(offset, duration);
            if handle.is_none() {
                runtime.window.scroll_to_with_x_and_y(0.0, offset);
            }
        }
    }

    fn register(context: &SharedContext, element: &HtmlElement) -> TargetId {
        context.borrow_mut().animator_mut().register(element.clone())
    }

    fn bind_pointer(listeners: &mut Listeners, context: &SharedContext, element: &HtmlElement, target: TargetId) {
        for (kind, entered) in [("mouseenter", true), ("mouseleave", false)] {
            let context = Rc::clone(context);
            listeners.add(element, kind, move |_| context.borrow_mut().pointer(target, entered));
        }
    }

    fn discover(
        document: &Document,
        context: &SharedContext,
        players: &Rc<RefCell<Vec<Rc<RefCell<CanvasPlayer>>>>>,
        listeners: &mut Listeners,
        viewport: Viewport,
    ) {
        let options = context.borrow().options().navigation;

        if let Some(bar) = all(document, &format!(".{}", class::NAVIGATION)).into_iter().next() {
            let bar_id = register(context, &bar);
            let mut navigation = Navigation::new(bar_id, options);
            if let Some(menu) = all(document, &format!(".{}", class::MENU)).into_iter().next() {
                let menu_id = register(context, &menu);
                let links = within(&menu, "a").iter().map(|a| register(context, a)).collect();
                navigation = navigation.with_menu(menu_id, links);
            }
            context.borrow_mut().set_navigation(navigation);

            for toggle in all(document, &format!(".{}", class::MENU_TOGGLE)) {
                let context = Rc::clone(context);
                listeners.add(&toggle, "click", move |_| {
                    context.borrow_mut().toggle_menu();
                });
            }
        }

        for title in all(document, &format!(".{}", class::TITLE)) {
            let title_id = register(context, &title);
            let lines = within(&title, &format!(".{}", class::TITLE_LINE))
                .iter()
                .map(|line| register(context, line))
                .collect();
            context.borrow_mut().add_effect(Box::new(TitleReveal::new(title_id, lines)));
        }

        let fade_selector = format!(".{}, [{}]", class::ANIMATE, attributes::FADE_IN);
        for element in all(document, &fade_selector) {
            match read_attribute(&element, attributes::FADE_IN, attributes::parse_fade_in) {
                Ok(delay) => {
                    let id = register(context, &element);
                    context.borrow_mut().add_effect(Box::new(FadeIn::new(id, delay)));
                }
                Err(err) => tracing::warn!("skipping fade-in: {}", err),
            }
        }

        for element in all(document, &format!("[{}]", attributes::PARALLAX)) {
            match read_attribute(&element, attributes::PARALLAX, attributes::parse_parallax) {
                Ok(speed) => {
                    let id = register(context, &element);
                    context.borrow_mut().add_effect(Box::new(Parallax::new(id, speed)));
                }
                Err(err) => tracing::warn!("skipping parallax: {}", err),
            }
        }

        for element in all(document, &format!("[{}]", attributes::BLOOM)) {
            match read_attribute(&element, attributes::BLOOM, attributes::parse_bloom) {
                Ok(mode) => {
                    let id = register(context, &element);
                    if context.borrow_mut().add_effect(Box::new(Bloom::new(id, mode))) && mode == BloomMode::Hover {
                        bind_pointer(listeners, context, &element, id);
                    }
                }
                Err(err) => tracing::warn!("skipping bloom: {}", err),
            }
        }

        for marquee in all(document, &format!(".{}", class::MARQUEE)) {
            let track = first_within(&marquee, &format!(".{}", class::MARQUEE_TRACK)).unwrap_or(marquee);
            let id = register(context, &track);
            context
                .borrow_mut()
                .add_effect(Box::new(Marquee::new(id, DEFAULT_MARQUEE_DURATION)));
        }

        for link in all(document, &format!(".{}", class::LINK)) {
            let Some(underline) = first_within(&link, &format!(".{}", class::LINK_LINE)) else {
                continue;
            };
            let link_id = register(context, &link);
            let underline_id = register(context, &underline);
            context
                .borrow_mut()
                .add_effect(Box::new(LinkHover::new(link_id, underline_id)));
            bind_pointer(listeners, context, &link, link_id);
        }

        for element in all(document, &format!("[{}]", attributes::VIDEO)) {
            bind_video(listeners, &element);
        }

        let size = CanvasSize::from_viewport(&viewport);
        for element in all(document, &format!("canvas[{}]", attributes::CANVAS)) {
            let Ok(canvas) = element.dyn_into::<HtmlCanvasElement>() else {
                continue;
            };
            let source = match canvas_source(&canvas) {
                Ok(source) => source,
                Err(err) => {
                    tracing::warn!("skipping canvas: {}", err);
                    continue;
                }
            };
            match start_canvas_player(canvas, source, size) {
                Ok(player) => {
                    let subscriber = Rc::clone(&player);
                    context.borrow_mut().subscribe(move |event| {
                        if let Ok(mut player) = subscriber.try_borrow_mut() {
                            player.update_frame(event.progress);
                        }
                    });
                    players.borrow_mut().push(player);
                }
                Err(err) => tracing::warn!("canvas player not started: {}", err),
            }
        }
    }

    /// Play on hover, pause on leave. Rejected playback is ignored.
    fn bind_video(listeners: &mut Listeners, element: &HtmlElement) {
        let video = match element.clone().dyn_into::<HtmlMediaElement>() {
            Ok(video) => video,
            Err(el) => match el.query_selector("video").ok().flatten() {
                Some(v) => match v.dyn_into::<HtmlMediaElement>() {
                    Ok(video) => video,
                    Err(_) => return,
                },
                None => return,
            },
        };

        let playing = video.clone();
        listeners.add(element, "mouseenter", move |_| {
            if let Ok(promise) = playing.play() {
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        tracing::debug!("video playback rejected: {:?}", err);
                    }
                });
            }
        });
        listeners.add(element, "mouseleave", move |_| {
            if let Err(err) = video.pause() {
                tracing::debug!("video not paused: {:?}", err);
            }
        });
    }

    fn bind_input(
        window: &Window,
        document: &Document,
        body: &HtmlElement,
        context: &SharedContext,
        players: &Rc<RefCell<Vec<Rc<RefCell<CanvasPlayer>>>>>,
        listeners: &mut Listeners,
    ) {
        {
            let context = Rc::clone(context);
            listeners.add_with_passive(window, "wheel", false, move |event| {
                let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                if context.borrow_mut().on_wheel(wheel.delta_y()) {
                    event.prevent_default();
                }
            });
        }

        let tracker = Rc::new(RefCell::new(TouchTracker::new()));
        {
            let tracker = Rc::clone(&tracker);
            listeners.add(window, "touchstart", move |event| {
                if let Some(touch) = event.dyn_ref::<TouchEvent>().and_then(|t| t.touches().get(0)) {
                    tracker.borrow_mut().begin(touch.client_y() as f64);
                }
            });
        }
        {
            let tracker = Rc::clone(&tracker);
            let context = Rc::clone(context);
            listeners.add_with_passive(window, "touchmove", false, move |event| {
                let Some(touch) = event.dyn_ref::<TouchEvent>().and_then(|t| t.touches().get(0)) else {
                    return;
                };
                let Some(delta) = tracker.borrow_mut().move_to(touch.client_y() as f64) else {
                    return;
                };
                if context.borrow_mut().on_touch_drag(delta) {
                    event.prevent_default();
                }
            });
        }
        for kind in ["touchend", "touchcancel"] {
            let tracker = Rc::clone(&tracker);
            listeners.add(window, kind, move |_| tracker.borrow_mut().end());
        }

        {
            let context = Rc::clone(context);
            let document = document.clone();
            listeners.add_with_passive(window, "keydown", false, move |event| {
                let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if is_typing(&document) {
                    return;
                }
                let Some(scroll_key) = ScrollKey::from_key(&key.key(), key.shift_key()) else {
                    return;
                };
                if context.borrow_mut().on_key(scroll_key) {
                    event.prevent_default();
                }
            });
        }

        {
            let context = Rc::clone(context);
            let players = Rc::clone(players);
            let window_ref = window.clone();
            let document = document.clone();
            let body = body.clone();
            listeners.add(window, "resize", move |_| {
                let Some(viewport) = read_viewport(&window_ref) else {
                    return;
                };
                let (outcome, restore_to) = {
                    let mut ctx = context.borrow_mut();
                    let probe = measure(&ctx, &window_ref);
                    let outcome = ctx.on_resize(viewport, document_height(&document), &probe);
                    (outcome, ctx.native_scroll_y())
                };
                if outcome == ResizeOutcome::TornDown {
                    if let Err(err) = restore_body(&body) {
                        tracing::warn!("failed to restore body styles: {:?}", err);
                    }
                    window_ref.scroll_to_with_x_and_y(0.0, restore_to);
                }
                let size = CanvasSize::from_viewport(&viewport);
                for player in players.borrow().iter() {
                    player.borrow_mut().on_resize(size);
                }
            });
        }

        {
            let context = Rc::clone(context);
            let window_ref = window.clone();
            listeners.add(window, "scroll", move |_| {
                let scroll_y = window_ref.scroll_y().unwrap_or(0.0);
                let event = context.borrow_mut().on_native_scroll(scroll_y);
                announce(&window_ref, event);
            });
        }
    }
}
