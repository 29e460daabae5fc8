//! Scroll progress broadcast.

/// Name of the DOM event carrying scroll progress.
pub const SCROLL_EVENT: &str = "exo:scroll";

/// Scroll position and normalized progress for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScrollProgressEvent {
    /// Scroll offset in CSS pixels
    pub scroll_y: f64,
    /// Position within the scrollable range, 0 at top and 1 at bottom
    pub progress: f64,
}

impl ScrollProgressEvent {
    /// Build an event for `scroll_y` within `max_scroll`.
    ///
    /// Progress is 0 when there is nothing to scroll.
    ///
    /// ```rust
    /// use exo_motion::ScrollProgressEvent;
    ///
    /// assert_eq!(ScrollProgressEvent::new(250.0, 1000.0).progress, 0.25);
    /// assert_eq!(ScrollProgressEvent::new(250.0, 0.0).progress, 0.0);
    /// ```
    pub fn new(scroll_y: f64, max_scroll: f64) -> Self {
        let progress = if max_scroll > 0.0 {
            (scroll_y / max_scroll).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { scroll_y, progress }
    }
}

/// Identifies a subscription on a [`ProgressBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ScrollProgressEvent)>;

/// Fan-out of progress events to in-process listeners.
#[derive(Default)]
pub struct ProgressBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    last: Option<ScrollProgressEvent>,
}

impl std::fmt::Debug for ProgressBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBus")
            .field("listeners", &self.listeners.len())
            .field("last", &self.last)
            .finish()
    }
}

impl ProgressBus {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It is called for every later event.
    pub fn subscribe(&mut self, listener: impl FnMut(&ScrollProgressEvent) + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Deliver an event to every listener, returning how many received it.
    pub fn emit(&mut self, event: &ScrollProgressEvent) -> usize {
        self.last = Some(*event);
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
        self.listeners.len()
    }

    /// The most recently emitted event.
    pub fn last(&self) -> Option<ScrollProgressEvent> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.last = None;
    }
}

/// Web-specific event dispatch.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen::JsValue;

    /// Broadcast a progress event on `window` as a `CustomEvent` named
    /// [`SCROLL_EVENT`] with `detail = { scrollY, progress }`.
    pub fn dispatch_scroll_event(window: &web_sys::Window, event: &ScrollProgressEvent) -> Result<bool, JsValue> {
        let detail = js_sys::Object::new();
        js_sys::Reflect::set(&detail, &JsValue::from_str("scrollY"), &JsValue::from_f64(event.scroll_y))?;
        js_sys::Reflect::set(&detail, &JsValue::from_str("progress"), &JsValue::from_f64(event.progress))?;

        let init = web_sys::CustomEventInit::new();
        init.set_detail(&detail);
        let custom = web_sys::CustomEvent::new_with_event_init_dict(SCROLL_EVENT, &init)?;
        window.dispatch_event(&custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_progress_clamped() {
        assert_eq!(ScrollProgressEvent::new(-10.0, 100.0).progress, 0.0);
        assert_eq!(ScrollProgressEvent::new(150.0, 100.0).progress, 1.0);
        assert_eq!(ScrollProgressEvent::new(50.0, -1.0).progress, 0.0);
    }

    #[test]
    fn test_emit_to_all_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = ProgressBus::new();

        let a = Rc::clone(&seen);
        bus.subscribe(move |ev| a.borrow_mut().push(("a", ev.progress)));
        let b = Rc::clone(&seen);
        bus.subscribe(move |ev| b.borrow_mut().push(("b", ev.progress)));

        let delivered = bus.emit(&ScrollProgressEvent::new(500.0, 1000.0));
        assert_eq!(delivered, 2);
        assert_eq!(*seen.borrow(), vec![("a", 0.5), ("b", 0.5)]);
        assert_eq!(bus.last().map(|e| e.scroll_y), Some(500.0));
    }

    #[test]
    fn test_unsubscribe_and_clear() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = ProgressBus::new();

        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);
        bus.emit(&ScrollProgressEvent::default());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&ScrollProgressEvent::default());
        assert_eq!(*count.borrow(), 1);

        bus.subscribe(|_| {});
        bus.clear();
        assert!(bus.is_empty());
        assert_eq!(bus.emit(&ScrollProgressEvent::default()), 0);
    }
}
