//! Events delivered to listeners registered through a [`crate::Selection`].

use sprig_dom::NodeId;

/// A touch point in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Touch {
    pub page_x: f64,
    pub page_y: f64,
}

impl Touch {
    pub fn new(page_x: f64, page_y: f64) -> Self {
        Self { page_x, page_y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: String,
    pub(crate) target: Option<NodeId>,
    pub(crate) current_target: Option<NodeId>,
    /// Touches still on the surface.
    pub touches: Vec<Touch>,
    /// Touches that changed in this event.
    pub changed_touches: Vec<Touch>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            target: None,
            current_target: None,
            touches: Vec::new(),
            changed_touches: Vec::new(),
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn click() -> Self {
        Self::new("click")
    }

    pub fn touch_start(page_x: f64, page_y: f64) -> Self {
        let touch = Touch::new(page_x, page_y);
        Self {
            touches: vec![touch],
            changed_touches: vec![touch],
            ..Self::new("touchstart")
        }
    }

    /// The lifted finger is no longer in `touches`.
    pub fn touch_end(page_x: f64, page_y: f64) -> Self {
        Self {
            changed_touches: vec![Touch::new(page_x, page_y)],
            ..Self::new("touchend")
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Node the event was dispatched to. `None` before dispatch.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Node whose listeners are running. `None` outside dispatch.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}
