//! Tap handling that fires once for a touch tap and once for a mouse
//! click, but never twice for a touch followed by its synthesized click.

use crate::dom::Listener;
use crate::event::Event;
use crate::event::Touch;
use crate::selection::Selection;
use core::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapConfig {
    /// A touch that moved this far on either axis is a drag, not a tap.
    pub threshold_px: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self { threshold_px: 10.0 }
    }
}

impl Selection {
    pub fn on_tap(&self, callback: impl Fn(&Self, &mut Event) + 'static) -> &Self {
        self.on_tap_with(TapConfig::default(), callback)
    }

    /// Binds `touchstart`, `touchend` and `click` on every element.
    ///
    /// A `touchend` within `threshold_px` of its `touchstart` runs
    /// `callback`, then prevents the default action and stops propagation.
    /// A `click` runs `callback` only when no touch was recorded; either way
    /// it clears the recorded touch.
    pub fn on_tap_with(
        &self,
        config: TapConfig,
        callback: impl Fn(&Self, &mut Event) + 'static,
    ) -> &Self {
        let callback: Listener = Rc::new(callback);
        let threshold = config.threshold_px;

        for node in self.nodes() {
            let start: Rc<Cell<Option<Touch>>> = Rc::default();

            let on_start = Rc::clone(&start);
            self.dom().add_listener(
                *node,
                "touchstart",
                Rc::new(move |_: &Self, event: &mut Event| {
                    if let Some(touch) = event.touches.first() {
                        on_start.set(Some(*touch));
                    }
                }),
            );

            let on_end = Rc::clone(&start);
            let tap = Rc::clone(&callback);
            self.dom().add_listener(
                *node,
                "touchend",
                Rc::new(move |receiver: &Self, event: &mut Event| {
                    let begin = on_end.get();
                    let end = event.changed_touches.first().copied();
                    let (Some(begin), Some(end)) = (begin, end) else {
                        return;
                    };

                    let dx = (begin.page_x - end.page_x).abs();
                    let dy = (begin.page_y - end.page_y).abs();
                    if dx < threshold && dy < threshold {
                        tap(receiver, event);
                        event.prevent_default();
                        event.stop_propagation();
                    }
                }),
            );

            let click = Rc::clone(&callback);
            self.dom().add_listener(
                *node,
                "click",
                Rc::new(move |receiver: &Self, event: &mut Event| {
                    if start.take().is_none() {
                        click(receiver, event);
                    }
                }),
            );
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::TapConfig;
    use crate::dom::Dom;
    use crate::event::Event;
    use core::cell::Cell;
    use std::rc::Rc;

    fn tapped_button(config: TapConfig) -> (Dom, sprig_dom::NodeId, Rc<Cell<u32>>) {
        let dom = Dom::parse_html("<button>go</button>");
        let Ok(button) = dom.select("button") else {
            panic!("missing <button>");
        };
        let taps = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&taps);
        button.on_tap_with(config, move |_, _| counter.set(counter.get() + 1));
        let node = button.first_node();
        (dom, node, taps)
    }

    #[test]
    fn short_touch_fires_once_and_swallows_the_click() {
        let (dom, button, taps) = tapped_button(TapConfig::default());

        dom.dispatch(button, &mut Event::touch_start(10.0, 10.0));
        let mut end = Event::touch_end(12.0, 11.0);
        assert!(!dom.dispatch(button, &mut end));
        assert!(end.propagation_stopped());
        dom.dispatch(button, &mut Event::click());

        assert_eq!(taps.get(), 1);
    }

    #[test]
    fn drag_does_not_fire() {
        let (dom, button, taps) = tapped_button(TapConfig::default());

        dom.dispatch(button, &mut Event::touch_start(10.0, 10.0));
        assert!(dom.dispatch(button, &mut Event::touch_end(50.0, 50.0)));
        assert_eq!(taps.get(), 0);
    }

    #[test]
    fn mouse_clicks_fire_each_time() {
        let (dom, button, taps) = tapped_button(TapConfig::default());

        dom.dispatch(button, &mut Event::click());
        dom.dispatch(button, &mut Event::click());
        assert_eq!(taps.get(), 2);
    }

    #[test]
    fn threshold_is_configurable() {
        let (dom, button, taps) = tapped_button(TapConfig { threshold_px: 50.0 });

        dom.dispatch(button, &mut Event::touch_start(10.0, 10.0));
        dom.dispatch(button, &mut Event::touch_end(40.0, 55.0));
        assert_eq!(taps.get(), 1);
    }
}
