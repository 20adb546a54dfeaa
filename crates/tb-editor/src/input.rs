//! Input abstraction layer.
//!
//! Normalizes mouse, touch and pen events into a unified `InputEvent`
//! consumed by the board. The host wires raw DOM listeners (attached at
//! document level for the duration of a gesture) to these events.

/// A normalized input event from any pointing device or the timeline strip.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { x: f64, y: f64 },

    /// Pointer moved (mouse move, touch move, pen move).
    PointerMove { x: f64, y: f64 },

    /// Pointer released, wherever it is.
    PointerUp { x: f64, y: f64 },

    /// Double click / double tap.
    DoubleClick { x: f64, y: f64 },

    /// The timeline container reported a new scroll offset.
    TimelineScroll { scroll_left: f64, client_width: f64 },
}

impl InputEvent {
    /// Create a PointerDown from a web PointerEvent / TouchEvent.
    /// (Used when bridging from JS via wasm-bindgen.)
    pub fn from_pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown { x, y }
    }

    pub fn from_pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn from_pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_build_pointer_variants() {
        assert_eq!(
            InputEvent::from_pointer_down(1.0, 2.0),
            InputEvent::PointerDown { x: 1.0, y: 2.0 }
        );
        assert_eq!(
            InputEvent::from_pointer_up(3.0, 4.0),
            InputEvent::PointerUp { x: 3.0, y: 4.0 }
        );
        assert_ne!(
            InputEvent::from_pointer_move(3.0, 4.0),
            InputEvent::from_pointer_up(3.0, 4.0)
        );
    }
}
