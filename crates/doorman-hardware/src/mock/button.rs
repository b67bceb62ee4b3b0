//! Mock exit button.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::traits::Button;

/// Mock button with a held level and a one-shot tap.
///
/// `hold`/`release` model a button kept down; `tap` models a short press
/// observed by exactly one subsequent read.
#[derive(Debug, Default)]
pub struct MockButton {
    held: AtomicBool,
    tapped: AtomicBool,
}

impl MockButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press and keep the button down.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let go of a held button.
    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    /// Press once; the next read reports it.
    pub fn tap(&self) {
        self.tapped.store(true, Ordering::SeqCst);
    }
}

impl Button for MockButton {
    fn is_pressed(&self) -> bool {
        self.tapped.swap(false, Ordering::SeqCst) || self.held.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_is_seen_once() {
        let button = MockButton::new();
        button.tap();
        assert!(button.is_pressed());
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_hold_until_release() {
        let button = MockButton::new();
        button.hold();
        assert!(button.is_pressed());
        assert!(button.is_pressed());
        button.release();
        assert!(!button.is_pressed());
    }
}
