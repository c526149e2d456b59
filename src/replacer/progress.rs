// src/replacer/progress.rs
// =============================================================================
// Progress reporting.
//
// The replacer doesn't know where its status text ends up (a status bar, a
// terminal line, a test recorder...). It only knows how to hand a message to
// something that implements ProgressSink.
// =============================================================================

use std::sync::Arc;

pub const READY_MESSAGE: &str = "Wayback: Ready";

// "Wayback: Replacing 2 of 5 link(s)..."
//
// `current` is 1-based; `total` counts every unique link found, including the
// ones that end up being skipped.
pub fn replacing_message(current: usize, total: usize) -> String {
    format!("Wayback: Replacing {} of {} link(s)...", current, total)
}

pub trait ProgressSink {
    fn set_text(&self, message: &str);
}

impl<P: ProgressSink + ?Sized> ProgressSink for &P {
    fn set_text(&self, message: &str) {
        (**self).set_text(message)
    }
}

impl<P: ProgressSink + ?Sized> ProgressSink for Arc<P> {
    fn set_text(&self, message: &str) {
        (**self).set_text(message)
    }
}
