use std::sync::atomic::{AtomicBool, Ordering};

static NEVER_CANCELLED: AtomicBool = AtomicBool::new(false);

/// Cooperative cancellation for long slot advances, checked once per slot.
#[derive(Debug, Clone, Copy)]
pub struct Cancellation<'a>(&'a AtomicBool);

impl<'a> Cancellation<'a> {
    pub fn new(flag: &'a AtomicBool) -> Self {
        Self(flag)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Cancellation<'static> {
    pub fn never() -> Self {
        Self(&NEVER_CANCELLED)
    }
}

impl Default for Cancellation<'static> {
    fn default() -> Self {
        Self::never()
    }
}
