//! Controllers for driving a view from external code.
//!
//! A [`ViewController`] is a cheap cloneable handle; requests are recorded
//! under a mutex and applied by the owning view at the start of its next
//! poll, so non-UI threads never touch view state directly.

use std::sync::{Arc, Mutex};

/// Requests drained by the view each poll.
#[derive(Default)]
pub(crate) struct ViewCtrlInner {
    pub(crate) request_pause: Option<bool>,
    pub(crate) request_full_redraw: bool,
}

/// Handle to request pause/resume or a full redraw from outside the view.
#[derive(Clone, Default)]
pub struct ViewController {
    pub(crate) inner: Arc<Mutex<ViewCtrlInner>>,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the view to freeze at the next poll.
    pub fn pause(&self) {
        self.inner.lock().unwrap().request_pause = Some(true);
    }

    /// Request the view to resume live updates.
    pub fn resume(&self) {
        self.inner.lock().unwrap().request_pause = Some(false);
    }

    /// Request a full redraw (e.g. after a colour-scheme change).
    pub fn request_full_redraw(&self) {
        self.inner.lock().unwrap().request_full_redraw = true;
    }

    pub(crate) fn drain(&self) -> (Option<bool>, bool) {
        let mut inner = self.inner.lock().unwrap();
        let pause = inner.request_pause.take();
        let redraw = std::mem::take(&mut inner.request_full_redraw);
        (pause, redraw)
    }
}
