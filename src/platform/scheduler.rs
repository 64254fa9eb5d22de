//! Frame callback scheduling
//!
//! The game asks its host for one frame at a time and cancels the pending
//! request whenever the loop stops. Browser hosts wrap
//! `requestAnimationFrame`; tests and the headless binary use
//! [`ManualScheduler`] and deliver frames themselves.

/// Opaque id of a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

pub trait FrameScheduler {
    /// Ask for the next frame callback
    fn request_frame(&mut self) -> FrameHandle;
    /// Withdraw a request that has not fired yet
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by hand: records requests, never fires on its own
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: Vec<FrameHandle>,
    pub requested: u64,
    pub cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Consume the oldest pending request, as the host does right before
    /// invoking the callback
    pub fn fire(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|h| *h != handle);
        if self.pending.len() < before {
            self.cancelled += 1;
        }
    }
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for &mut T {
    fn request_frame(&mut self) -> FrameHandle {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        (**self).cancel_frame(handle)
    }
}
