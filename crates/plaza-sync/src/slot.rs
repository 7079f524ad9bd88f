use std::sync::{Mutex, MutexGuard};

use plaza_store::WatchId;

/// Token captured when a subscription starts. A delivery carrying an older
/// token than the slot's current one belongs to a torn-down subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unsubscribed,
    Subscribing,
    Active,
}

/// The single subscription a consumer owns: current path, generation token
/// and watch handle. The handle is assigned as the last step of setup and
/// taken as the first step of teardown, so at most one watch is ever live.
pub struct Slot {
    inner: Mutex<SlotInner>,
}

struct SlotInner {
    generation: u64,
    state: SlotState,
    path: Option<String>,
    handle: Option<WatchId>,
}

impl Slot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                generation: 0,
                state: SlotState::Unsubscribed,
                path: None,
                handle: None,
            }),
        }
    }

    /// Start a subscription on `path`. Invalidates every earlier token.
    pub fn begin(&self, path: &str) -> Generation {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = SlotState::Subscribing;
        inner.path = Some(path.to_string());
        Generation(inner.generation)
    }

    /// Install the watch handle for the subscription started with `token`.
    pub fn activate(&self, token: Generation, handle: WatchId) {
        let mut inner = self.lock();
        if inner.generation == token.0 {
            inner.handle = Some(handle);
            inner.state = SlotState::Active;
        }
    }

    /// Back out of a subscription that never got a handle.
    pub fn abandon(&self, token: Generation) {
        let mut inner = self.lock();
        if inner.generation == token.0 {
            inner.generation += 1;
            inner.state = SlotState::Unsubscribed;
            inner.path = None;
        }
    }

    /// Tear down: take the handle (if any) and invalidate the current token.
    /// Returns the handle only once, however often it is called.
    pub fn release(&self) -> Option<WatchId> {
        let mut inner = self.lock();
        let handle = inner.handle.take();
        if inner.state != SlotState::Unsubscribed {
            inner.generation += 1;
            inner.state = SlotState::Unsubscribed;
            inner.path = None;
        }
        handle
    }

    pub fn is_current(&self, token: Generation) -> bool {
        self.lock().generation == token.0
    }

    /// Run `publish` only if `token` is still current. The check and the
    /// publish happen under one lock, so teardown cannot slip between them.
    pub fn publish_if_current(&self, token: Generation, publish: impl FnOnce()) -> bool {
        let inner = self.lock();
        if inner.generation != token.0 {
            return false;
        }
        publish();
        true
    }

    pub fn state(&self) -> SlotState {
        self.lock().state
    }

    pub fn path(&self) -> Option<String> {
        self.lock().path.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        // Every critical section is a handful of field writes.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}
