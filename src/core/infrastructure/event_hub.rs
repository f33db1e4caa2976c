//! Change-notification wait handles and the registry that signals them.
//!
//! A [`EventWaitHandle`] is a single subscription to the "subscriptions changed"
//! notification. Signals coalesce: a handle holds at most one pending signal,
//! so a burst of changes wakes a waiter once. Releasing a handle tears it down
//! and any current or future [`EventWaitHandle::wait_event`] call fails with
//! [`ExplorerError::EventHandle`].

use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::core::sync::{lock, read, write};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Semaphore;
use tracing::debug;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

struct WaitHandleInner {
    id: u64,
    signal: Semaphore,
    // serialises the "no pending permit" check with the release
    signal_sync: Mutex<()>,
}

/// A cancelable registration for a remote change notification.
#[derive(Clone)]
pub struct EventWaitHandle {
    inner: Arc<WaitHandleInner>,
}

impl EventWaitHandle {
    /// Creates a fresh, unsignalled handle.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WaitHandleInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                signal: Semaphore::new(0),
                signal_sync: Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Waits until the handle is signalled.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::EventHandle`] once the handle has been released,
    /// including when the release happens while this call is waiting.
    pub async fn wait_event(&self) -> ExplorerResult<()> {
        let permit = self.inner.signal.acquire().await.map_err(|_| {
            ExplorerError::EventHandle(format!("wait handle {} was released", self.inner.id))
        })?;
        permit.forget();
        Ok(())
    }

    /// Signals the handle, unless a signal is already pending.
    pub fn signal(&self) {
        let _sync = lock(&self.inner.signal_sync);
        if self.inner.signal.available_permits() == 0 {
            self.inner.signal.add_permits(1);
        }
    }

    /// Tears the handle down, waking every waiter with an error.
    pub fn release(&self) {
        self.inner.signal.close();
    }

    pub fn is_released(&self) -> bool {
        self.inner.signal.is_closed()
    }
}

impl Default for EventWaitHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EventWaitHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for EventWaitHandle {}

impl fmt::Debug for EventWaitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWaitHandle")
            .field("id", &self.inner.id)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Registry of the live "subscriptions changed" handles.
///
/// [`AzureManager`](crate::AzureManager) implementations delegate their
/// register/unregister calls here and call [`notify_all`](Self::notify_all)
/// whenever the selected subscriptions change. A handle released without
/// being unregistered is no longer live and is dropped on the next
/// notification.
#[derive(Debug, Default)]
pub struct SubscriptionsChangedHub {
    handles: RwLock<HashMap<u64, EventWaitHandle>>,
}

impl SubscriptionsChangedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and returns a new handle.
    pub fn register(&self) -> EventWaitHandle {
        let handle = EventWaitHandle::new();
        write(&self.handles).insert(handle.id(), handle.clone());
        debug!(handle = handle.id(), "registered subscriptions-changed handle");
        handle
    }

    /// Removes the handle from the registry and releases it.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::EventHandle`] if the handle was never registered
    /// here or has already been unregistered.
    pub fn unregister(&self, handle: &EventWaitHandle) -> ExplorerResult<()> {
        let removed = write(&self.handles).remove(&handle.id());
        handle.release();

        match removed {
            Some(_) => {
                debug!(handle = handle.id(), "unregistered subscriptions-changed handle");
                Ok(())
            }
            None => Err(ExplorerError::EventHandle(format!(
                "wait handle {} is not registered",
                handle.id()
            ))),
        }
    }

    /// Signals every live handle and returns how many were signalled.
    pub fn notify_all(&self) -> usize {
        let mut handles = write(&self.handles);
        handles.retain(|_, handle| !handle.is_released());
        for handle in handles.values() {
            handle.signal();
        }
        debug!(count = handles.len(), "subscriptions changed");
        handles.len()
    }

    /// Number of live handles.
    pub fn registered_count(&self) -> usize {
        read(&self.handles)
            .values()
            .filter(|handle| !handle.is_released())
            .count()
    }
}
