//! Subscription registry and synchronous fan-out of dirty positions.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};

use thiserror::Error;
use tracing::{trace, warn};
use wayfarer_core::{ContinuousPosition, Footprint, GridPosition};

/// Cache that wants to learn when a cell changes.
///
/// Listeners are expected to flag themselves stale and defer the expensive
/// recompute until their next query, which makes repeated notifications for
/// the same cell cheap.
pub trait DirtyListener: Send + Sync {
    /// Records that derived data covering `position` is stale.
    fn mark_dirty(&self, position: GridPosition) -> Result<(), ListenerError>;
}

/// Failure reported by a listener while handling a notification.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates a listener failure carrying the provided description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Handle identifying one subscription.
///
/// Tokens are allocated in increasing order, which is also dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    /// Retrieves the numeric representation of the token.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Tally of a dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of cells dispatched.
    pub cells: usize,
    /// Listener invocations that completed successfully.
    pub notified: usize,
    /// Listener invocations that returned an error or panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Adds the counts of another dispatch to this one.
    pub fn absorb(&mut self, other: DispatchReport) {
        self.cells += other.cells;
        self.notified += other.notified;
        self.failed += other.failed;
    }
}

#[derive(Clone)]
enum Binding {
    Owned(Arc<dyn DirtyListener>),
    Shared(Weak<dyn DirtyListener>),
}

impl Binding {
    fn upgrade(&self) -> Option<Arc<dyn DirtyListener>> {
        match self {
            Self::Owned(listener) => Some(Arc::clone(listener)),
            Self::Shared(listener) => listener.upgrade(),
        }
    }
}

#[derive(Clone)]
struct Subscription {
    token: SubscriptionToken,
    binding: Binding,
    active: Arc<AtomicBool>,
}

struct FnListener<F>(F);

impl<F> DirtyListener for FnListener<F>
where
    F: Fn(GridPosition) + Send + Sync,
{
    fn mark_dirty(&self, position: GridPosition) -> Result<(), ListenerError> {
        (self.0)(position);
        Ok(())
    }
}

/// Decouples "something changed at a cell" from "who needs to know".
///
/// The hub never owns cache state. Shared listeners are held weakly, so a
/// cache that is dropped without unsubscribing is skipped; its slot stays in
/// the list until [`DirtyRegionHub::unsubscribe`] or
/// [`DirtyRegionHub::prune`] removes it.
pub struct DirtyRegionHub {
    subscriptions: Mutex<Vec<Subscription>>,
    next_token: AtomicU64,
}

impl DirtyRegionHub {
    /// Creates a hub without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Registers a shared listener for future notifications.
    pub fn subscribe<L>(&self, listener: &Arc<L>) -> SubscriptionToken
    where
        L: DirtyListener + 'static,
    {
        let weak: Weak<L> = Arc::downgrade(listener);
        self.register(Binding::Shared(weak))
    }

    /// Registers a callback owned by the hub for future notifications.
    pub fn subscribe_fn<F>(&self, callback: F) -> SubscriptionToken
    where
        F: Fn(GridPosition) + Send + Sync + 'static,
    {
        self.register(Binding::Owned(Arc::new(FnListener(callback))))
    }

    fn register(&self, binding: Binding) -> SubscriptionToken {
        let mut subscriptions = self.lock();
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        subscriptions.push(Subscription {
            token,
            binding,
            active: Arc::new(AtomicBool::new(true)),
        });
        token
    }

    /// Removes a subscription, returning whether it was still registered.
    ///
    /// Removing an unknown or already removed token is a no-op. Dispatches
    /// that start afterwards never see the listener, and dispatches already
    /// in flight on other threads skip it unless its callback has already
    /// begun.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscriptions = self.lock();
        let Some(index) = subscriptions
            .iter()
            .position(|subscription| subscription.token == token)
        else {
            return false;
        };

        let removed = subscriptions.remove(index);
        removed.active.store(false, Ordering::Release);
        true
    }

    /// Drops subscriptions whose shared listener no longer exists.
    ///
    /// Returns how many were removed. Callback subscriptions are owned by the
    /// hub and always survive.
    pub fn prune(&self) -> usize {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| {
            if subscription.binding.upgrade().is_some() {
                return true;
            }
            subscription.active.store(false, Ordering::Release);
            trace!(token = subscription.token.get(), "pruned dropped listener");
            false
        });
        before - subscriptions.len()
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Notifies every subscriber, in subscription order, that `position` changed.
    ///
    /// The subscriber list is snapshotted before any callback runs, so
    /// listeners may subscribe or unsubscribe re-entrantly; a listener added
    /// during the dispatch is first invoked by the next one. A failing or
    /// panicking listener is logged and counted without interrupting the
    /// remaining listeners.
    pub fn mark_dirty(&self, position: GridPosition) -> DispatchReport {
        let snapshot: Vec<Subscription> = self.lock().clone();
        let mut report = DispatchReport {
            cells: 1,
            ..DispatchReport::default()
        };

        for subscription in snapshot {
            if !subscription.active.load(Ordering::Acquire) {
                continue;
            }
            let Some(listener) = subscription.binding.upgrade() else {
                trace!(token = subscription.token.get(), "skipping dropped listener");
                continue;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| listener.mark_dirty(position))) {
                Ok(Ok(())) => report.notified += 1,
                Ok(Err(error)) => {
                    report.failed += 1;
                    warn!(
                        token = subscription.token.get(),
                        ?position,
                        %error,
                        "dirty listener failed"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        token = subscription.token.get(),
                        ?position,
                        panic = panic_message(payload.as_ref()),
                        "dirty listener panicked"
                    );
                }
            }
        }

        report
    }

    /// Marks every cell overlapped by the footprint, in row-major order.
    pub fn mark_dirty_area(
        &self,
        position: &ContinuousPosition,
        footprint: Footprint,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        for cell in position.overlapped_cells(footprint) {
            report.absorb(self.mark_dirty(cell));
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DirtyRegionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DirtyRegionHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyRegionHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
