//! Cooperative shutdown signal shared by the tick loop and any in-flight
//! command wait (spec §5: "In-flight command yields must be interruptible by
//! shutdown").

use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct Shutdown {
    notify: Arc<Notify>,
    flag: Arc<std::sync::atomic::AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown; wakes every waiter immediately.
    pub fn trigger(&self) {
        self.flag.store(true, std::sync::atomic::Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Resolves once [`Shutdown::trigger`] has been called.
    pub async fn wait(&self) {
        if self.is_triggered() {
            return;
        }
        self.notify.notified().await;
    }
}
