//! Single-slot timer for delayed assistant emissions.
//!
//! Holds at most one sleeping task. Scheduling again, cancelling, or dropping
//! the timer aborts the previous task, so a superseded generation can never
//! wake the session.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::session::{Generation, Scheduled};

pub struct EmissionTimer<E> {
    tx: UnboundedSender<E>,
    wrap: fn(Generation) -> E,
    handle: Option<JoinHandle<()>>,
}

impl<E: Send + 'static> EmissionTimer<E> {
    /// `wrap` turns a due generation into whatever the receiving loop expects
    pub fn new(tx: UnboundedSender<E>, wrap: fn(Generation) -> E) -> Self {
        Self {
            tx,
            wrap,
            handle: None,
        }
    }

    /// Replace any in-flight timer with `scheduled`. Must run inside a tokio runtime.
    pub fn schedule(&mut self, scheduled: Scheduled) {
        self.cancel();

        let tx = self.tx.clone();
        let event = (self.wrap)(scheduled.generation);
        tracing::trace!(
            generation = scheduled.generation.0,
            delay_ms = scheduled.delay.as_millis() as u64,
            "scheduling emission"
        );
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(scheduled.delay).await;
            let _ = tx.send(event);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<E> Drop for EmissionTimer<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
