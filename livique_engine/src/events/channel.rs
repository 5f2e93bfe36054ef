//! Simple stateless pub-sub event handler
//!
//! Components subscribe to engine events and react to them. Handlers only ever see the event itself, never the
//! internal state of the engine. Handlers can be async.
//!
//! Publishing never waits on a subscriber. If the channel buffer is full, the event is dropped and logged, so a slow
//! mail relay can never hold up a checkout response.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::{mpsc, Semaphore};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Upper bound on handler jobs running at the same time for a single event type.
pub const MAX_CONCURRENT_JOBS: usize = 32;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Dropping our own sender lets the loop end once the last producer goes away
        drop(self.sender);
        let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_JOBS));
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    error!("📬️ Event handler semaphore closed: {e}");
                    break;
                },
            };
            tokio::spawn(async move {
                (handler)(ev).await;
                drop(permit);
                trace!("📬️ Event handled");
            });
        }
        // Wait for in-flight jobs by taking every permit back
        match permits.acquire_many(MAX_CONCURRENT_JOBS as u32).await {
            Ok(_) => debug!("📬️ Event handler shutting down gracefully"),
            Err(e) => warn!("📬️ Event handler shutdown process failed: {e}"),
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Hands the event to the subscriber without waiting. Returns `false` if the event was dropped.
    pub fn publish_event(&self, event: E) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                error!("📬️ Event buffer is full. The event has been dropped.");
                false
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("📬️ Failed to send event: the handler has shut down");
                false
            },
        }
    }
}
