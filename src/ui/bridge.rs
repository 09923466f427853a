// UiBridge - Coordinates between the tokio runtime and the Slint event loop
//
// Engine timers, image loads and the gallery subscription all run off the UI
// thread. The bridge queues their UI updates through a bounded channel and a
// handler thread that forwards each one with upgrade_in_event_loop.

use crate::metrics::Metrics;
use slint::{ComponentHandle, Weak};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Channel capacity; updates beyond this are dropped rather than queued.
pub const UI_UPDATE_CAPACITY: usize = 100;

/// Cloneable handle for updating the UI from any thread
///
/// # Example
/// ```ignore
/// let bridge = UiBridge::new(&ui, runtime.handle().clone(), metrics);
///
/// bridge.spawn_async(move || async move {
///     let image = cache.load(&locator).await;
///     bridge.update_ui(move |ui| ui.set_image_ready(image.is_ok()));
/// });
/// ```
pub struct UiBridge<T: ComponentHandle> {
    ui_weak: Weak<T>,
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
    metrics: Arc<Metrics>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for UiBridge<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T: ComponentHandle + 'static> UiBridge<T> {
    /// Create the bridge and its handler thread.
    ///
    /// The thread exits once every bridge clone is dropped or the event loop
    /// stops accepting updates.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle, metrics: Arc<Metrics>) -> Self {
        let ui_weak = ui.as_weak();
        let (ui_update_tx, ui_update_rx) = mpsc::channel::<UiUpdate<T>>(UI_UPDATE_CAPACITY);

        let handler_weak = ui_weak.clone();
        std::thread::Builder::new()
            .name("folio-ui-bridge".to_string())
            .spawn(move || Self::forward_updates(handler_weak, ui_update_rx))
            .map_err(|e| tracing::error!("Failed to start UI bridge thread: {}", e))
            .ok();

        Self {
            ui_weak,
            tokio_handle,
            ui_update_tx,
            metrics,
        }
    }

    fn forward_updates(ui_weak: Weak<T>, mut ui_update_rx: mpsc::Receiver<UiUpdate<T>>) {
        tracing::debug!("UI bridge handler thread started");

        while let Some(update_fn) = ui_update_rx.blocking_recv() {
            // Queue the update onto Slint's event loop thread
            let result = ui_weak.upgrade_in_event_loop(move |ui| {
                update_fn(&ui);
            });

            if let Err(e) = result {
                // The event loop has stopped; nothing left to update
                tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                break;
            }
        }

        tracing::debug!("UI bridge handler thread terminated");
    }

    /// Schedule a UI update from any thread.
    ///
    /// Never blocks: when the channel is full the update is dropped and counted.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.ui_update_tx.try_send(Box::new(update)) {
            Ok(_) => self.metrics.record_ui_update(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_ui_channel_full();
                tracing::warn!("UI update channel full - skipping update to prevent backpressure");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to send UI update - handler thread has stopped");
            }
        }
    }

    /// Spawn an async task on the tokio runtime, typically from a Slint callback.
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
