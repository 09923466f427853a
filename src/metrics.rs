// Slideshow metrics module
//
// Lightweight counters describing how the gallery was used during a session

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session metrics
///
/// Uses atomic operations so engine timers, input callbacks and the UI
/// subscription thread can record without locks. Logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Navigations requested through buttons, thumbnails or jumps
    pub manual_navigations: AtomicU64,

    /// Pointer gestures classified as swipes
    pub swipes: AtomicU64,

    /// Pointer gestures classified as taps
    pub taps: AtomicU64,

    /// Arrow keys handled by a bound engine
    pub key_presses: AtomicU64,

    /// Transitions driven by the autoplay timer
    pub autoplay_advances: AtomicU64,

    /// Forward wraps from the last image to the first
    pub sequences_completed: AtomicU64,

    /// Filter selections (including the initial one)
    pub filter_changes: AtomicU64,

    /// Adjacent images handed to the preloader
    pub preload_requests: AtomicU64,

    /// Engine events broadcast to subscribers
    pub event_broadcasts: AtomicU64,

    /// UI updates queued on the event loop
    pub ui_updates: AtomicU64,

    /// UI updates dropped because the bridge channel was full
    pub ui_update_channel_full: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            manual_navigations: AtomicU64::new(0),
            swipes: AtomicU64::new(0),
            taps: AtomicU64::new(0),
            key_presses: AtomicU64::new(0),
            autoplay_advances: AtomicU64::new(0),
            sequences_completed: AtomicU64::new(0),
            filter_changes: AtomicU64::new(0),
            preload_requests: AtomicU64::new(0),
            event_broadcasts: AtomicU64::new(0),
            ui_updates: AtomicU64::new(0),
            ui_update_channel_full: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_manual_navigation(&self) {
        self.manual_navigations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_swipe(&self) {
        self.swipes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tap(&self) {
        self.taps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_key_press(&self) {
        self.key_presses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_autoplay_advance(&self) {
        self.autoplay_advances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sequence_completed(&self) {
        self.sequences_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filter_change(&self) {
        self.filter_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preload_request(&self) {
        self.preload_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_broadcast(&self) {
        self.event_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_channel_full(&self) {
        self.ui_update_channel_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of navigations that came from the user rather than autoplay.
    pub fn manual_ratio(&self) -> f64 {
        let manual = self.manual_navigations.load(Ordering::Relaxed)
            + self.swipes.load(Ordering::Relaxed)
            + self.key_presses.load(Ordering::Relaxed);
        let total = manual + self.autoplay_advances.load(Ordering::Relaxed);
        if total > 0 {
            manual as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Navigation: {} manual, {} swipes, {} keys, {} autoplay ({:.0}% user driven)",
            self.manual_navigations.load(Ordering::Relaxed),
            self.swipes.load(Ordering::Relaxed),
            self.key_presses.load(Ordering::Relaxed),
            self.autoplay_advances.load(Ordering::Relaxed),
            self.manual_ratio() * 100.0
        );
        tracing::info!(
            "Taps: {}, sequences completed: {}, filter changes: {}",
            self.taps.load(Ordering::Relaxed),
            self.sequences_completed.load(Ordering::Relaxed),
            self.filter_changes.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Preload requests: {}, event broadcasts: {}",
            self.preload_requests.load(Ordering::Relaxed),
            self.event_broadcasts.load(Ordering::Relaxed)
        );
        tracing::info!(
            "UI updates: {}, channel full errors: {}",
            self.ui_updates.load(Ordering::Relaxed),
            self.ui_update_channel_full.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.swipes.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.autoplay_advances.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_navigation_sources() {
        let metrics = Metrics::new();

        metrics.record_manual_navigation();
        metrics.record_swipe();
        metrics.record_swipe();
        metrics.record_key_press();
        metrics.record_tap();

        assert_eq!(metrics.manual_navigations.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.swipes.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.key_presses.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.taps.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_manual_ratio() {
        let metrics = Metrics::new();
        assert_eq!(metrics.manual_ratio(), 0.0);

        metrics.record_manual_navigation();
        metrics.record_autoplay_advance();
        metrics.record_autoplay_advance();
        metrics.record_autoplay_advance();

        assert_eq!(metrics.manual_ratio(), 0.25);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }

    #[test]
    fn test_ui_counters() {
        let metrics = Metrics::new();

        metrics.record_ui_update();
        metrics.record_ui_channel_full();
        metrics.record_event_broadcast();
        metrics.record_preload_request();
        metrics.record_filter_change();
        metrics.record_sequence_completed();

        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.ui_update_channel_full.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.event_broadcasts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.preload_requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.filter_changes.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.sequences_completed.load(Ordering::Relaxed), 1);
    }
}
