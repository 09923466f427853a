// Slideshow engine
//
// This module provides the SlideshowEngine which owns one SlideshowState
// behind a mutex, arbitrates timers against user input and emits change
// events for the gallery shell and the UI.

pub mod deferred;
pub mod gesture;
pub mod input;

pub use deferred::DeferredSlot;
pub use gesture::{Gesture, GestureRecognizer, GestureThresholds, MoveHint, classify};
pub use input::{InputBinding, InputEvent, InputHandler, InputResponse, InputRouter, Key};

use crate::metrics::Metrics;
use crate::models::{
    Direction, ImageRecord, ImageSequence, PlaybackState, SlideshowSettings, SlideshowState,
};
use crate::services::preload::{NoopPreloader, Preloader};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// Change events emitted by the engine
///
/// Emitted after the state lock is released, in the order listed for a
/// single transition.
#[derive(Clone, Debug, PartialEq)]
pub enum SlideshowEvent {
    /// The displayed index changed (manual, swipe, keyboard or autoplay)
    PositionChanged { index: usize, total: usize },

    /// Forward navigation wrapped from the last image to the first
    ReachedEnd,

    /// Playing / Suspended / Paused changed
    PlaybackChanged { playback: PlaybackState },

    /// The displayed image finished loading
    ImageReady { index: usize },
}

type PositionCallback = Box<dyn Fn(usize) + Send + Sync>;
type ReachEndCallback = Box<dyn Fn() + Send + Sync>;

/// Optional notification hooks supplied by the owner of the engine.
#[derive(Default)]
pub struct SlideshowCallbacks {
    on_position_change: Option<PositionCallback>,
    on_reach_end: Option<ReachEndCallback>,
}

impl SlideshowCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_position_change<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_position_change = Some(Box::new(f));
        self
    }

    pub fn on_reach_end<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_reach_end = Some(Box::new(f));
        self
    }
}

/// Runtime collaborators shared by every engine of a session.
#[derive(Clone)]
pub struct EngineServices {
    pub runtime: Handle,
    pub preloader: Arc<dyn Preloader>,
    pub metrics: Arc<Metrics>,
}

impl EngineServices {
    /// Services without preloading and with private metrics.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            preloader: Arc::new(NoopPreloader),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_preloader(mut self, preloader: Arc<dyn Preloader>) -> Self {
        self.preloader = preloader;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Everything guarded by the engine's single lock.
struct EngineCore {
    state: SlideshowState,
    gesture: GestureRecognizer,
    autoplay: DeferredSlot,
    autoplay_epoch: u64,
    autoplay_armed: bool,
    resume: DeferredSlot,
    resume_token: u64,
    torn_down: bool,
}

struct EngineInner {
    sequence: ImageSequence,
    settings: SlideshowSettings,
    callbacks: SlideshowCallbacks,
    services: EngineServices,
    events_tx: broadcast::Sender<SlideshowEvent>,
    core: Mutex<EngineCore>,
    self_ref: Weak<EngineInner>,
}

/// Interactive slideshow over one [`ImageSequence`]
///
/// - Wraparound navigation with a single end-of-sequence notification
/// - Autoplay on a repeating timer, suppressed for a short window after
///   manual navigation and resumed automatically
/// - Durable pause through [`toggle_pause()`](Self::toggle_pause) or a tap
/// - Swipe and arrow-key input through an [`InputRouter`] binding
/// - Adjacent-image preloading on every index change
///
/// All operations are infallible. An empty sequence yields an inert engine
/// in [`PlaybackState::Empty`]. Dropping the engine cancels its timers; any
/// timer task still in flight finds the engine gone and does nothing.
pub struct SlideshowEngine {
    inner: Arc<EngineInner>,
}

impl SlideshowEngine {
    /// Create an engine positioned on the first image with autoplay on.
    pub fn initialize(
        sequence: ImageSequence,
        settings: SlideshowSettings,
        callbacks: SlideshowCallbacks,
        services: EngineServices,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        let len = sequence.len();

        let inner = Arc::new_cyclic(|self_ref| EngineInner {
            sequence,
            settings,
            callbacks,
            services,
            events_tx,
            core: Mutex::new(EngineCore {
                state: SlideshowState::new(len),
                gesture: GestureRecognizer::new(GestureThresholds::from(&settings)),
                autoplay: DeferredSlot::new("autoplay"),
                autoplay_epoch: 0,
                autoplay_armed: false,
                resume: DeferredSlot::new("auto-resume"),
                resume_token: 0,
                torn_down: false,
            }),
            self_ref: self_ref.clone(),
        });

        if len == 0 {
            tracing::info!("Slideshow initialized with an empty sequence");
        } else {
            let adjacent = {
                let mut core = inner.lock_core();
                inner.sync_autoplay(&mut core);
                inner.adjacent_records(&core.state)
            };
            inner.preload(adjacent);
            tracing::debug!("Slideshow initialized with {} images", len);
        }

        Self { inner }
    }

    /// Move one image forward or backward with wraparound.
    pub fn advance(&self, direction: Direction) {
        self.inner.services.metrics.record_manual_navigation();
        self.inner.navigate(direction);
    }

    /// Show an explicit index; out-of-range indices are ignored.
    pub fn jump_to(&self, index: usize) {
        self.inner.jump_to(index);
    }

    /// Flip the durable user pause.
    pub fn toggle_pause(&self) {
        self.inner.toggle_pause();
    }

    /// Report that the asset of record `id` finished loading.
    pub fn image_loaded(&self, id: &str) {
        self.inner.image_loaded(id);
    }

    /// Route window input to this engine until the returned guard is dropped.
    pub fn bind_input(&self, router: &InputRouter) -> InputBinding {
        let handler: Weak<dyn InputHandler> = self.inner.self_ref.clone();
        router.bind(handler)
    }

    /// Feed one input event directly, bypassing any router.
    pub fn handle_input(&self, event: InputEvent) -> InputResponse {
        self.inner.handle_input(event)
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<SlideshowEvent> {
        self.inner.events_tx.subscribe()
    }

    pub fn snapshot(&self) -> SlideshowState {
        self.inner.lock_core().state.clone()
    }

    pub fn playback(&self) -> PlaybackState {
        self.inner.lock_core().state.playback()
    }

    pub fn current_index(&self) -> Option<usize> {
        let core = self.inner.lock_core();
        (!core.state.is_empty()).then_some(core.state.current_index)
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        let index = self.current_index()?;
        self.inner.sequence.get(index)
    }

    pub fn previous(&self) -> Option<&ImageRecord> {
        let index = self.inner.lock_core().state.previous_index()?;
        self.inner.sequence.get(index)
    }

    pub fn next(&self) -> Option<&ImageRecord> {
        let index = self.inner.lock_core().state.next_index()?;
        self.inner.sequence.get(index)
    }

    pub fn image_ready(&self) -> bool {
        self.inner.lock_core().state.image_loaded
    }

    /// Whether the repeating autoplay timer is currently armed.
    pub fn autoplay_armed(&self) -> bool {
        let core = self.inner.lock_core();
        core.autoplay_armed && core.autoplay.is_pending()
    }

    /// Whether an auto-resume is waiting to fire.
    pub fn resume_pending(&self) -> bool {
        self.inner.lock_core().resume.is_pending()
    }

    pub fn len(&self) -> usize {
        self.inner.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sequence.is_empty()
    }

    pub fn sequence(&self) -> ImageSequence {
        Arc::clone(&self.inner.sequence)
    }

    pub fn settings(&self) -> &SlideshowSettings {
        &self.inner.settings
    }

    /// Cancel all timers and ignore every further operation.
    pub fn shutdown(&self) {
        let mut core = self.inner.lock_core();
        if core.torn_down {
            return;
        }
        core.torn_down = true;
        core.autoplay.cancel();
        core.autoplay_armed = false;
        core.resume.cancel();
        core.gesture.cancel();
        tracing::debug!("Slideshow engine shut down");
    }
}

impl Drop for SlideshowEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EngineInner {
    fn lock_core(&self) -> MutexGuard<'_, EngineCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `update_fn` under the lock, then emit what changed.
    ///
    /// Timers are re-synchronized before the lock is released; events,
    /// callbacks and preloads run after it.
    fn update<F>(&self, update_fn: F) -> Vec<SlideshowEvent>
    where
        F: FnOnce(&mut EngineCore),
    {
        let (changes, adjacent) = {
            let mut core = self.lock_core();
            if core.torn_down {
                return Vec::new();
            }
            let old_state = core.state.clone();

            update_fn(&mut core);

            let changes = Self::detect_changes(&old_state, &mut core.state);
            self.sync_autoplay(&mut core);

            let adjacent = if old_state.current_index != core.state.current_index {
                self.adjacent_records(&core.state)
            } else {
                Vec::new()
            };
            (changes, adjacent)
        };

        self.emit(&changes);
        self.preload(adjacent);
        changes
    }

    /// Compare two states and consume the end-of-sequence flag.
    fn detect_changes(old: &SlideshowState, new: &mut SlideshowState) -> Vec<SlideshowEvent> {
        let mut changes = Vec::new();

        if old.current_index != new.current_index {
            changes.push(SlideshowEvent::PositionChanged {
                index: new.current_index,
                total: new.len,
            });
        }

        if new.take_end_signal() {
            changes.push(SlideshowEvent::ReachedEnd);
        }

        if old.playback() != new.playback() {
            changes.push(SlideshowEvent::PlaybackChanged {
                playback: new.playback(),
            });
        }

        if !old.image_loaded && new.image_loaded {
            changes.push(SlideshowEvent::ImageReady {
                index: new.current_index,
            });
        }

        changes
    }

    fn emit(&self, changes: &[SlideshowEvent]) {
        for change in changes {
            match change {
                SlideshowEvent::PositionChanged { index, .. } => {
                    if let Some(callback) = &self.callbacks.on_position_change {
                        callback(*index);
                    }
                }
                SlideshowEvent::ReachedEnd => {
                    self.services.metrics.record_sequence_completed();
                    if let Some(callback) = &self.callbacks.on_reach_end {
                        callback();
                    }
                }
                _ => {}
            }

            // Ignore send errors - it's OK if no one is listening
            if self.events_tx.send(change.clone()).is_ok() {
                self.services.metrics.record_event_broadcast();
            }
        }
    }

    /// Arm or disarm the repeating autoplay timer to match the state.
    fn sync_autoplay(&self, core: &mut EngineCore) {
        let should_run = core.state.autoplay_should_run();

        if should_run && !core.autoplay_armed {
            core.autoplay_epoch += 1;
            let epoch = core.autoplay_epoch;
            let engine = self.self_ref.clone();
            core.autoplay.schedule_repeating(
                &self.services.runtime,
                self.settings.autoplay_interval(),
                move || {
                    engine
                        .upgrade()
                        .is_some_and(|engine| engine.autoplay_tick(epoch))
                },
            );
            core.autoplay_armed = true;
            tracing::trace!("Autoplay armed (epoch {})", epoch);
        } else if !should_run && core.autoplay_armed {
            core.autoplay.cancel();
            core.autoplay_epoch += 1;
            core.autoplay_armed = false;
            tracing::trace!("Autoplay disarmed");
        }
    }

    /// One autoplay fire. Returns whether the timer should keep running.
    fn autoplay_tick(&self, epoch: u64) -> bool {
        let mut advanced = false;
        self.update(|core| {
            if core.autoplay_epoch != epoch || !core.state.autoplay_should_run() {
                return;
            }
            core.state.step(Direction::Next);
            advanced = true;
        });

        if advanced {
            self.services.metrics.record_autoplay_advance();
        }
        advanced
    }

    /// Hold autoplay off and (re)schedule the single pending auto-resume.
    fn suppress(&self, core: &mut EngineCore) {
        if !core.state.suppress_autoplay() {
            return;
        }

        core.resume_token += 1;
        let token = core.resume_token;
        let engine = self.self_ref.clone();
        core.resume
            .schedule(&self.services.runtime, self.settings.resume_delay(), move || {
                if let Some(engine) = engine.upgrade() {
                    engine.resume_after_suppression(token);
                }
            });
    }

    fn resume_after_suppression(&self, token: u64) {
        self.update(|core| {
            if core.resume_token == token {
                core.state.resume_autoplay();
            }
        });
    }

    fn navigate(&self, direction: Direction) {
        if self.sequence.is_empty() {
            return;
        }
        self.update(|core| {
            core.state.step(direction);
            self.suppress(core);
        });
    }

    fn jump_to(&self, index: usize) {
        if index >= self.sequence.len() {
            tracing::warn!(
                "Ignoring jump to index {} (sequence has {} images)",
                index,
                self.sequence.len()
            );
            return;
        }
        self.services.metrics.record_manual_navigation();
        self.update(|core| {
            core.state.set_index(index);
            self.suppress(core);
        });
    }

    fn toggle_pause(&self) {
        if self.sequence.is_empty() {
            return;
        }
        self.update(|core| {
            core.state.toggle_pause();
            core.resume.cancel();
            core.resume_token += 1;
            tracing::debug!(
                "Playback {}",
                if core.state.paused_by_user { "paused" } else { "resumed" }
            );
        });
    }

    fn image_loaded(&self, id: &str) {
        self.update(|core| {
            let current = self.sequence.get(core.state.current_index);
            if current.is_some_and(|record| record.id == id) {
                core.state.image_loaded = true;
            } else {
                tracing::trace!("Ignoring load completion for {} (not displayed)", id);
            }
        });
    }

    /// Records before and after the current index, without duplicates.
    fn adjacent_records(&self, state: &SlideshowState) -> Vec<ImageRecord> {
        let mut indices = Vec::with_capacity(2);
        for index in [state.previous_index(), state.next_index()]
            .into_iter()
            .flatten()
        {
            if index != state.current_index && !indices.contains(&index) {
                indices.push(index);
            }
        }
        indices
            .into_iter()
            .filter_map(|index| self.sequence.get(index).cloned())
            .collect()
    }

    fn preload(&self, records: Vec<ImageRecord>) {
        for record in records {
            self.services.metrics.record_preload_request();
            self.services.preloader.preload(&record);
        }
    }
}

impl InputHandler for EngineInner {
    fn handle_input(&self, event: InputEvent) -> InputResponse {
        if self.sequence.is_empty() {
            return InputResponse::Ignored;
        }

        match event {
            InputEvent::Key(key) => match key.direction() {
                Some(direction) => {
                    self.services.metrics.record_key_press();
                    self.navigate(direction);
                    InputResponse::Handled
                }
                None => InputResponse::Ignored,
            },
            InputEvent::PointerDown { x, y } => {
                let mut core = self.lock_core();
                if core.torn_down {
                    return InputResponse::Ignored;
                }
                core.gesture.pointer_down(x, y);
                InputResponse::Handled
            }
            InputEvent::PointerMove { x, y } => {
                let mut core = self.lock_core();
                if core.torn_down {
                    return InputResponse::Ignored;
                }
                match core.gesture.pointer_move(x, y) {
                    MoveHint::Capture => InputResponse::CaptureGesture,
                    MoveHint::Pass => InputResponse::Ignored,
                }
            }
            InputEvent::PointerUp { x, y } => {
                let gesture = {
                    let mut core = self.lock_core();
                    if core.torn_down {
                        return InputResponse::Ignored;
                    }
                    core.gesture.pointer_up(x, y)
                };

                match gesture {
                    Gesture::Swipe(direction) => {
                        tracing::debug!("Swipe recognized: {:?}", direction);
                        self.services.metrics.record_swipe();
                        self.navigate(direction);
                        InputResponse::Handled
                    }
                    Gesture::Tap => {
                        self.services.metrics.record_tap();
                        self.toggle_pause();
                        InputResponse::Handled
                    }
                    Gesture::Ignored => InputResponse::Ignored,
                }
            }
            InputEvent::PointerCancel => {
                self.lock_core().gesture.cancel();
                InputResponse::Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::preload::MockPreloader;
    use std::sync::atomic::Ordering;

    fn records(ids: &[&str]) -> ImageSequence {
        ids.iter()
            .map(|id| ImageRecord {
                id: id.to_string(),
                display_text: format!("Image {id}"),
                locator: format!("https://cdn.example/{id}.jpg"),
            })
            .collect()
    }

    fn engine_with(preloader: MockPreloader, ids: &[&str]) -> SlideshowEngine {
        let services =
            EngineServices::new(Handle::current()).with_preloader(Arc::new(preloader));
        SlideshowEngine::initialize(
            records(ids),
            SlideshowSettings::default(),
            SlideshowCallbacks::new(),
            services,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_preloads_neighbours_of_first_image() {
        let mut preloader = MockPreloader::new();
        preloader
            .expect_preload()
            .withf(|r| r.id == "c")
            .times(1)
            .return_const(());
        preloader
            .expect_preload()
            .withf(|r| r.id == "b")
            .times(1)
            .return_const(());

        let engine = engine_with(preloader, &["a", "b", "c"]);
        assert_eq!(engine.current().map(|r| r.id.as_str()), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_change_preloads_new_neighbours() {
        let mut preloader = MockPreloader::new();
        preloader
            .expect_preload()
            .withf(|r| r.id == "a")
            .times(1)
            .return_const(());
        preloader
            .expect_preload()
            .withf(|r| r.id == "b")
            .times(1)
            .return_const(());
        preloader
            .expect_preload()
            .withf(|r| r.id == "c")
            .times(2)
            .return_const(());

        let engine = engine_with(preloader, &["a", "b", "c"]);
        engine.advance(Direction::Next);
        assert_eq!(engine.current_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_images_preload_once() {
        let mut preloader = MockPreloader::new();
        preloader
            .expect_preload()
            .withf(|r| r.id == "b")
            .times(1)
            .return_const(());

        let _engine = engine_with(preloader, &["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_image_never_preloads_or_autoplays() {
        let mut preloader = MockPreloader::new();
        preloader.expect_preload().never();

        let engine = engine_with(preloader, &["solo"]);
        assert!(!engine.autoplay_armed());
        assert_eq!(engine.playback(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_engine_is_inert() {
        let mut preloader = MockPreloader::new();
        preloader.expect_preload().never();

        let engine = engine_with(preloader, &[]);
        let mut rx = engine.subscribe();

        engine.advance(Direction::Next);
        engine.advance(Direction::Previous);
        engine.jump_to(0);
        engine.toggle_pause();
        engine.image_loaded("anything");

        assert_eq!(engine.playback(), PlaybackState::Empty);
        assert_eq!(engine.current(), None);
        assert_eq!(engine.current_index(), None);
        assert!(!engine.autoplay_armed());
        assert_eq!(
            engine.handle_input(InputEvent::Key(Key::ArrowRight)),
            InputResponse::Ignored
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_for_wraparound() {
        let engine = engine_with(MockPreloader::default_permissive(), &["a", "b"]);
        let mut rx = engine.subscribe();

        engine.toggle_pause();
        engine.advance(Direction::Next);
        engine.advance(Direction::Next);

        assert_eq!(
            rx.try_recv().unwrap(),
            SlideshowEvent::PlaybackChanged {
                playback: PlaybackState::Paused
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SlideshowEvent::PositionChanged { index: 1, total: 2 }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SlideshowEvent::PositionChanged { index: 0, total: 2 }
        );
        assert_eq!(rx.try_recv().unwrap(), SlideshowEvent::ReachedEnd);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_loaded_only_for_displayed_record() {
        let engine = engine_with(MockPreloader::default_permissive(), &["a", "b", "c"]);
        let mut rx = engine.subscribe();

        engine.image_loaded("b");
        assert!(!engine.image_ready());

        engine.image_loaded("a");
        assert!(engine.image_ready());
        assert_eq!(
            rx.try_recv().unwrap(),
            SlideshowEvent::ImageReady { index: 0 }
        );

        engine.advance(Direction::Next);
        assert!(!engine.image_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jump_out_of_range_is_ignored() {
        let engine = engine_with(MockPreloader::default_permissive(), &["a", "b", "c"]);
        engine.jump_to(7);
        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(engine.playback(), PlaybackState::Playing);

        engine.jump_to(2);
        assert_eq!(engine.current_index(), Some(2));
        assert_eq!(engine.playback(), PlaybackState::Suspended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_everything() {
        let engine = engine_with(MockPreloader::default_permissive(), &["a", "b", "c"]);
        engine.advance(Direction::Next);
        assert!(engine.resume_pending());

        engine.shutdown();
        assert!(!engine.autoplay_armed());
        assert!(!engine.resume_pending());

        engine.advance(Direction::Next);
        assert_eq!(engine.current_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_attribute_input_sources() {
        let metrics = Arc::new(Metrics::new());
        let services = EngineServices::new(Handle::current()).with_metrics(Arc::clone(&metrics));
        let engine = SlideshowEngine::initialize(
            records(&["a", "b", "c"]),
            SlideshowSettings::default(),
            SlideshowCallbacks::new(),
            services,
        );

        engine.advance(Direction::Next);
        engine.handle_input(InputEvent::Key(Key::ArrowLeft));
        engine.handle_input(InputEvent::PointerDown { x: 100.0, y: 50.0 });
        engine.handle_input(InputEvent::PointerUp { x: 20.0, y: 55.0 });
        engine.handle_input(InputEvent::PointerDown { x: 100.0, y: 50.0 });
        engine.handle_input(InputEvent::PointerUp { x: 101.0, y: 51.0 });

        assert_eq!(metrics.manual_navigations.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.key_presses.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.swipes.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.taps.load(Ordering::Relaxed), 1);
        assert_eq!(engine.playback(), PlaybackState::Paused);
    }

    impl MockPreloader {
        fn default_permissive() -> Self {
            let mut preloader = MockPreloader::new();
            preloader.expect_preload().return_const(());
            preloader
        }
    }
}
