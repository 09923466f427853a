// Gallery shell
//
// Owns the active category filter and the slideshow engine built for it.
// Every filter change tears the old engine down (timers, input binding, event
// forwarding) before the new one is created, so at most one engine is live.

use crate::models::{
    Direction, Filter, GallerySettings, ImageRecord, PlaybackState, PortfolioImage,
    SlideshowSettings,
};
use crate::slideshow::{
    EngineServices, InputBinding, InputEvent, InputResponse, InputRouter, SlideshowCallbacks,
    SlideshowEngine, SlideshowEvent,
};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Events emitted by the shell for the presentation layer
#[derive(Clone, Debug, PartialEq)]
pub enum GalleryEvent {
    /// A new filter is active and its engine was created
    FilterChanged { filter: Filter, total: usize },

    /// The two-digit position counter changed
    CounterChanged { label: String },

    /// Forwarded from the active engine
    Slideshow(SlideshowEvent),
}

/// One header tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTab {
    pub filter: Filter,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryView {
    pub filter: Filter,
    pub tabs: Vec<FilterTab>,
    pub current: Option<ImageRecord>,
    pub previous: Option<ImageRecord>,
    pub next: Option<ImageRecord>,
    pub playback: PlaybackState,
    pub counter: String,
    pub image_ready: bool,
    pub total: usize,
}

impl GalleryView {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn is_paused(&self) -> bool {
        self.playback == PlaybackState::Paused
    }
}

/// Two-digit, one-based position label; `00` for an empty slice.
pub fn counter_label(index: usize, total: usize) -> String {
    if total == 0 {
        "00".to_string()
    } else {
        format!("{:02}", index + 1)
    }
}

#[derive(Debug, Default)]
struct CounterState {
    generation: u64,
    index: usize,
    total: usize,
}

impl CounterState {
    fn label(&self) -> String {
        counter_label(self.index, self.total)
    }
}

struct ActiveGallery {
    filter: Filter,
    generation: u64,
    engine: Option<SlideshowEngine>,
    binding: Option<InputBinding>,
    forwarder: Option<JoinHandle<()>>,
    shut_down: bool,
}

impl ActiveGallery {
    /// Drop the binding first so no input reaches the engine being retired.
    fn teardown(&mut self) {
        self.binding = None;
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
    }
}

struct ShellInner {
    images: Vec<PortfolioImage>,
    gallery: GallerySettings,
    slideshow: SlideshowSettings,
    services: EngineServices,
    router: InputRouter,
    active: Mutex<ActiveGallery>,
    counter: Arc<Mutex<CounterState>>,
    events_tx: broadcast::Sender<GalleryEvent>,
    self_ref: Weak<ShellInner>,
}

/// Category filter shell around the slideshow engine
///
/// - Slices the portfolio by the active [`Filter`] and builds a fresh
///   [`SlideshowEngine`] for every selection
/// - Keeps the position counter in sync with the engine
/// - Routes window input to the active engine through its [`InputRouter`]
/// - Optionally chains into the next non-empty category when a sequence ends
///
/// Cheap to clone; clones share the same shell.
#[derive(Clone)]
pub struct GalleryShell {
    inner: Arc<ShellInner>,
}

impl GalleryShell {
    /// Create the shell and activate the configured default filter.
    pub fn new(
        images: Vec<PortfolioImage>,
        gallery: GallerySettings,
        slideshow: SlideshowSettings,
        services: EngineServices,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(100);

        let inner = Arc::new_cyclic(|self_ref| ShellInner {
            images,
            gallery,
            slideshow,
            services,
            router: InputRouter::new(),
            active: Mutex::new(ActiveGallery {
                filter: gallery.default_filter,
                generation: 0,
                engine: None,
                binding: None,
                forwarder: None,
                shut_down: false,
            }),
            counter: Arc::new(Mutex::new(CounterState::default())),
            events_tx,
            self_ref: self_ref.clone(),
        });

        let initial = inner.initial_filter();
        tracing::info!(
            "Gallery created with {} images, initial filter {}",
            inner.images.len(),
            initial
        );
        inner.switch(initial, None);

        Self { inner }
    }

    /// Visible tabs in header order.
    pub fn filters(&self) -> Vec<FilterTab> {
        let active = self.active_filter();
        self.inner
            .visible_filters()
            .map(|filter| FilterTab {
                filter,
                label: filter.label(),
                count: self.inner.count(filter),
                active: filter == active,
            })
            .collect()
    }

    /// Number of images per visible filter, in header order.
    pub fn filter_counts(&self) -> IndexMap<Filter, usize> {
        self.inner
            .visible_filters()
            .map(|filter| (filter, self.inner.count(filter)))
            .collect()
    }

    /// Activate `filter`, replacing the current engine.
    pub fn select_filter(&self, filter: Filter) {
        self.inner.switch(filter, None);
    }

    pub fn active_filter(&self) -> Filter {
        self.inner.lock_active().filter
    }

    pub fn navigate(&self, direction: Direction) {
        self.inner.with_engine(|engine| engine.advance(direction));
    }

    pub fn toggle_pause(&self) {
        self.inner.with_engine(SlideshowEngine::toggle_pause);
    }

    pub fn jump_to(&self, index: usize) {
        self.inner.with_engine(|engine| engine.jump_to(index));
    }

    pub fn image_loaded(&self, id: &str) {
        self.inner.with_engine(|engine| engine.image_loaded(id));
    }

    /// Deliver window input to the active engine.
    pub fn dispatch(&self, event: InputEvent) -> InputResponse {
        self.inner.router.dispatch(event)
    }

    pub fn router(&self) -> &InputRouter {
        &self.inner.router
    }

    pub fn counter_label(&self) -> String {
        self.inner.lock_counter().label()
    }

    /// Snapshot of everything needed for rendering.
    pub fn view(&self) -> GalleryView {
        let tabs = self.filters();
        let counter = self.counter_label();
        let active = self.inner.lock_active();

        match &active.engine {
            Some(engine) => GalleryView {
                filter: active.filter,
                tabs,
                current: engine.current().cloned(),
                previous: engine.previous().cloned(),
                next: engine.next().cloned(),
                playback: engine.playback(),
                counter,
                image_ready: engine.image_ready(),
                total: engine.len(),
            },
            None => GalleryView {
                filter: active.filter,
                tabs,
                current: None,
                previous: None,
                next: None,
                playback: PlaybackState::Empty,
                counter,
                image_ready: false,
                total: 0,
            },
        }
    }

    /// Subscribe to gallery events
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Tear down the active engine; further operations are ignored.
    pub fn shutdown(&self) {
        let mut active = self.inner.lock_active();
        if active.shut_down {
            return;
        }
        active.shut_down = true;
        active.teardown();
        tracing::info!("Gallery shut down");
    }
}

impl ShellInner {
    fn lock_active(&self) -> MutexGuard<'_, ActiveGallery> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_counter(&self) -> MutexGuard<'_, CounterState> {
        self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_engine<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&SlideshowEngine) -> R,
    {
        let active = self.lock_active();
        active.engine.as_ref().map(f)
    }

    fn is_visible(&self, filter: Filter) -> bool {
        filter != Filter::All || self.gallery.show_all_filter
    }

    fn visible_filters(&self) -> impl Iterator<Item = Filter> + '_ {
        Filter::ORDER
            .into_iter()
            .filter(move |filter| self.is_visible(*filter))
    }

    fn initial_filter(&self) -> Filter {
        let wanted = self.gallery.default_filter;
        if self.is_visible(wanted) {
            return wanted;
        }
        let fallback = self.visible_filters().next().unwrap_or(Filter::Photography);
        tracing::warn!(
            "Default filter {} is hidden, starting with {}",
            wanted,
            fallback
        );
        fallback
    }

    fn count(&self, filter: Filter) -> usize {
        self.images
            .iter()
            .filter(|image| filter.matches(image.category))
            .count()
    }

    /// Replace the active engine with one for `filter`.
    ///
    /// With `expected_generation` set, the switch only happens if no other
    /// selection was made since that generation.
    fn switch(&self, filter: Filter, expected_generation: Option<u64>) -> bool {
        let sequence = filter.apply(&self.images);
        let total = sequence.len();

        {
            let mut active = self.lock_active();
            if active.shut_down {
                return false;
            }
            if expected_generation.is_some_and(|expected| expected != active.generation) {
                tracing::debug!("Skipping stale switch to {}", filter);
                return false;
            }

            active.teardown();
            active.generation += 1;
            let generation = active.generation;

            *self.lock_counter() = CounterState {
                generation,
                index: 0,
                total,
            };

            let engine = SlideshowEngine::initialize(
                sequence,
                self.slideshow,
                self.callbacks(filter, generation),
                self.services.clone(),
            );
            active.binding = Some(engine.bind_input(&self.router));
            active.forwarder = Some(self.forward_events(&engine));
            active.engine = Some(engine);
            active.filter = filter;
        }

        self.services.metrics.record_filter_change();
        tracing::info!("Filter {} selected ({} images)", filter, total);

        // Ignore send errors - it's OK if no one is listening
        let _ = self
            .events_tx
            .send(GalleryEvent::FilterChanged { filter, total });
        let _ = self.events_tx.send(GalleryEvent::CounterChanged {
            label: counter_label(0, total),
        });
        true
    }

    fn callbacks(&self, filter: Filter, generation: u64) -> SlideshowCallbacks {
        let counter = Arc::clone(&self.counter);
        let events_tx = self.events_tx.clone();

        let callbacks = SlideshowCallbacks::new().on_position_change(move |index| {
            let label = {
                let mut counter = counter.lock().unwrap_or_else(PoisonError::into_inner);
                if counter.generation != generation {
                    return;
                }
                counter.index = index;
                counter.label()
            };
            let _ = events_tx.send(GalleryEvent::CounterChanged { label });
        });

        if !self.gallery.chain_categories {
            return callbacks;
        }

        let shell = self.self_ref.clone();
        let runtime = self.services.runtime.clone();
        callbacks.on_reach_end(move || {
            let shell = shell.clone();
            // The engine is still mid-notification; switch from a fresh task.
            runtime.spawn(async move {
                if let Some(shell) = shell.upgrade() {
                    shell.chain_from(filter, generation);
                }
            });
        })
    }

    /// Move on to the next non-empty visible filter after `filter`.
    fn chain_from(&self, filter: Filter, generation: u64) {
        let order: Vec<Filter> = self.visible_filters().collect();
        let Some(start) = order.iter().position(|f| *f == filter) else {
            return;
        };

        let next = (1..order.len())
            .map(|offset| order[(start + offset) % order.len()])
            .find(|candidate| self.count(*candidate) > 0);

        match next {
            Some(next) => {
                tracing::debug!("Sequence {} finished, chaining to {}", filter, next);
                self.switch(next, Some(generation));
            }
            None => tracing::debug!("Sequence {} finished, nothing to chain to", filter),
        }
    }

    fn forward_events(&self, engine: &SlideshowEngine) -> JoinHandle<()> {
        let mut rx = engine.subscribe();
        let events_tx = self.events_tx.clone();

        self.services.runtime.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let _ = events_tx.send(GalleryEvent::Slideshow(event));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Gallery event forwarding lagged by {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
