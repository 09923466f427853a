// GUI Controller - Bridges the Slint window with the gallery shell
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - GalleryShell (filters, active slideshow engine, counter)
// - ImageCache (decoded images for the stage and thumbnails)
// - UiBridge (async/GUI coordination)
//
// It handles:
// - Slint callbacks → gallery operations and routed input
// - Gallery events → UI refreshes
// - Loading the displayed images and reporting load completion

use crate::gallery::{GalleryEvent, GalleryShell, GalleryView};
use crate::metrics::Metrics;
use crate::models::{Direction, Filter, ImageRecord, SiteSettings};
use crate::services::preload::{DecodedImage, ImageCache};
use crate::slideshow::{InputEvent, InputResponse, Key, SlideshowEvent};
use crate::ui::bridge::UiBridge;
use anyhow::{Context, Result};
use slint::{ModelRc, Rgba8Pixel, SharedPixelBuffer, SharedString, VecModel};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

// Include the generated Slint code
slint::include_modules!();

/// Decoded images for the three visible slots of one view.
#[derive(Default)]
struct SlotImages {
    current: Option<Arc<DecodedImage>>,
    previous: Option<Arc<DecodedImage>>,
    next: Option<Arc<DecodedImage>>,
}

/// Shared pieces every callback and the subscription thread need.
#[derive(Clone)]
struct ViewContext {
    bridge: UiBridge<MainWindow>,
    gallery: GalleryShell,
    cache: Arc<ImageCache>,
    loading: Arc<Mutex<HashSet<String>>>,
}

/// GUI Controller that wires up the Slint window with the gallery
///
/// # Example
/// ```ignore
/// let gallery = GalleryShell::new(images, config.gallery, config.slideshow, services);
/// let handle = runtime.handle().clone();
/// let controller = GuiController::new(gallery, cache, &config.site, metrics, handle)?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between tokio and Slint
    _bridge: UiBridge<MainWindow>,

    gallery: GalleryShell,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `gallery` - The gallery shell driving the slideshow
    /// * `cache` - Decoded image cache shared with the preloader
    /// * `site` - Header and contact information
    /// * `metrics` - Session metrics
    /// * `tokio_handle` - Handle to the tokio runtime for image loads
    pub fn new(
        gallery: GalleryShell,
        cache: Arc<ImageCache>,
        site: &SiteSettings,
        metrics: Arc<Metrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        // Create the Slint UI
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let bridge = UiBridge::new(&ui, tokio_handle, metrics);

        Self::apply_site(&ui, site);
        Self::setup_callbacks(&ui, &gallery);

        let context = ViewContext {
            bridge: bridge.clone(),
            gallery: gallery.clone(),
            cache,
            loading: Arc::new(Mutex::new(HashSet::new())),
        };

        // Subscribe before the first render so no event is missed
        Self::setup_gallery_subscription(context.clone(), gallery.subscribe());
        context.refresh();

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            gallery,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        let result = self.ui.run();
        self.gallery.shutdown();
        result
    }

    fn apply_site(ui: &MainWindow, site: &SiteSettings) {
        ui.set_site_title(site.title.clone().into());
        ui.set_site_subtitle(site.subtitle.clone().into());

        let lines: Vec<SharedString> = site
            .contact
            .iter()
            .map(|line| SharedString::from(line.as_str()))
            .collect();
        ui.set_contact_lines(ModelRc::new(VecModel::from(lines)));
    }

    fn setup_callbacks(ui: &MainWindow, gallery: &GalleryShell) {
        let g = gallery.clone();
        ui.on_filter_selected(move |key| match Filter::from_key(&key) {
            Some(filter) => {
                tracing::info!("Filter tab clicked: {}", filter);
                g.select_filter(filter);
            }
            None => tracing::warn!("Unknown filter key from UI: {}", key),
        });

        let g = gallery.clone();
        ui.on_navigate_previous(move || g.navigate(Direction::Previous));

        let g = gallery.clone();
        ui.on_navigate_next(move || g.navigate(Direction::Next));

        let g = gallery.clone();
        ui.on_key_input(move |name| {
            g.dispatch(InputEvent::Key(Key::from_name(&name)));
        });

        let g = gallery.clone();
        ui.on_pointer_down(move |x, y| {
            g.dispatch(InputEvent::PointerDown { x, y });
        });

        let g = gallery.clone();
        ui.on_pointer_move(move |x, y| {
            // The window has no scroll container, so a captured drag needs no suppression here
            if g.dispatch(InputEvent::PointerMove { x, y }) == InputResponse::CaptureGesture {
                tracing::trace!("Horizontal drag captured at ({}, {})", x, y);
            }
        });

        let g = gallery.clone();
        ui.on_pointer_up(move |x, y| {
            g.dispatch(InputEvent::PointerUp { x, y });
        });

        let g = gallery.clone();
        ui.on_pointer_cancel(move || {
            g.dispatch(InputEvent::PointerCancel);
        });
    }

    /// Listen for gallery events on a background thread and refresh the UI.
    fn setup_gallery_subscription(context: ViewContext, mut rx: broadcast::Receiver<GalleryEvent>) {
        std::thread::spawn(move || {
            tracing::debug!("Gallery subscription thread started");

            loop {
                match rx.blocking_recv() {
                    Ok(event) => {
                        tracing::trace!("Gallery event received: {:?}", event);

                        match event {
                            GalleryEvent::CounterChanged { label } => {
                                context
                                    .bridge
                                    .update_ui(move |ui| ui.set_counter(label.into()));
                            }
                            GalleryEvent::Slideshow(SlideshowEvent::ReachedEnd) => {
                                tracing::debug!("Slideshow reached the end of its sequence");
                            }
                            GalleryEvent::FilterChanged { .. } | GalleryEvent::Slideshow(_) => {
                                context.refresh();
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Gallery subscription lagged by {} events", skipped);
                        context.refresh();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            tracing::debug!("Gallery subscription thread terminated");
        });
    }
}

impl ViewContext {
    /// Push the current gallery view to the window and fetch missing images.
    fn refresh(&self) {
        let view = self.gallery.view();
        let images = SlotImages {
            current: self.cached(view.current.as_ref()),
            previous: self.cached(view.previous.as_ref()),
            next: self.cached(view.next.as_ref()),
        };

        if let Some(current) = &view.current {
            if images.current.is_some() && !view.image_ready {
                self.gallery.image_loaded(&current.id);
            }
        }

        for record in [&view.current, &view.previous, &view.next]
            .into_iter()
            .flatten()
        {
            if !self.cache.contains(&record.locator) {
                self.load(record.clone());
            }
        }

        self.bridge
            .update_ui(move |ui| apply_view(ui, &view, &images));
    }

    fn cached(&self, record: Option<&ImageRecord>) -> Option<Arc<DecodedImage>> {
        record.and_then(|record| self.cache.get(&record.locator))
    }

    /// Load one image; completion triggers another refresh.
    fn load(&self, record: ImageRecord) {
        {
            let mut loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
            if !loading.insert(record.locator.clone()) {
                return;
            }
        }

        let context = self.clone();
        self.bridge.spawn_async(move || async move {
            let result = context.cache.load(&record.locator).await;
            context
                .loading
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&record.locator);

            match result {
                Ok(_) => {
                    tracing::debug!("Image {} ready", record.id);
                    context.refresh();
                }
                Err(e) => tracing::warn!(
                    "Failed to load image {} ({}): {}",
                    record.id,
                    record.locator,
                    e
                ),
            }
        });
    }
}

fn to_slint_image(image: &DecodedImage) -> slint::Image {
    let buffer =
        SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(&image.rgba, image.width, image.height);
    slint::Image::from_rgba8(buffer)
}

fn slot_image(image: &Option<Arc<DecodedImage>>) -> slint::Image {
    image.as_deref().map(to_slint_image).unwrap_or_default()
}

fn alt_text(record: &Option<ImageRecord>) -> SharedString {
    record
        .as_ref()
        .map(|r| SharedString::from(r.display_text.as_str()))
        .unwrap_or_default()
}

/// Runs on the UI thread.
fn apply_view(ui: &MainWindow, view: &GalleryView, images: &SlotImages) {
    let tabs: Vec<FilterTab> = view
        .tabs
        .iter()
        .map(|tab| FilterTab {
            key: tab.filter.key().into(),
            label: tab.label.into(),
            count: tab.count as i32,
            active: tab.active,
        })
        .collect();
    ui.set_filters(ModelRc::new(VecModel::from(tabs)));

    ui.set_current_image(slot_image(&images.current));
    ui.set_previous_image(slot_image(&images.previous));
    ui.set_next_image(slot_image(&images.next));
    ui.set_current_alt(alt_text(&view.current));
    ui.set_previous_alt(alt_text(&view.previous));
    ui.set_next_alt(alt_text(&view.next));

    ui.set_image_ready(view.image_ready && images.current.is_some());
    ui.set_is_empty(view.is_empty());
    ui.set_is_paused(view.is_paused());
    ui.set_counter(view.counter.clone().into());
}
