//! Integration tests for the slideshow engine timers and input
//!
//! These tests run on tokio's paused clock and verify that the engine:
//! - Advances on the autoplay interval and wraps with one end notification
//! - Suppresses autoplay after manual navigation and auto-resumes
//! - Treats the user pause as the only durable stop
//! - Routes keyboard and pointer input through an InputRouter binding
//! - Stops all timer activity once dropped

use folio::models::{Direction, ImageRecord, ImageSequence, PlaybackState, SlideshowSettings};
use folio::slideshow::{
    EngineServices, InputEvent, InputResponse, InputRouter, Key, SlideshowCallbacks,
    SlideshowEngine, SlideshowEvent,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::time::{Duration, sleep};

fn sequence(len: usize) -> ImageSequence {
    (0..len)
        .map(|i| ImageRecord {
            id: format!("img-{i}"),
            display_text: format!("Image {i}"),
            locator: format!("/images/{i}.jpg"),
        })
        .collect()
}

/// Records every callback the engine fires.
#[derive(Clone, Default)]
struct Recorder {
    positions: Arc<Mutex<Vec<usize>>>,
    reach_end: Arc<AtomicUsize>,
}

impl Recorder {
    fn callbacks(&self) -> SlideshowCallbacks {
        let positions = Arc::clone(&self.positions);
        let reach_end = Arc::clone(&self.reach_end);
        SlideshowCallbacks::new()
            .on_position_change(move |index| positions.lock().unwrap().push(index))
            .on_reach_end(move || {
                reach_end.fetch_add(1, Ordering::SeqCst);
            })
    }

    fn positions(&self) -> Vec<usize> {
        self.positions.lock().unwrap().clone()
    }

    fn reach_end(&self) -> usize {
        self.reach_end.load(Ordering::SeqCst)
    }
}

fn engine(len: usize, recorder: &Recorder) -> SlideshowEngine {
    SlideshowEngine::initialize(
        sequence(len),
        SlideshowSettings::default(),
        recorder.callbacks(),
        EngineServices::new(Handle::current()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_initialize_does_not_notify() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);

    assert_eq!(engine.current_index(), Some(0));
    assert_eq!(engine.playback(), PlaybackState::Playing);
    assert!(engine.autoplay_armed());
    assert!(recorder.positions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_advances_every_interval() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);

    sleep(Duration::from_millis(2_999)).await;
    assert_eq!(engine.current_index(), Some(0));

    sleep(Duration::from_millis(2)).await;
    assert_eq!(engine.current_index(), Some(1));

    sleep(Duration::from_millis(3_000)).await;
    assert_eq!(engine.current_index(), Some(2));
    assert_eq!(recorder.positions(), [1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_wrap_fires_reach_end_once() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);

    sleep(Duration::from_millis(9_001)).await;

    assert_eq!(engine.current_index(), Some(0));
    assert_eq!(recorder.positions(), [1, 2, 0]);
    assert_eq!(recorder.reach_end(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_navigation_suppresses_then_resumes() {
    let recorder = Recorder::default();
    let engine = engine(5, &recorder);

    engine.advance(Direction::Next);
    assert_eq!(engine.current_index(), Some(1));
    assert_eq!(engine.playback(), PlaybackState::Suspended);
    assert!(!engine.autoplay_armed());
    assert!(engine.resume_pending());

    sleep(Duration::from_millis(199)).await;
    assert_eq!(engine.playback(), PlaybackState::Suspended);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(engine.playback(), PlaybackState::Playing);
    assert!(engine.autoplay_armed());

    // The autoplay interval restarts from the resume, not from the original arming
    sleep(Duration::from_millis(2_998)).await;
    assert_eq!(engine.current_index(), Some(1));
    sleep(Duration::from_millis(2)).await;
    assert_eq!(engine.current_index(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_second_advance_retimes_resume() {
    let recorder = Recorder::default();
    let engine = engine(5, &recorder);

    engine.advance(Direction::Next);
    sleep(Duration::from_millis(150)).await;
    engine.advance(Direction::Next);

    // The first resume (t=200) was replaced
    sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.playback(), PlaybackState::Suspended);

    sleep(Duration::from_millis(101)).await;
    assert_eq!(engine.playback(), PlaybackState::Playing);
    assert_eq!(recorder.positions(), [1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_pause_is_durable() {
    let recorder = Recorder::default();
    let engine = engine(4, &recorder);

    engine.advance(Direction::Next);
    engine.toggle_pause();
    assert_eq!(engine.playback(), PlaybackState::Paused);
    assert!(!engine.resume_pending());

    // Manual navigation while paused never schedules a resume
    engine.advance(Direction::Next);
    assert!(!engine.resume_pending());

    sleep(Duration::from_secs(20)).await;
    assert_eq!(engine.playback(), PlaybackState::Paused);
    assert_eq!(engine.current_index(), Some(2));

    engine.toggle_pause();
    assert_eq!(engine.playback(), PlaybackState::Playing);
    sleep(Duration::from_millis(3_001)).await;
    assert_eq!(engine.current_index(), Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_manual_wrap_and_previous_wrap() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);
    engine.toggle_pause();

    engine.advance(Direction::Previous);
    assert_eq!(engine.current_index(), Some(2));
    assert_eq!(recorder.reach_end(), 0);

    engine.advance(Direction::Next);
    assert_eq!(engine.current_index(), Some(0));
    assert_eq!(recorder.reach_end(), 1);
    assert_eq!(recorder.positions(), [2, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_single_image_reaches_end_without_moving() {
    let recorder = Recorder::default();
    let engine = engine(1, &recorder);

    engine.advance(Direction::Next);
    assert_eq!(engine.current_index(), Some(0));
    assert_eq!(recorder.reach_end(), 1);
    assert!(recorder.positions().is_empty());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(recorder.reach_end(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_events_follow_state() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);
    let mut rx = engine.subscribe();

    engine.jump_to(2);
    sleep(Duration::from_millis(201)).await;

    assert_eq!(
        rx.recv().await.unwrap(),
        SlideshowEvent::PositionChanged { index: 2, total: 3 }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        SlideshowEvent::PlaybackChanged {
            playback: PlaybackState::Suspended
        }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        SlideshowEvent::PlaybackChanged {
            playback: PlaybackState::Playing
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropped_engine_stops_timers() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);
    engine.advance(Direction::Next);
    drop(engine);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.positions(), [1]);
    assert_eq!(recorder.reach_end(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_keyboard_through_router() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);
    let router = InputRouter::new();
    let binding = engine.bind_input(&router);

    assert_eq!(
        router.dispatch(InputEvent::Key(Key::ArrowRight)),
        InputResponse::Handled
    );
    assert_eq!(
        router.dispatch(InputEvent::Key(Key::from_name("left"))),
        InputResponse::Handled
    );
    assert_eq!(
        router.dispatch(InputEvent::Key(Key::Other)),
        InputResponse::Ignored
    );
    assert_eq!(recorder.positions(), [1, 0]);

    drop(binding);
    assert_eq!(
        router.dispatch(InputEvent::Key(Key::ArrowRight)),
        InputResponse::Ignored
    );
    assert_eq!(engine.current_index(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_swipe_and_tap_through_router() {
    let recorder = Recorder::default();
    let engine = engine(4, &recorder);
    let router = InputRouter::new();
    let _binding = engine.bind_input(&router);

    // Swipe left: next image, drag captured from the host
    router.dispatch(InputEvent::PointerDown { x: 300.0, y: 200.0 });
    assert_eq!(
        router.dispatch(InputEvent::PointerMove { x: 280.0, y: 202.0 }),
        InputResponse::CaptureGesture
    );
    router.dispatch(InputEvent::PointerUp { x: 250.0, y: 205.0 });
    assert_eq!(engine.current_index(), Some(1));

    // Swipe right: previous image
    router.dispatch(InputEvent::PointerDown { x: 100.0, y: 200.0 });
    router.dispatch(InputEvent::PointerUp { x: 150.0, y: 195.0 });
    assert_eq!(engine.current_index(), Some(0));

    // Vertical drag: ignored
    router.dispatch(InputEvent::PointerDown { x: 100.0, y: 100.0 });
    assert_eq!(
        router.dispatch(InputEvent::PointerMove { x: 102.0, y: 160.0 }),
        InputResponse::Ignored
    );
    assert_eq!(
        router.dispatch(InputEvent::PointerUp { x: 120.0, y: 125.0 }),
        InputResponse::Ignored
    );
    assert_eq!(engine.current_index(), Some(0));

    // Tap: pause
    router.dispatch(InputEvent::PointerDown { x: 50.0, y: 50.0 });
    router.dispatch(InputEvent::PointerUp { x: 53.0, y: 52.0 });
    assert_eq!(engine.playback(), PlaybackState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_image_loaded_ignores_stale_completion() {
    let recorder = Recorder::default();
    let engine = engine(3, &recorder);
    let mut rx = engine.subscribe();

    engine.advance(Direction::Next);
    engine.image_loaded("img-0");
    assert!(!engine.image_ready());

    engine.image_loaded("img-1");
    assert!(engine.image_ready());

    let mut saw_ready = false;
    while let Ok(event) = rx.try_recv() {
        saw_ready |= event == SlideshowEvent::ImageReady { index: 1 };
    }
    assert!(saw_ready);
}
