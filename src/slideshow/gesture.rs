// Pointer/touch gesture recognition
//
// A strict decision tree: swipe first, then tap, everything else is ignored.

use crate::models::{Direction, SlideshowSettings};

/// Pixel thresholds used to classify a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    /// Minimum horizontal travel for a swipe.
    pub swipe: f32,
    /// Maximum travel on both axes for a tap.
    pub tap: f32,
    /// Horizontal travel after which a drag is captured from the host.
    pub jitter: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self::from(&SlideshowSettings::default())
    }
}

impl From<&SlideshowSettings> for GestureThresholds {
    fn from(settings: &SlideshowSettings) -> Self {
        Self {
            swipe: settings.swipe_threshold_px,
            tap: settings.tap_threshold_px,
            jitter: settings.drag_jitter_px,
        }
    }
}

/// Outcome of a completed pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Swipe(Direction),
    Tap,
    Ignored,
}

/// What the host should do with an in-progress pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveHint {
    /// Horizontal swipe in progress: suppress the default scroll.
    Capture,
    /// Let the host handle the move.
    Pass,
}

/// Classify a completed gesture from its total displacement.
///
/// Negative horizontal travel (finger moving left) means the next image.
pub fn classify(dx: f32, dy: f32, thresholds: &GestureThresholds) -> Gesture {
    let (abs_x, abs_y) = (dx.abs(), dy.abs());

    if abs_x > abs_y && abs_x > thresholds.swipe {
        if dx < 0.0 {
            Gesture::Swipe(Direction::Next)
        } else {
            Gesture::Swipe(Direction::Previous)
        }
    } else if abs_x < thresholds.tap && abs_y < thresholds.tap {
        Gesture::Tap
    } else {
        Gesture::Ignored
    }
}

/// Tracks one pointer from down to up.
#[derive(Debug, Clone, Default)]
pub struct GestureRecognizer {
    thresholds: GestureThresholds,
    origin: Option<(f32, f32)>,
    capturing: bool,
}

impl GestureRecognizer {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            origin: None,
            capturing: false,
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.origin = Some((x, y));
        self.capturing = false;
    }

    /// Once a drag is captured it stays captured until the pointer is released.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> MoveHint {
        let Some((ox, oy)) = self.origin else {
            return MoveHint::Pass;
        };
        let (abs_x, abs_y) = ((x - ox).abs(), (y - oy).abs());
        if self.capturing || (abs_x > abs_y && abs_x > self.thresholds.jitter) {
            self.capturing = true;
            MoveHint::Capture
        } else {
            MoveHint::Pass
        }
    }

    /// Finish the gesture. A release without a matching press is ignored.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> Gesture {
        self.capturing = false;
        match self.origin.take() {
            Some((ox, oy)) => classify(x - ox, y - oy, &self.thresholds),
            None => Gesture::Ignored,
        }
    }

    pub fn cancel(&mut self) {
        self.origin = None;
        self.capturing = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.origin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_gestures() {
        let t = GestureThresholds::default();
        assert_eq!(classify(-50.0, 5.0, &t), Gesture::Swipe(Direction::Next));
        assert_eq!(classify(50.0, 5.0, &t), Gesture::Swipe(Direction::Previous));
        assert_eq!(classify(3.0, 2.0, &t), Gesture::Tap);
        assert_eq!(classify(20.0, 25.0, &t), Gesture::Ignored);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let t = GestureThresholds::default();
        assert_eq!(classify(-40.0, 0.0, &t), Gesture::Ignored);
        assert_eq!(classify(-40.5, 0.0, &t), Gesture::Swipe(Direction::Next));
        assert_eq!(classify(10.0, 0.0, &t), Gesture::Ignored);
        assert_eq!(classify(9.9, 9.9, &t), Gesture::Tap);
    }

    #[test]
    fn test_vertical_drag_is_not_a_swipe() {
        let t = GestureThresholds::default();
        assert_eq!(classify(60.0, 80.0, &t), Gesture::Ignored);
    }

    #[test]
    fn test_recognizer_tracks_press_to_release() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.pointer_down(200.0, 100.0);
        assert!(recognizer.is_tracking());

        assert_eq!(recognizer.pointer_move(195.0, 101.0), MoveHint::Pass);
        assert_eq!(recognizer.pointer_move(170.0, 104.0), MoveHint::Capture);
        // Stays captured even if the finger drifts vertically
        assert_eq!(recognizer.pointer_move(168.0, 140.0), MoveHint::Capture);

        assert_eq!(
            recognizer.pointer_up(150.0, 105.0),
            Gesture::Swipe(Direction::Next)
        );
        assert!(!recognizer.is_tracking());
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut recognizer = GestureRecognizer::default();
        assert_eq!(recognizer.pointer_move(10.0, 10.0), MoveHint::Pass);
        assert_eq!(recognizer.pointer_up(10.0, 10.0), Gesture::Ignored);
    }

    #[test]
    fn test_cancel_discards_gesture() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.pointer_down(0.0, 0.0);
        recognizer.cancel();
        assert_eq!(recognizer.pointer_up(1.0, 1.0), Gesture::Ignored);
    }

    #[test]
    fn test_custom_thresholds() {
        let settings = SlideshowSettings {
            swipe_threshold_px: 100.0,
            ..SlideshowSettings::default()
        };
        let t = GestureThresholds::from(&settings);
        assert_eq!(classify(-60.0, 0.0, &t), Gesture::Ignored);
        assert_eq!(classify(-120.0, 0.0, &t), Gesture::Swipe(Direction::Next));
    }
}
