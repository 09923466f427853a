use std::fmt;

/// Navigation direction for manual, swipe, keyboard and autoplay transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Previous,
    Next,
}

/// Observable playback mode derived from [`SlideshowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// No images; terminal until the sequence is replaced.
    Empty,
    /// Autoplay is active.
    Playing,
    /// Autoplay held off after manual navigation, pending auto-resume.
    Suspended,
    /// Durable stop requested by the user.
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Empty => "empty",
            PlaybackState::Playing => "playing",
            PlaybackState::Suspended => "suspended",
            PlaybackState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// State owned by a single slideshow engine.
///
/// This struct only holds values and pure transitions; timers, notifications
/// and locking live in [`crate::slideshow::SlideshowEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideshowState {
    pub len: usize,
    pub current_index: usize,
    pub autoplay_enabled: bool,
    pub paused_by_user: bool,
    /// Whether the displayed image finished loading (fade-in only).
    pub image_loaded: bool,
    /// Set when Next wraps from the last index, consumed once after the update.
    pub pending_end_signal: bool,
}

impl SlideshowState {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            current_index: 0,
            autoplay_enabled: true,
            paused_by_user: false,
            image_loaded: false,
            pending_end_signal: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn playback(&self) -> PlaybackState {
        if self.is_empty() {
            PlaybackState::Empty
        } else if self.paused_by_user {
            PlaybackState::Paused
        } else if self.autoplay_enabled {
            PlaybackState::Playing
        } else {
            PlaybackState::Suspended
        }
    }

    /// Whether the repeating autoplay timer should be armed.
    pub fn autoplay_should_run(&self) -> bool {
        self.autoplay_enabled && !self.paused_by_user && self.len > 1
    }

    pub fn previous_index(&self) -> Option<usize> {
        match self.len {
            0 => None,
            len => Some(if self.current_index == 0 {
                len - 1
            } else {
                self.current_index - 1
            }),
        }
    }

    pub fn next_index(&self) -> Option<usize> {
        match self.len {
            0 => None,
            len => Some((self.current_index + 1) % len),
        }
    }

    /// Move one position with wraparound.
    ///
    /// Returns the new index, or `None` for an empty sequence. A forward wrap
    /// from the last index raises `pending_end_signal`.
    pub fn step(&mut self, direction: Direction) -> Option<usize> {
        let target = match direction {
            Direction::Previous => self.previous_index()?,
            Direction::Next => {
                let next = self.next_index()?;
                if self.current_index == self.len - 1 {
                    self.pending_end_signal = true;
                }
                next
            }
        };
        self.set_index(target);
        Some(target)
    }

    /// Set an explicit index. Out-of-range values are rejected.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        if index != self.current_index {
            self.current_index = index;
            self.image_loaded = false;
        }
        true
    }

    /// Hold autoplay off after manual navigation. Returns whether an
    /// auto-resume must be scheduled.
    pub fn suppress_autoplay(&mut self) -> bool {
        if self.paused_by_user {
            return false;
        }
        self.autoplay_enabled = false;
        true
    }

    /// End of the suppression window.
    pub fn resume_autoplay(&mut self) {
        if !self.paused_by_user {
            self.autoplay_enabled = true;
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused_by_user = !self.paused_by_user;
        self.autoplay_enabled = !self.paused_by_user;
    }

    /// Consume the end-of-sequence flag.
    pub fn take_end_signal(&mut self) -> bool {
        std::mem::take(&mut self.pending_end_signal)
    }
}
