use std::cell::RefCell;
use std::rc::Rc;

/// Strategy seam for sound playback. The engine only ever asks for a cue to
/// be played; mixing, formats and devices live behind this trait. Selected
/// at construction time: a disabled or unavailable audio device degrades to
/// `NullSoundService` rather than failing the game.
pub trait SoundService {
    fn play(&self, cue: &str);
}

/// The no-op stand-in used when sound is disabled or the device failed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSoundService;

impl SoundService for NullSoundService {
    fn play(&self, _cue: &str) {}
}

/// Test double that records every cue in play order.
#[derive(Clone, Default)]
pub struct RecordingSoundService {
    cues: Rc<RefCell<Vec<String>>>,
}

impl RecordingSoundService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<String> {
        self.cues.borrow().clone()
    }
}

impl SoundService for RecordingSoundService {
    fn play(&self, cue: &str) {
        self.cues.borrow_mut().push(cue.to_string());
    }
}
