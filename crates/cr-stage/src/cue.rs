//! Audio cue routing
//!
//! Stages map to short sound cues (`Stage::cues`). A [`CueDispatcher`] owns the
//! mute flag and forwards cues to whatever [`CueSink`] the host installed.
//! Playback itself lives outside this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Named sound cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioCue {
    SpinStart,
    SpinStop,
    Click,
    BetAdjust,
    Win,
    Loss,
    BonusStart,
    CardReveal,
    Swarm,
    HunterSting,
}

impl AudioCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpinStart => "spin-start",
            Self::SpinStop => "spin-stop",
            Self::Click => "click",
            Self::BetAdjust => "bet-adjust",
            Self::Win => "win",
            Self::Loss => "loss",
            Self::BonusStart => "bonus-start",
            Self::CardReveal => "card-reveal",
            Self::Swarm => "swarm",
            Self::HunterSting => "hunter-sting",
        }
    }
}

/// Receiver of audio cues
pub trait CueSink: Send + Sync {
    fn play(&self, cue: AudioCue);

    /// Spoken oracle line as an encoded clip. Ignored unless overridden.
    fn play_voice(&self, _clip: &[u8]) {}
}

/// Sink that drops everything
#[derive(Debug, Default)]
pub struct NullCueSink;

impl CueSink for NullCueSink {
    fn play(&self, _cue: AudioCue) {}
}

/// Sink that remembers every cue it was asked to play
#[derive(Debug, Default)]
pub struct RecordingCueSink {
    played: Mutex<Vec<AudioCue>>,
    voiced: Mutex<Vec<Vec<u8>>>,
}

impl RecordingCueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<AudioCue> {
        self.played.lock().clone()
    }

    /// Voice clips received, in order
    pub fn voiced(&self) -> Vec<Vec<u8>> {
        self.voiced.lock().clone()
    }

    pub fn clear(&self) {
        self.played.lock().clear();
        self.voiced.lock().clear();
    }
}

impl CueSink for RecordingCueSink {
    fn play(&self, cue: AudioCue) {
        self.played.lock().push(cue);
    }

    fn play_voice(&self, clip: &[u8]) {
        self.voiced.lock().push(clip.to_vec());
    }
}

/// Routes stage cues to a sink, honoring the mute flag
pub struct CueDispatcher {
    sink: Arc<dyn CueSink>,
    muted: AtomicBool,
}

impl CueDispatcher {
    pub fn new(sink: Arc<dyn CueSink>) -> Self {
        Self {
            sink,
            muted: AtomicBool::new(false),
        }
    }

    /// Dispatcher that plays nothing
    pub fn silent() -> Self {
        Self::new(Arc::new(NullCueSink))
    }

    /// Play every cue mapped to `stage`. Returns how many were forwarded.
    pub fn dispatch(&self, stage: &Stage) -> usize {
        if self.is_muted() {
            return 0;
        }
        let cues = stage.cues();
        for cue in &cues {
            log::trace!("[Cue] {}", cue.as_str());
            self.sink.play(*cue);
        }
        cues.len()
    }

    /// Play a single cue directly
    pub fn play(&self, cue: AudioCue) {
        if !self.is_muted() {
            self.sink.play(cue);
        }
    }

    /// Shared handle to the installed sink
    pub fn sink(&self) -> Arc<dyn CueSink> {
        Arc::clone(&self.sink)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Flip the mute flag, returning the new value
    pub fn toggle_mute(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::Relaxed)
    }
}

impl Default for CueDispatcher {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for CueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueDispatcher")
            .field("muted", &self.is_muted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names() {
        assert_eq!(AudioCue::SpinStart.as_str(), "spin-start");
        assert_eq!(AudioCue::HunterSting.as_str(), "hunter-sting");
        let json = serde_json::to_string(&AudioCue::BetAdjust).unwrap();
        assert_eq!(json, "\"bet-adjust\"");
    }

    #[test]
    fn test_dispatch_and_mute() {
        let sink = Arc::new(RecordingCueSink::new());
        let dispatcher = CueDispatcher::new(sink.clone());

        assert_eq!(dispatcher.dispatch(&Stage::SpinStart { bet: 10 }), 1);
        assert_eq!(sink.played(), vec![AudioCue::SpinStart]);

        assert!(dispatcher.toggle_mute());
        assert_eq!(dispatcher.dispatch(&Stage::Loss), 0);
        dispatcher.play(AudioCue::Click);
        assert_eq!(sink.played().len(), 1);

        assert!(!dispatcher.toggle_mute());
        dispatcher.play(AudioCue::Click);
        assert_eq!(sink.played(), vec![AudioCue::SpinStart, AudioCue::Click]);
    }

    #[test]
    fn test_voice_reaches_recording_sink() {
        let sink = Arc::new(RecordingCueSink::new());
        let dispatcher = CueDispatcher::new(sink.clone());
        dispatcher.sink().play_voice(&[7, 7]);
        NullCueSink.play_voice(&[1]);

        assert_eq!(sink.voiced(), vec![vec![7, 7]]);
        assert!(sink.played().is_empty());
        sink.clear();
        assert!(sink.voiced().is_empty());
    }
}
