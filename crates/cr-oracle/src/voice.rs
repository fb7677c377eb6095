//! Spoken oracle lines
//!
//! A [`VoiceSource`] turns a resolved line into an audio clip. Voicing is
//! best effort: the machine never waits on it and a failure only costs the
//! clip.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use crate::error::OracleError;

/// External speech generator. `Ok(None)` means the backend had nothing to say.
pub trait VoiceSource: Send + Sync {
    fn speak<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, OracleError>>;
}

/// Voice that replays queued clips in order, then reports unavailable
#[derive(Debug, Default)]
pub struct ScriptedVoice {
    clips: Mutex<VecDeque<Result<Option<Vec<u8>>, OracleError>>>,
    latency: Duration,
    spoken: Mutex<Vec<String>>,
}

impl ScriptedVoice {
    pub fn new<I>(clips: I) -> Self
    where
        I: IntoIterator<Item = Result<Option<Vec<u8>>, OracleError>>,
    {
        Self {
            clips: Mutex::new(clips.into_iter().collect()),
            latency: Duration::ZERO,
            spoken: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Lines it was asked to speak
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl VoiceSource for ScriptedVoice {
    fn speak<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, OracleError>> {
        self.spoken.lock().push(text.to_string());
        let clip = self
            .clips
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".into())));
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            clip
        })
    }
}
