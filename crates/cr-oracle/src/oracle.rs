//! Oracle service
//!
//! Asks a [`NarrativeSource`] for a line of commentary, bounded by a timeout.
//! Any failure (source disabled, error, timeout, blank reply) falls back to a
//! line from the [`FortuneCache`]. Settlement never waits on anything but the
//! bounded call.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::fortune::{FortuneCache, FortuneCategory, SILENT_LINE};
use crate::voice::VoiceSource;

// ═══════════════════════════════════════════════════════════════════════════
// REQUESTS
// ═══════════════════════════════════════════════════════════════════════════

/// What the oracle is asked to comment on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeRequest {
    /// End of a spin (or cascade step)
    Fortune { win_amount: i64, symbols: Vec<String> },
    /// Invitation to the double-or-nothing gamble
    BargainOffer { stake: i64 },
    /// Result of the gamble
    BargainOutcome { won: bool, amount: i64 },
}

impl NarrativeRequest {
    pub fn category(&self) -> FortuneCategory {
        match self {
            Self::Fortune { win_amount, .. } if *win_amount > 0 => FortuneCategory::Win,
            Self::Fortune { .. } => FortuneCategory::Loss,
            Self::BargainOffer { .. } => FortuneCategory::BargainOffer,
            Self::BargainOutcome { won: true, .. } => FortuneCategory::BargainWin,
            Self::BargainOutcome { won: false, .. } => FortuneCategory::BargainLoss,
        }
    }

    /// Plain-text prompt for text generators
    pub fn prompt(&self) -> String {
        match self {
            Self::Fortune {
                win_amount,
                symbols,
            } => {
                let mood = if *win_amount > 0 {
                    "Bestow a dark blessing."
                } else {
                    "Mock the player's thirst."
                };
                format!(
                    "You are an ancient vampire oracle in a gothic slot machine. \
                     Symbols landed: {}. Payout: {} coins. {} \
                     At most 20 words, gothic register, no emojis.",
                    symbols.join(", "),
                    win_amount,
                    mood
                )
            }
            Self::BargainOffer { stake } => format!(
                "You are an ancient vampire oracle. The player just won {stake} coins. \
                 Tempt them into a double-or-nothing pick between two chalices. \
                 At most 15 words, gothic register."
            ),
            Self::BargainOutcome { won, amount } => {
                let (verb, tone) = if *won {
                    ("won", "Offer sinister praise.")
                } else {
                    ("lost", "Offer cruel mockery.")
                };
                format!(
                    "You are an ancient vampire oracle. The player {verb} a gamble of {amount} coins. \
                     {tone} At most 12 words, gothic register."
                )
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SOURCES
// ═══════════════════════════════════════════════════════════════════════════

/// External text generator
pub trait NarrativeSource: Send + Sync {
    fn generate<'a>(&'a self, request: &'a NarrativeRequest)
    -> BoxFuture<'a, Result<String, OracleError>>;
}

/// Source with no backend; every call is unavailable
#[derive(Debug, Default)]
pub struct OfflineSource;

impl NarrativeSource for OfflineSource {
    fn generate<'a>(
        &'a self,
        _request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<String, OracleError>> {
        Box::pin(async { Err(OracleError::Unavailable("offline".into())) })
    }
}

/// Source that replays queued replies in order, then reports unavailable.
/// Optional per-reply latency exercises the timeout path.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    latency: Duration,
    requests: Mutex<Vec<NarrativeRequest>>,
}

impl ScriptedSource {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, OracleError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<NarrativeRequest> {
        self.requests.lock().clone()
    }
}

impl NarrativeSource for ScriptedSource {
    fn generate<'a>(
        &'a self,
        request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<String, OracleError>> {
        self.requests.lock().push(request.clone());
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".into())));
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            reply
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════

/// Oracle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Consult the narrative source at all (off by default)
    pub enabled: bool,
    /// Upper bound on one source call
    pub timeout_ms: u64,
    /// Where learned lines are persisted; `None` keeps the cache in memory
    pub cache_path: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 4000,
            cache_path: None,
        }
    }
}

impl OracleConfig {
    /// Persist to the platform data directory, when one exists
    pub fn with_default_cache_path(mut self) -> Self {
        self.cache_path = FortuneCache::default_path().ok();
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ORACLE
// ═══════════════════════════════════════════════════════════════════════════

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOrigin {
    Generated,
    Cache,
}

/// A resolved oracle line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReply {
    pub category: FortuneCategory,
    pub text: String,
    pub origin: ReplyOrigin,
}

/// Narrative commentary with an offline fallback
pub struct Oracle {
    source: Arc<dyn NarrativeSource>,
    voice: Option<Arc<dyn VoiceSource>>,
    cache: Mutex<FortuneCache>,
    rng: Mutex<ChaCha8Rng>,
    enabled: AtomicBool,
    timeout: Duration,
    cache_path: Option<PathBuf>,
}

impl Oracle {
    pub fn new(config: &OracleConfig, source: Arc<dyn NarrativeSource>) -> Self {
        let cache = match &config.cache_path {
            Some(path) => FortuneCache::load_with_defaults(path),
            None => FortuneCache::with_defaults(),
        };
        Self {
            source,
            voice: None,
            cache: Mutex::new(cache),
            rng: Mutex::new(ChaCha8Rng::from_os_rng()),
            enabled: AtomicBool::new(config.enabled),
            timeout: Duration::from_millis(config.timeout_ms),
            cache_path: config.cache_path.clone(),
        }
    }

    /// Disabled oracle with the built-in lines and no persistence
    pub fn offline() -> Self {
        Self::new(&OracleConfig::default(), Arc::new(OfflineSource))
    }

    /// Reseed the fallback picker
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Speak resolved lines through `voice`
    pub fn with_voice(mut self, voice: Arc<dyn VoiceSource>) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn has_voice(&self) -> bool {
        self.voice.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Copy of the current cache
    pub fn cache(&self) -> FortuneCache {
        self.cache.lock().clone()
    }

    /// Resolve a line for `request`. Never fails.
    pub async fn consult(&self, request: &NarrativeRequest) -> OracleReply {
        let category = request.category();

        if self.is_enabled() {
            match self.generate(request).await {
                Ok(text) => {
                    self.learn(category, &text);
                    return OracleReply {
                        category,
                        text,
                        origin: ReplyOrigin::Generated,
                    };
                }
                Err(e) => {
                    log::warn!("[Oracle] {} unavailable, using cache: {}", category.as_str(), e);
                }
            }
        }

        OracleReply {
            category,
            text: self.fallback(category),
            origin: ReplyOrigin::Cache,
        }
    }

    /// Audio for `text`, bounded by the same timeout. `None` when disabled,
    /// voiceless, or on any failure.
    pub async fn speak(&self, text: &str) -> Option<Vec<u8>> {
        let voice = self.voice.as_ref()?;
        if !self.is_enabled() || text.trim().is_empty() {
            return None;
        }
        match tokio::time::timeout(self.timeout, voice.speak(text)).await {
            Ok(Ok(clip)) => clip.filter(|clip| !clip.is_empty()),
            Ok(Err(e)) => {
                log::warn!("[Oracle] voice unavailable: {}", e);
                None
            }
            Err(_) => {
                log::warn!("[Oracle] voice timed out after {:?}", self.timeout);
                None
            }
        }
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<String, OracleError> {
        let reply = tokio::time::timeout(self.timeout, self.source.generate(request))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout.as_millis() as u64))??;
        let text = reply.trim();
        if text.is_empty() {
            return Err(OracleError::Empty);
        }
        Ok(text.to_string())
    }

    fn fallback(&self, category: FortuneCategory) -> String {
        let cache = self.cache.lock();
        let mut rng = self.rng.lock();
        cache
            .pick(category, &mut *rng)
            .unwrap_or(SILENT_LINE)
            .to_string()
    }

    fn learn(&self, category: FortuneCategory, text: &str) {
        let snapshot = {
            let mut cache = self.cache.lock();
            if !cache.learn(category, text) {
                return;
            }
            cache.clone()
        };
        if let Some(path) = &self.cache_path {
            if let Err(e) = snapshot.save(path) {
                log::debug!("[Oracle] could not save fortune cache: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Oracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracle")
            .field("enabled", &self.is_enabled())
            .field("voice", &self.has_voice())
            .field("timeout", &self.timeout)
            .field("cache_path", &self.cache_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::ScriptedVoice;

    fn enabled(source: ScriptedSource) -> Oracle {
        let config = OracleConfig {
            enabled: true,
            timeout_ms: 50,
            cache_path: None,
        };
        Oracle::new(&config, Arc::new(source)).with_seed(1)
    }

    #[test]
    fn test_request_category() {
        let win = NarrativeRequest::Fortune {
            win_amount: 40,
            symbols: vec!["bat".into()],
        };
        let loss = NarrativeRequest::Fortune {
            win_amount: 0,
            symbols: vec![],
        };
        assert_eq!(win.category(), FortuneCategory::Win);
        assert_eq!(loss.category(), FortuneCategory::Loss);
        assert_eq!(
            NarrativeRequest::BargainOutcome { won: false, amount: 5 }.category(),
            FortuneCategory::BargainLoss
        );
        assert!(win.prompt().contains("bat"));
    }

    #[tokio::test]
    async fn test_disabled_uses_cache() {
        let source = Arc::new(ScriptedSource::new([Ok("never".to_string())]));
        let oracle = Oracle::new(&OracleConfig::default(), source.clone());

        let reply = oracle
            .consult(&NarrativeRequest::BargainOffer { stake: 10 })
            .await;
        assert_eq!(reply.origin, ReplyOrigin::Cache);
        assert!(FortuneCategory::BargainOffer
            .default_lines()
            .contains(&reply.text.as_str()));
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generated_line_is_learned() {
        let oracle = enabled(ScriptedSource::new([Ok("  The night is yours.  ".to_string())]));

        let reply = oracle
            .consult(&NarrativeRequest::Fortune {
                win_amount: 100,
                symbols: vec!["coffin".to_string(); 3],
            })
            .await;
        assert_eq!(reply.origin, ReplyOrigin::Generated);
        assert_eq!(reply.text, "The night is yours.");
        assert_eq!(oracle.cache().lines(FortuneCategory::Win)[0], "The night is yours.");
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let oracle = enabled(ScriptedSource::new([
            Err(OracleError::Unavailable("quota".into())),
            Ok("   ".to_string()),
        ]));
        let request = NarrativeRequest::Fortune {
            win_amount: 0,
            symbols: vec![],
        };

        for _ in 0..2 {
            let reply = oracle.consult(&request).await;
            assert_eq!(reply.origin, ReplyOrigin::Cache);
            assert_eq!(reply.category, FortuneCategory::Loss);
        }
        assert_eq!(oracle.cache(), FortuneCache::with_defaults());
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let source = ScriptedSource::new([Ok("too slow".to_string())])
            .with_latency(Duration::from_millis(500));
        let oracle = enabled(source);

        let reply = oracle
            .consult(&NarrativeRequest::BargainOutcome { won: true, amount: 20 })
            .await;
        assert_eq!(reply.origin, ReplyOrigin::Cache);
        assert_eq!(reply.category, FortuneCategory::BargainWin);
    }

    #[tokio::test]
    async fn test_speak_needs_voice_and_enabled() {
        let voice = Arc::new(ScriptedVoice::new([Ok(Some(vec![1, 2, 3]))]));
        let oracle = Oracle::offline().with_voice(voice.clone());
        assert_eq!(oracle.speak("Rise.").await, None);
        assert!(voice.spoken().is_empty());

        oracle.set_enabled(true);
        assert_eq!(oracle.speak("Rise.").await, Some(vec![1, 2, 3]));
        assert_eq!(voice.spoken(), vec!["Rise.".to_string()]);

        assert_eq!(enabled(ScriptedSource::default()).speak("Rise.").await, None);
    }

    #[tokio::test]
    async fn test_speak_failures_are_dropped() {
        let voice = ScriptedVoice::new([
            Err(OracleError::Unavailable("quota".into())),
            Ok(Some(Vec::new())),
            Ok(Some(vec![9])),
        ])
        .with_latency(Duration::from_millis(5));
        let oracle = enabled(ScriptedSource::default()).with_voice(Arc::new(voice));

        assert_eq!(oracle.speak("one").await, None);
        assert_eq!(oracle.speak("two").await, None);
        assert_eq!(oracle.speak("   ").await, None);
        assert_eq!(oracle.speak("three").await, Some(vec![9]));
    }

    #[tokio::test]
    async fn test_speak_times_out() {
        let voice = ScriptedVoice::new([Ok(Some(vec![1]))]).with_latency(Duration::from_millis(500));
        let oracle = enabled(ScriptedSource::default()).with_voice(Arc::new(voice));
        assert_eq!(oracle.speak("slow").await, None);
    }

    #[tokio::test]
    async fn test_learned_line_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fortunes.json");
        let config = OracleConfig {
            enabled: true,
            timeout_ms: 50,
            cache_path: Some(path.clone()),
        };
        let oracle = Oracle::new(
            &config,
            Arc::new(ScriptedSource::new([Ok("Remember me.".to_string())])),
        );
        oracle
            .consult(&NarrativeRequest::BargainOffer { stake: 50 })
            .await;

        let reloaded = FortuneCache::load_with_defaults(&path);
        assert!(reloaded
            .lines(FortuneCategory::BargainOffer)
            .contains(&"Remember me.".to_string()));
    }
}
