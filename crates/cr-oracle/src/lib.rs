//! # cr-oracle
//!
//! Narrative commentary for Crimson Reels. The [`Oracle`] consults an external
//! [`NarrativeSource`] when enabled and falls back to a persisted
//! [`FortuneCache`] otherwise. An optional [`VoiceSource`] speaks the
//! resolved lines. [`Preferences`] holds the settings that outlive a session.

pub mod error;
pub mod fortune;
pub mod oracle;
pub mod prefs;
pub mod voice;

pub use error::{OracleError, PersistError};
pub use fortune::{FortuneCache, FortuneCategory, MAX_LINES_PER_CATEGORY};
pub use oracle::{
    NarrativeRequest, NarrativeSource, OfflineSource, Oracle, OracleConfig, OracleReply,
    ReplyOrigin, ScriptedSource,
};
pub use prefs::Preferences;
pub use voice::{ScriptedVoice, VoiceSource};
