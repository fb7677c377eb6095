//! # cr-stage: Crimson Reels Stage System
//!
//! Defines the canonical moments of a Crimson Reels round. The engine never
//! talks to renderers or audio directly. It records STAGES, and anything
//! downstream (UI, audio, replay tooling) reacts to them.
//!
//! ## Philosophy
//!
//! Every round passes through the same semantic phases:
//! - Spin starts → Reels stop → Wins evaluated → Cascade or settle
//!
//! This crate defines those stages, the event wrapper that stamps them on a
//! timeline, the trace that collects a session, and the audio cue routing.

pub mod cue;
pub mod event;
pub mod stage;
pub mod trace;

pub use cue::*;
pub use event::*;
pub use stage::*;
pub use trace::*;
