//! # Pyx Core
//!
//! A small online-trainable classifier that scores text (words, phrases,
//! game ideas) for appropriateness in a kid-facing application. Scores lie
//! in `[0, 1]`; anything at or above the ban line is inappropriate.
//!
//! ## Quick Start
//!
//! ```rust
//! use pyx_core::{Category, EngineConfig, PyxEngine};
//!
//! let mut engine = PyxEngine::new(EngineConfig::default()).unwrap();
//!
//! for _ in 0..20 {
//!     engine.train("great game", true, Category::Phrase);
//!     engine.train("bad stuff", false, Category::Phrase);
//! }
//!
//! let decision = engine.ai_decide("great game", Category::Phrase);
//! println!("accepted={} score={:.3}", decision.accepted, decision.score);
//! ```
//!
//! ## Core Modules
//!
//! - [`encoder`] - Text → hashed feature vector
//! - [`neural`] - Single-hidden-layer scoring network
//! - [`labels`] - Label Store with wildcard-prefix entries
//! - [`grounds`] - Curated Training Grounds replayed at startup
//! - [`policy`] - The engine API: score, train, ai_decide, override
//! - [`config`] - Engine configuration via TOML
//! - [`persistence`] - Saved engine state
//! - [`mirror`] - Best-effort mirroring of label changes
//! - [`logging`] - JSON line-delimited decision journal

pub mod checkpoint;
pub mod config;
pub mod encoder;
pub mod error;
pub mod grounds;
pub mod labels;
pub mod logging;
pub mod mirror;
pub mod neural;
pub mod persistence;
pub mod policy;

pub use checkpoint::{CheckpointError, Checkpointable};
pub use config::{ConfigError, EngineConfig};
pub use encoder::{FeatureEncoder, FeatureVector};
pub use error::{PyxError, PyxResult};
pub use grounds::{BootstrapReport, GroundsEntry, TrainingGrounds};
pub use labels::{Category, Label, LabelStore, LabeledItem};
pub use logging::{DecisionLog, DecisionLogEntry};
pub use mirror::{
    JsonlMirror, MemoryMirror, MirrorError, MirrorEvent, MirrorOperation, MirrorSink, NullMirror,
};
pub use neural::{NetworkParameters, ScoringNetwork};
pub use persistence::EngineSnapshot;
pub use policy::{AiDecision, PyxEngine, TrainOutcome, Verdict, VerdictSource};
