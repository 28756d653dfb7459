//! Decision Policy: the engine's public API.
//!
//! [`PyxEngine`] owns the configuration, the scoring network, the label store
//! and the mirror sink. Text is encoded, scored, and compared with the ban
//! line; explicit feedback replays the same encoding through the network's
//! learning step and updates the store.

use std::path::PathBuf;

use crate::checkpoint::Checkpointable;
use crate::config::EngineConfig;
use crate::encoder::{FeatureEncoder, FeatureVector};
use crate::error::PyxResult;
use crate::grounds::{BootstrapReport, TrainingGrounds};
use crate::labels::{Category, Label, LabelStore, LabeledItem};
use crate::logging::DecisionLog;
use crate::mirror::{MirrorEvent, MirrorOperation, MirrorSink, NullMirror};
use crate::neural::{binary_cross_entropy, ScoringNetwork};
use crate::persistence::{state_path, EngineSnapshot};

/// Minimum similarity for [`PyxEngine::respond`] to return a match.
pub const RESPONSE_SIMILARITY_FLOOR: f32 = 0.3;

/// Result of an explicit training call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOutcome {
    /// Squared error of the last step, measured before that step's update
    pub loss: f32,
    /// Score after training
    pub score: f32,
    /// Cross-entropy of `score` against the label's target
    pub cross_entropy: f32,
}

/// Result of [`PyxEngine::ai_decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiDecision {
    pub accepted: bool,
    pub score: f32,
}

/// What settled a [`Verdict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictSource {
    Network,
    ExactLabel,
    WildcardLabel { prefix: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub score: f32,
    pub inappropriate: bool,
    pub source: VerdictSource,
}

pub struct PyxEngine {
    config: EngineConfig,
    encoder: FeatureEncoder,
    network: ScoringNetwork,
    labels: LabelStore,
    mirror: Box<dyn MirrorSink>,
    mirror_failures: usize,
    decision_log: Option<DecisionLog>,
}

impl PyxEngine {
    /// Creates a fresh engine: seeded random weights, empty store, no mirror.
    pub fn new(config: EngineConfig) -> PyxResult<Self> {
        config.validate()?;
        let network = ScoringNetwork::new(
            config.input_size,
            config.hidden_size,
            config.learning_rate,
            config.seed,
        );
        Ok(Self::assemble(config, network, LabelStore::new()))
    }

    /// Restores the engine saved under `config.data_dir`, or creates a fresh
    /// one if nothing has been saved yet.
    ///
    /// A saved state whose dimensions differ from `config` is a fatal error.
    pub fn open(config: EngineConfig) -> PyxResult<Self> {
        config.validate()?;
        let path = state_path(&config.data_dir);
        match EngineSnapshot::load_checkpoint_if_exists(&path)? {
            Some(snapshot) => {
                let (network, labels) = snapshot.restore(&config)?;
                tracing::info!(
                    "Loaded engine state from {} ({} labeled items)",
                    path.display(),
                    labels.len()
                );
                Ok(Self::assemble(config, network, labels))
            }
            None => {
                tracing::info!("No saved state at {}; starting fresh", path.display());
                Self::new(config)
            }
        }
    }

    /// Opens the engine, attaches `mirror`, and replays the built-in Training
    /// Grounds. This is the per-process startup sequence.
    pub fn start(config: EngineConfig, mirror: Box<dyn MirrorSink>) -> PyxResult<Self> {
        let mut engine = Self::open(config)?.with_boxed_mirror(mirror);
        engine.bootstrap(&TrainingGrounds::builtin());
        Ok(engine)
    }

    fn assemble(config: EngineConfig, network: ScoringNetwork, labels: LabelStore) -> Self {
        let decision_log = config
            .decision_log
            .then(|| DecisionLog::in_data_dir(&config.data_dir));
        Self {
            encoder: FeatureEncoder::new(config.input_size),
            config,
            network,
            labels,
            mirror: Box::new(NullMirror),
            mirror_failures: 0,
            decision_log,
        }
    }

    pub fn with_mirror<M: MirrorSink + 'static>(self, mirror: M) -> Self {
        self.with_boxed_mirror(Box::new(mirror))
    }

    pub fn with_boxed_mirror(mut self, mirror: Box<dyn MirrorSink>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn network(&self) -> &ScoringNetwork {
        &self.network
    }

    /// Number of mirror writes that failed since construction.
    pub fn mirror_failures(&self) -> usize {
        self.mirror_failures
    }

    pub fn state_path(&self) -> PathBuf {
        state_path(&self.config.data_dir)
    }

    pub fn encode(&self, text: &str) -> FeatureVector {
        self.encoder.encode(text)
    }

    /// Network score for `text`, in `[0, 1]`.
    pub fn score(&self, text: &str) -> f32 {
        self.network.forward(&self.encoder.encode(text))
    }

    /// True if the score is at or above the ban line.
    pub fn is_inappropriate(&self, text: &str) -> bool {
        self.is_banned(self.score(text))
    }

    pub fn is_banned(&self, score: f32) -> bool {
        score >= self.config.ban_line
    }

    /// Registers `text` without a judgment. An existing entry is left as is.
    pub fn add(&mut self, text: &str, category: Category) -> LabeledItem {
        let item = match self.labels.get(text, category) {
            Some(existing) => existing.clone(),
            None => self
                .labels
                .upsert(text, category, Label::Unset, false)
                .clone(),
        };
        self.mirror_event(MirrorOperation::Add, &item.text, category, item.label);
        item
    }

    /// Explicit feedback: label `text` and train the network toward it.
    pub fn train(&mut self, text: &str, safe: bool, category: Category) -> TrainOutcome {
        self.apply_feedback(MirrorOperation::Train, text, safe, category)
    }

    /// Override: same update as [`PyxEngine::train`], superseding any earlier
    /// manual or automatic label.
    pub fn set_label(&mut self, text: &str, safe: bool, category: Category) -> TrainOutcome {
        let previous = self.labels.get(text, category).map(|item| item.label);
        let outcome = self.apply_feedback(MirrorOperation::SetLabel, text, safe, category);
        if let Some(previous) = previous {
            if previous != Label::from_safe(safe) {
                tracing::info!(
                    "Override of '{}' ({}): {} -> {}",
                    text,
                    category,
                    previous,
                    Label::from_safe(safe)
                );
            }
        }
        outcome
    }

    fn apply_feedback(
        &mut self,
        operation: MirrorOperation,
        text: &str,
        safe: bool,
        category: Category,
    ) -> TrainOutcome {
        let label = Label::from_safe(safe);
        let target = if safe { 0.0 } else { 1.0 };
        let stored = self.labels.upsert(text, category, label, false).text.clone();

        let input = self.encoder.encode(text);
        let mut loss = 0.0;
        for _ in 0..self.config.train_epochs {
            loss = self.network.train_step(&input, target);
        }
        let score = self.network.forward(&input);
        tracing::debug!(
            "Trained '{}' as {} for {} steps: loss={:.4}, score={:.4}",
            text,
            label,
            self.config.train_epochs,
            loss,
            score
        );

        self.mirror_event(operation, &stored, category, label);
        let op_name = match operation {
            MirrorOperation::SetLabel => "set_label",
            _ => "train",
        };
        self.journal(op_name, text, Some(category), score);

        TrainOutcome {
            loss,
            score,
            cross_entropy: binary_cross_entropy(score, target),
        }
    }

    /// Lets the network decide. Below the ban line the item is admitted as
    /// safe without a training step; otherwise the store is not touched.
    pub fn ai_decide(&mut self, text: &str, category: Category) -> AiDecision {
        let score = self.score(text);
        let accepted = !self.is_banned(score);
        if accepted {
            let stored = self.labels.upsert(text, category, Label::Safe, false).text.clone();
            self.mirror_event(MirrorOperation::AiDecide, &stored, category, Label::Safe);
        }
        self.journal("ai_decide", text, Some(category), score);
        AiDecision { accepted, score }
    }

    /// Decision that consults known labels before the network.
    ///
    /// A Safe or Bad label found by [`LabelStore::lookup`] settles the
    /// verdict; unset or unknown text falls back to the ban line.
    pub fn judge(&self, text: &str, category: Option<Category>) -> Verdict {
        let score = self.score(text);
        let verdict = match self.labels.lookup(text, category) {
            Some(item) if item.label != Label::Unset => Verdict {
                score,
                inappropriate: item.label == Label::Bad,
                source: if item.is_prefix_wildcard {
                    VerdictSource::WildcardLabel {
                        prefix: item.text.clone(),
                    }
                } else {
                    VerdictSource::ExactLabel
                },
            },
            _ => Verdict {
                score,
                inappropriate: self.is_banned(score),
                source: VerdictSource::Network,
            },
        };
        self.journal("judge", text, category, score);
        verdict
    }

    /// Closest allowed item of `category` to `prompt`.
    ///
    /// Similarity is `1 - euclidean distance` between encodings. Items the
    /// network currently scores at or above the ban line are skipped, and
    /// nothing is returned unless the best similarity exceeds
    /// [`RESPONSE_SIMILARITY_FLOOR`].
    pub fn respond(&self, prompt: &str, category: Category) -> Option<&LabeledItem> {
        let query = self.encoder.encode(prompt);
        let mut best: Option<(&LabeledItem, f32)> = None;

        for item in self.labels.allowed(category) {
            let candidate = self.encoder.encode(&item.text);
            if self.is_banned(self.network.forward(&candidate)) {
                continue;
            }
            let diff = &query - &candidate;
            let similarity = 1.0 - diff.dot(&diff).sqrt();
            if best.map_or(true, |(_, s)| similarity > s) {
                best = Some((item, similarity));
            }
        }

        best.filter(|(_, s)| *s > RESPONSE_SIMILARITY_FLOOR)
            .map(|(item, _)| item)
    }

    /// The stored entry for `pattern`. A trailing wildcard marker
    /// (`"kill..."`) addresses the rule rather than the plain entry.
    pub fn get(&self, pattern: &str, category: Category) -> Option<&LabeledItem> {
        let probe = LabeledItem::from_pattern(pattern, category, Label::Unset);
        self.labels
            .get_entry(&probe.text, category, probe.is_prefix_wildcard)
    }

    pub fn lookup(&self, text: &str, category: Option<Category>) -> Option<&LabeledItem> {
        self.labels.lookup(text, category)
    }

    pub fn list(&self, category: Option<Category>) -> Vec<&LabeledItem> {
        self.labels.list(category)
    }

    pub fn allowed(&self, category: Category) -> Vec<&LabeledItem> {
        self.labels.allowed(category)
    }

    /// Removes the entry for `pattern`, addressed as in [`PyxEngine::get`].
    /// The network is not retrained.
    pub fn remove(&mut self, pattern: &str, category: Category) -> Option<LabeledItem> {
        let probe = LabeledItem::from_pattern(pattern, category, Label::Unset);
        let removed =
            self.labels
                .remove_entry(&probe.text, category, probe.is_prefix_wildcard)?;
        self.mirror_event(
            MirrorOperation::Remove,
            &removed.display_text(),
            category,
            removed.label,
        );
        Some(removed)
    }

    /// Replays `grounds` in order: upsert, then one training step per entry.
    pub fn bootstrap(&mut self, grounds: &TrainingGrounds) -> BootstrapReport {
        let mut total_loss = 0.0;
        for entry in grounds.entries() {
            let item = entry.to_item();
            self.labels.upsert(
                &item.text,
                item.category,
                item.label,
                item.is_prefix_wildcard,
            );
            if let Some(target) = item.label.target() {
                let input = self.encoder.encode(&item.text);
                total_loss += self.network.train_step(&input, target);
            }
            self.mirror_event(
                MirrorOperation::Bootstrap,
                &item.display_text(),
                item.category,
                item.label,
            );
        }

        let report = BootstrapReport {
            entries: grounds.len(),
            mean_loss: if grounds.is_empty() {
                0.0
            } else {
                total_loss / grounds.len() as f32
            },
        };
        tracing::info!(
            "Training Grounds replayed: {} entries, mean loss {:.4}",
            report.entries,
            report.mean_loss
        );
        report
    }

    /// Writes parameters and labels to `<data_dir>/pyx_state.bin`.
    pub fn save(&self) -> PyxResult<()> {
        let path = self.state_path();
        EngineSnapshot::capture(&self.network, &self.labels).save_checkpoint(&path)?;
        tracing::info!("Saved engine state to {}", path.display());
        Ok(())
    }

    /// Replaces the network with freshly seeded weights. Labels are kept.
    pub fn reset_network(&mut self) {
        self.network = ScoringNetwork::new(
            self.config.input_size,
            self.config.hidden_size,
            self.config.learning_rate,
            self.config.seed,
        );
        tracing::info!("Network reset to seed {}", self.config.seed);
    }

    fn mirror_event(
        &mut self,
        operation: MirrorOperation,
        text: &str,
        category: Category,
        label: Label,
    ) {
        let event = MirrorEvent::new(operation, text, category, label);
        if let Err(err) = self.mirror.record(&event) {
            self.mirror_failures += 1;
            tracing::warn!("Mirror write for '{}' failed: {}", text, err);
        }
    }

    fn journal(&self, operation: &str, text: &str, category: Option<Category>, score: f32) {
        if let Some(log) = &self.decision_log {
            if let Err(err) = log.record(operation, text, category, score, self.is_banned(score)) {
                tracing::warn!("Decision journal write to {} failed: {}", log.path().display(), err);
            }
        }
    }
}
