// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the whole model as one snapshot at a FIXED path and
// restores it at start-up (load-or-create).
//
// A snapshot is two files side by side:
//   model.json   — TranslationTransformerConfig (architecture)
//   model.mpk    — every parameter, via Burn's CompactRecorder
//
// The architecture is stored with the weights because a record
// only makes sense for the exact shapes it was written from: a
// snapshot whose model.json differs from the requested config is
// treated as unusable rather than loaded into the wrong shapes.
//
// Retention:
//   Latest      — model.* is overwritten every epoch (default)
//   EveryEpoch  — additionally keeps model_epoch_<n>.*
//
// checkpoints/
//   model.json  model.mpk
//   model_epoch_3.json  model_epoch_3.mpk   (EveryEpoch only)
//   latest_epoch.json
//   train_config.json
//   vocab_de.json  vocab_en.json
//   metrics.csv

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, FileRecorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{TranslationTransformer, TranslationTransformerConfig};

const SNAPSHOT: &str = "model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionPolicy {
    /// Only the most recent epoch survives
    Latest,
    /// Every epoch also gets its own numbered snapshot
    EveryEpoch,
}

/// Result of trying to restore a snapshot.
pub enum LoadOutcome<M> {
    Found(M),
    NotFound,
    /// Present but unusable: unreadable, undecodable, or built
    /// for a different architecture
    Corrupt(String),
}

pub struct CheckpointManager {
    dir:       PathBuf,
    retention: RetentionPolicy,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>, retention: RetentionPolicy) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir, retention }
    }

    fn weights_path<B: Backend>(&self, stem: &str) -> PathBuf {
        let ext = <CompactRecorder as FileRecorder<B>>::file_extension();
        self.dir.join(format!("{stem}.{ext}"))
    }

    fn config_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.json"))
    }

    fn write_snapshot<B: Backend>(
        &self,
        stem:   &str,
        model:  &TranslationTransformer<B>,
        config: &TranslationTransformerConfig,
    ) -> Result<()> {
        let config_path = self.config_path(stem);
        config
            .save(&config_path)
            .with_context(|| format!("Failed to write '{}'", config_path.display()))?;

        // the recorder appends its own extension
        let path = self.dir.join(stem);
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        Ok(())
    }

    /// Overwrite the fixed snapshot (plus a numbered copy under
    /// `RetentionPolicy::EveryEpoch`).
    pub fn save_model<B: Backend>(
        &self,
        model:  &TranslationTransformer<B>,
        config: &TranslationTransformerConfig,
        epoch:  usize,
    ) -> Result<()> {
        self.write_snapshot(SNAPSHOT, model, config)?;
        if self.retention == RetentionPolicy::EveryEpoch {
            self.write_snapshot(&format!("{SNAPSHOT}_epoch_{epoch}"), model, config)?;
        }

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Try to restore the fixed snapshot for `config`.
    pub fn load_model<B: Backend>(
        &self,
        config: &TranslationTransformerConfig,
        device: &B::Device,
    ) -> LoadOutcome<TranslationTransformer<B>> {
        let config_path  = self.config_path(SNAPSHOT);
        let weights_path = self.weights_path::<B>(SNAPSHOT);

        if !config_path.exists() || !weights_path.exists() {
            return LoadOutcome::NotFound;
        }

        let stored = match TranslationTransformerConfig::load(&config_path) {
            Ok(stored) => stored,
            Err(e) => return LoadOutcome::Corrupt(format!("unreadable model.json: {e}")),
        };
        if !same_architecture(&stored, config) {
            return LoadOutcome::Corrupt("stored architecture differs from requested".into());
        }

        match config
            .init::<B>(device)
            .load_file(self.dir.join(SNAPSHOT), &CompactRecorder::new(), device)
        {
            Ok(model) => LoadOutcome::Found(model),
            Err(e)    => LoadOutcome::Corrupt(format!("cannot decode weights: {e}")),
        }
    }

    /// Last epoch recorded next to the snapshot, if any.
    pub fn latest_epoch(&self) -> Option<usize> {
        let path = self.dir.join("latest_epoch.json");
        let json = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&json) {
            Ok(epoch) => Some(epoch),
            Err(e) => {
                tracing::warn!("Ignoring unreadable '{}': {}", path.display(), e);
                None
            }
        }
    }

    /// Restore the snapshot if possible, otherwise build a fresh model.
    /// Never fails: every load problem falls back to initialisation.
    ///
    /// Also returns the epoch number training should continue from:
    /// one past the recorded epoch when resuming, 1 for a fresh model.
    pub fn load_or_create<B: Backend>(
        &self,
        config: &TranslationTransformerConfig,
        device: &B::Device,
    ) -> (TranslationTransformer<B>, usize) {
        match self.load_model(config, device) {
            LoadOutcome::Found(model) => {
                let start = self.latest_epoch().map_or(1, |e| e + 1);
                tracing::info!(
                    "Resuming from checkpoint in '{}' at epoch {}",
                    self.dir.display(),
                    start
                );
                (model, start)
            }
            LoadOutcome::NotFound => {
                tracing::info!("No checkpoint found — initialising a fresh model");
                (config.init(device), 1)
            }
            LoadOutcome::Corrupt(reason) => {
                tracing::warn!("Ignoring checkpoint ({}) — initialising a fresh model", reason);
                (config.init(device), 1)
            }
        }
    }

    /// Save the training configuration so `evaluate` can rebuild
    /// the same vocabularies and architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn same_architecture(a: &TranslationTransformerConfig, b: &TranslationTransformerConfig) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
