//! Experiment bookkeeping: artifact directory layout and the checkpoint
//! filename convention used by the framework trainer

use std::path::{Path, PathBuf};

use crate::config::ExpManagerConfig;

/// Width of the progress banners separating lifecycle stages
const BANNER_WIDTH: usize = 91;

/// Log a banner line separating lifecycle stages
pub fn banner() {
    log::info!("{}", "=".repeat(BANNER_WIDTH));
}

/// Bookkeeping for a single experiment run
pub struct Experiment {
    artifact_dir: String,
    checkpoints_enabled: bool,
}

impl Experiment {
    /// Resolve the experiment layout from the `exp_manager` config section,
    /// falling back to `experiments/<config_name>` with checkpointing enabled
    pub fn resolve(config_name: &str, exp_manager: Option<&ExpManagerConfig>) -> Self {
        let exp_dir = exp_manager
            .map(|manager| manager.exp_dir.clone())
            .unwrap_or_else(|| "experiments".to_string());

        let name = exp_manager
            .and_then(|manager| manager.name.clone())
            .unwrap_or_else(|| config_name.to_string());

        Self {
            artifact_dir: format!("{exp_dir}/{name}"),
            checkpoints_enabled: exp_manager
                .map(|manager| manager.create_checkpoint_callback)
                .unwrap_or(true),
        }
    }

    /// The directory the trainer writes configs, metrics and checkpoints into
    pub fn artifact_dir(&self) -> &str {
        &self.artifact_dir
    }

    /// The record stem of the final trained model saved under the artifact
    /// directory at the end of training
    pub fn model_record(&self) -> PathBuf {
        Path::new(&self.artifact_dir).join("model")
    }

    /// Locate the checkpoint written at the end of training.
    ///
    /// The framework's file checkpointer stores each epoch's model record as
    /// `<artifact_dir>/checkpoint/model-<epoch>.mpk`, so the last checkpoint
    /// is the one named after the final epoch. Returns the extension-less
    /// record stem recorders expect, or `None` when checkpointing is disabled
    /// or the file is not on disk.
    pub fn last_checkpoint(&self, num_epochs: usize) -> Option<PathBuf> {
        if !self.checkpoints_enabled {
            return None;
        }

        let stem = Path::new(&self.artifact_dir)
            .join("checkpoint")
            .join(format!("model-{num_epochs}"));

        stem.with_extension("mpk").exists().then_some(stem)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::config::ExpManagerConfig;

    use super::*;

    #[test]
    fn resolve_defaults_to_the_config_name() {
        let experiment = Experiment::resolve("sentiment_analysis", None);

        assert_eq!(experiment.artifact_dir(), "experiments/sentiment_analysis");
    }

    #[test]
    fn resolve_honors_the_exp_manager_section() {
        let manager = ExpManagerConfig::new()
            .with_exp_dir("runs".to_string())
            .with_name(Some("sa-bert".to_string()));

        let experiment = Experiment::resolve("sentiment_analysis", Some(&manager));

        assert_eq!(experiment.artifact_dir(), "runs/sa-bert");
    }

    #[test]
    fn model_record_lives_under_the_artifact_dir() {
        let experiment = Experiment::resolve("unit", None);

        assert_eq!(
            experiment.model_record(),
            Path::new("experiments/unit").join("model")
        );
    }

    #[test]
    fn last_checkpoint_requires_the_file_on_disk() {
        let experiment = Experiment::resolve("missing-checkpoint", None);

        assert_eq!(experiment.last_checkpoint(3), None);
    }

    #[test]
    fn last_checkpoint_returns_the_record_stem() {
        let exp_dir = std::env::temp_dir().join(format!("bert-classify-exp-{}", std::process::id()));
        let manager =
            ExpManagerConfig::new().with_exp_dir(exp_dir.to_str().unwrap().to_string());

        let experiment = Experiment::resolve("unit", Some(&manager));

        let checkpoint_dir = exp_dir.join("unit").join("checkpoint");
        std::fs::create_dir_all(&checkpoint_dir).unwrap();
        std::fs::write(checkpoint_dir.join("model-2.mpk"), b"").unwrap();

        assert_eq!(
            experiment.last_checkpoint(2),
            Some(checkpoint_dir.join("model-2"))
        );
        assert_eq!(experiment.last_checkpoint(3), None);
    }

    #[test]
    fn last_checkpoint_is_none_when_checkpointing_is_disabled() {
        let manager = ExpManagerConfig::new().with_create_checkpoint_callback(false);

        let experiment = Experiment::resolve("unit", Some(&manager));

        assert_eq!(experiment.last_checkpoint(3), None);
    }
}
