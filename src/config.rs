//! Hierarchical experiment configuration, loaded from named YAML presets

use std::collections::BTreeMap;

use burn::LearningRate;

/// Errors raised while loading or validating an experiment configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Training cannot start without a training file
    #[error("'model.train_ds.file_path' needs to be set for training")]
    MissingTrainFile,

    /// The classifier head needs at least one class
    #[error("no class labels are defined in the model configuration")]
    NoLabels,

    /// The preset file could not be read
    #[error("unable to read config preset {path}: {source}")]
    Preset {
        /// The preset file path
        path: String,

        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The preset file could not be parsed
    #[error("unable to parse config preset {path}: {source}")]
    Parse {
        /// The preset file path
        path: String,

        /// The underlying YAML error
        source: serde_yaml::Error,
    },
}

/// Settings passed through to the framework trainer
#[derive(burn::config::Config)]
pub struct TrainerConfig {
    /// Number of devices to train on
    #[config(default = 1)]
    pub devices: usize,

    /// Number of epochs
    #[config(default = 3)]
    pub num_epochs: usize,
}

/// Experiment bookkeeping settings (artifact directory and checkpointing)
#[derive(burn::config::Config)]
pub struct ExpManagerConfig {
    /// Top-level directory for experiment artifacts
    #[config(default = "\"experiments\".to_string()")]
    pub exp_dir: String,

    /// Experiment name, defaulting to the config preset name
    pub name: Option<String>,

    /// Whether the trainer should write epoch checkpoints
    #[config(default = true)]
    pub create_checkpoint_callback: bool,
}

/// Settings for one dataset split
#[derive(burn::config::Config)]
pub struct DatasetSettings {
    /// Path to a two-column tab-separated data file
    pub file_path: Option<String>,

    /// Batch size
    #[config(default = 64)]
    pub batch_size: usize,

    /// Whether to shuffle the split between epochs
    #[config(default = false)]
    pub shuffle: bool,
}

/// Model and optimization settings
#[derive(burn::config::Config)]
pub struct ModelSettings {
    /// The pretrained model to fine-tune (e.g., "bert-base-uncased")
    pub pretrained_model_name: String,

    /// Class names, indexed by the class ids used in the data files
    pub labels: Vec<String>,

    /// Maximum sequence length for the tokenizer
    #[config(default = 128)]
    pub max_seq_length: usize,

    /// Dropout rate
    #[config(default = 0.1)]
    pub hidden_dropout_prob: f64,

    /// Initial learning rate
    #[config(default = 2e-5)]
    pub learning_rate: LearningRate,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Where to write the packaged model bundle after training, if anywhere
    pub export_path: Option<String>,

    /// The training split
    pub train_ds: DatasetSettings,

    /// The validation split
    pub validation_ds: DatasetSettings,

    /// The test split
    pub test_ds: DatasetSettings,
}

impl ModelSettings {
    /// A map from class ids to class names
    pub fn id2label(&self) -> BTreeMap<usize, String> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.trim().to_string()))
            .collect()
    }
}

/// The top-level experiment configuration
#[derive(burn::config::Config)]
pub struct ExperimentConfig {
    /// Trainer settings
    pub trainer: TrainerConfig,

    /// Experiment bookkeeping settings
    pub exp_manager: Option<ExpManagerConfig>,

    /// Model and dataset settings
    pub model: ModelSettings,
}

impl ExperimentConfig {
    /// Load a named configuration preset from `<config_path>/<config_name>.yaml`
    pub fn from_preset(config_path: &str, config_name: &str) -> Result<Self, ConfigError> {
        let path = format!("{config_path}/{config_name}.yaml");

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Preset {
            path: path.clone(),
            source,
        })?;

        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Check the preconditions for training, returning the training file path.
    /// Runs before any framework object is constructed.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        let train_file = self
            .model
            .train_ds
            .file_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .ok_or(ConfigError::MissingTrainFile)?;

        if self.model.labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }

        Ok(train_file)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PRESET: &str = "
trainer:
  num_epochs: 2

model:
  pretrained_model_name: bert-base-uncased
  labels: [negative, positive]

  train_ds:
    file_path: data/train.tsv
    batch_size: 32
    shuffle: true

  validation_ds:
    file_path: data/dev.tsv

  test_ds: {}
";

    fn parse(raw: &str) -> ExperimentConfig {
        serde_yaml::from_str(raw).expect("config should parse")
    }

    #[test]
    fn applies_defaults_to_omitted_fields() {
        let config = parse(PRESET);

        assert_eq!(config.trainer.devices, 1);
        assert_eq!(config.trainer.num_epochs, 2);
        assert_eq!(config.model.max_seq_length, 128);
        assert_eq!(config.model.validation_ds.batch_size, 64);
        assert!(!config.model.validation_ds.shuffle);
        assert!(config.model.test_ds.file_path.is_none());
        assert!(config.exp_manager.is_none());
    }

    #[test]
    fn validate_returns_the_training_file() {
        let config = parse(PRESET);

        assert_eq!(config.validate().unwrap(), "data/train.tsv");
    }

    #[test]
    fn validate_rejects_a_missing_training_file() {
        let mut config = parse(PRESET);
        config.model.train_ds.file_path = None;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTrainFile)
        ));
    }

    #[test]
    fn validate_rejects_an_empty_training_file_path() {
        let mut config = parse(PRESET);
        config.model.train_ds.file_path = Some(String::new());

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTrainFile)
        ));
    }

    #[test]
    fn validate_rejects_an_empty_label_set() {
        let mut config = parse(PRESET);
        config.model.labels.clear();

        assert!(matches!(config.validate(), Err(ConfigError::NoLabels)));
    }

    #[test]
    fn id2label_indexes_labels_in_order() {
        let config = parse(PRESET);
        let id2label = config.model.id2label();

        assert_eq!(id2label.get(&0), Some(&"negative".to_string()));
        assert_eq!(id2label.get(&1), Some(&"positive".to_string()));
    }

    #[test]
    fn from_preset_reads_a_yaml_file() {
        let dir = std::env::temp_dir().join(format!("bert-classify-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("unit.yaml"), PRESET).unwrap();

        let config = ExperimentConfig::from_preset(dir.to_str().unwrap(), "unit").unwrap();

        assert_eq!(config.model.labels, vec!["negative", "positive"]);
    }

    #[test]
    fn from_preset_reports_unknown_presets() {
        let result = ExperimentConfig::from_preset("configs", "no-such-preset");

        assert!(matches!(result, Err(ConfigError::Preset { .. })));
    }
}
