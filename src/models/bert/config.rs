//! Adapt the pretrained BERT configuration to the text classification pipeline

use std::{collections::BTreeMap, path::PathBuf};

use bert_burn::model::BertModelConfig;
use burn::{
    config::Config as _,
    nn::LinearConfig,
    tensor::backend::{AutodiffBackend, Backend},
};

use crate::pipeline;

use super::Model;

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct Config {
    // -- Fields copied from BertModelConfig because #[serde(flatten)] is not supported yet
    /// Number of attention heads in the multi-head attention
    pub num_attention_heads: usize,
    /// Number of transformer encoder layers/blocks
    pub num_hidden_layers: usize,
    /// Layer normalization epsilon
    pub layer_norm_eps: f64,
    /// Size of the hidden state (e.g., 768 for bert-base)
    pub hidden_size: usize,
    /// Size of the intermediate position wise feedforward layer
    pub intermediate_size: usize,
    /// Size of the vocabulary
    pub vocab_size: usize,
    /// Max position embeddings (512 for BERT)
    pub max_position_embeddings: usize,
    /// Identifier for sentence type in input (e.g., 0 for single sentence, 1 for pair)
    pub type_vocab_size: usize,
    /// Dropout value across layers, typically 0.1
    pub hidden_dropout_prob: f64,
    /// BERT model type (bert, roberta)
    pub model_type: String,
    /// Index of the padding token
    pub pad_token_id: usize,
    /// Maximum sequence length for the tokenizer
    pub max_seq_len: Option<usize>,
    /// Whether to add a pooling layer to the model
    pub with_pooling_layer: Option<bool>,
    // -- End fields copied from BertModelConfig
    /// A map from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,
}

impl Config {
    /// Build a classification config from a pretrained BERT config and the
    /// task's class labels
    pub fn new_with_labels(model: BertModelConfig, labels: &[String]) -> Self {
        let id2label = labels
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.trim().to_string()))
            .collect();

        Config::new(
            model.num_attention_heads,
            model.num_hidden_layers,
            model.layer_norm_eps,
            model.hidden_size,
            model.intermediate_size,
            model.vocab_size,
            model.max_position_embeddings,
            model.type_vocab_size,
            model.hidden_dropout_prob,
            model.model_type,
            model.pad_token_id,
            id2label,
        )
        .with_max_seq_len(model.max_seq_len)
        .with_with_pooling_layer(model.with_pooling_layer)
    }

    /// Get the BERT model configuration
    pub fn get_bert_config(&self) -> BertModelConfig {
        BertModelConfig::new(
            self.num_attention_heads,
            self.num_hidden_layers,
            self.layer_norm_eps,
            self.hidden_size,
            self.intermediate_size,
            self.vocab_size,
            self.max_position_embeddings,
            self.type_vocab_size,
            self.hidden_dropout_prob,
            self.model_type.clone(),
            self.pad_token_id,
        )
        .with_max_seq_len(self.max_seq_len)
        .with_with_pooling_layer(self.with_pooling_layer)
    }

    /// Initialize the model
    pub fn init<B: AutodiffBackend>(&self, device: &B::Device) -> Model<B> {
        let model = self.get_bert_config().init(device);

        let n_classes = self.id2label.len();

        let output = LinearConfig::new(self.hidden_size, n_classes).init(device);

        Model {
            model,
            output,
            n_classes,
        }
    }
}

impl pipeline::ModelConfig for Config {
    /// Initialize the model
    fn init<B: AutodiffBackend>(&self, device: &B::Device) -> impl pipeline::Model<B>
    where
        i64: From<<B as Backend>::IntElem>,
    {
        self.init(device)
    }

    /// Load a pretrained model configuration
    async fn load_pretrained(
        config_file: PathBuf,
        labels: &[String],
        max_seq_length: usize,
        hidden_dropout_prob: f64,
    ) -> anyhow::Result<Self> {
        let mut bert_config = BertModelConfig::load(config_file)
            .map_err(|e| anyhow!("Unable to load Hugging Face config file: {}", e))?;

        // The pooled [CLS] output feeds the classification head
        bert_config.with_pooling_layer = Some(true);
        bert_config.hidden_dropout_prob = hidden_dropout_prob;
        bert_config.max_seq_len = Some(max_seq_length.min(bert_config.max_position_embeddings));

        let model_config = Config::new_with_labels(bert_config, labels);

        if model_config.id2label.is_empty() {
            return Err(anyhow!(
                "Classes are not defined in the model configuration"
            ));
        }

        Ok(model_config)
    }

    fn with_dropout(self, prob: f64) -> Self {
        self.with_hidden_dropout_prob(prob)
    }

    fn get_config(&self) -> pipeline::Config {
        pipeline::Config {
            pad_token_id: self.pad_token_id,
            max_position_embeddings: self.max_position_embeddings,
            hidden_size: self.hidden_size,
            max_seq_len: self.max_seq_len,
            hidden_dropout_prob: self.hidden_dropout_prob,
            id2label: self.id2label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn bert_config() -> BertModelConfig {
        BertModelConfig::new(
            12,
            12,
            1e-12,
            768,
            3072,
            30522,
            512,
            2,
            0.1,
            "bert".to_string(),
            0,
        )
    }

    #[test]
    fn labels_become_an_id_map() {
        let labels = vec!["msa".to_string(), " tunisian ".to_string()];

        let config = Config::new_with_labels(bert_config(), &labels);

        assert_eq!(config.id2label.get(&0), Some(&"msa".to_string()));
        assert_eq!(config.id2label.get(&1), Some(&"tunisian".to_string()));
    }

    #[test]
    fn the_bert_config_round_trips() {
        let config = Config::new_with_labels(bert_config(), &["a".to_string()]);

        let bert = config.get_bert_config();

        assert_eq!(bert.hidden_size, 768);
        assert_eq!(bert.vocab_size, 30522);
        assert_eq!(bert.model_type, "bert");
    }
}
