use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

use burn::{
    module::AutodiffModule,
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
    train::{ClassificationOutput, TrainStep},
};

use super::batcher;

/// The common model configuration properties needed by the pipeline
pub struct Config {
    /// The padding token ID
    pub pad_token_id: usize,

    /// The max position embeddings
    pub max_position_embeddings: usize,

    /// The size of the hidden state
    pub hidden_size: usize,

    /// An optional max sequence length, if different from max position embeddings
    pub max_seq_len: Option<usize>,

    /// The hidden dropout probability
    pub hidden_dropout_prob: f64,

    /// A mapping from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,
}

/// A trait for models that can be driven through the classification lifecycle
pub trait Model<B>:
    AutodiffModule<B> + TrainStep<batcher::Train<B>, ClassificationOutput<B>> + Display
where
    B: AutodiffBackend,
    i64: From<<B as Backend>::IntElem>,
{
    /// The model configuration
    type Config: ModelConfig;

    /// Perform a forward pass
    fn forward(&self, item: batcher::Train<B>) -> ClassificationOutput<B>;

    /// Defines forward pass for inference
    fn infer(&self, input: batcher::Infer<B>) -> Tensor<B, 2>;

    /// Load pretrained weights from a safetensors file
    fn load_from_safetensors(
        device: &B::Device,
        model_file: PathBuf,
        config: Self::Config,
    ) -> anyhow::Result<Self>;
}

/// A trait for configs that can be used for text classification models
pub trait ModelConfig: burn::config::Config + Clone {
    /// Initialize the model
    fn init<B: AutodiffBackend>(&self, device: &B::Device) -> impl Model<B>
    where
        i64: From<<B as Backend>::IntElem>;

    /// Load a pretrained model configuration, attaching the task's class labels
    fn load_pretrained(
        config_file: PathBuf,
        labels: &[String],
        max_seq_length: usize,
        hidden_dropout_prob: f64,
    ) -> impl std::future::Future<Output = anyhow::Result<Self>> + Send;

    /// Return a copy of this configuration with the given dropout rate
    fn with_dropout(self, prob: f64) -> Self;

    /// Return the Config needed for the text classification pipeline
    fn get_config(&self) -> Config;
}
