use std::path::PathBuf;

use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as BatcherTrait,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
};
use tokenizers::Tokenizer;

use super::{Batcher, Model, ModelConfig};

/// Reload a trained model from the experiment's saved configuration and a
/// trained record (a training checkpoint or a packaged bundle), then classify
/// a list of raw text queries. Returns the softmax scores for each query
/// along with the model configuration, for label lookup.
pub fn classify<B, M>(
    device: B::Device,    // Device on which to perform computation
    model_name: &str,     // The pretrained model name, for the tokenizer
    artifact_dir: &str,   // Directory containing the saved config.json
    record_path: PathBuf, // Extension-less record stem to load weights from
    queries: Vec<String>, // Text queries to classify
) -> anyhow::Result<(Tensor<B, 2>, M::Config)>
where
    B: AutodiffBackend,
    M: Model<B> + 'static,
    i64: From<<B as Backend>::IntElem>,
{
    // Load experiment configuration, with dropout disabled for inference
    let config = M::Config::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?
        .with_dropout(0.0);

    // Initialize tokenizer
    let tokenizer = Tokenizer::from_pretrained(model_name, None)
        .map_err(|e| anyhow!("Unable to load tokenizer for {}: {}", model_name, e))?;

    // Initialize batcher for batching queries
    let batcher = Batcher::<B>::new(tokenizer, config.get_config(), device.clone());

    // Load trained model weights
    log::info!("Loading weights from {}...", record_path.display());

    let record = CompactRecorder::new()
        .load(record_path, &device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    // Create model using loaded weights
    let model = config.init::<B>(&device).load_record(record);

    // Run inference on the given text queries
    let item = batcher.batch(queries);

    Ok((model.infer(item), config.clone()))
}
