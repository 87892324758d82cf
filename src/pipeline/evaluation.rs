use std::{fmt::Display, path::PathBuf, sync::Arc};

use burn::{
    config::Config as _,
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use tokenizers::Tokenizer;

use super::{batcher, Batcher, Item, Model, ModelConfig};

/// Aggregate metrics from one evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Mean cross-entropy loss over the file
    pub loss: f64,

    /// Fraction of samples classified correctly
    pub accuracy: f64,

    /// Number of samples evaluated
    pub samples: usize,
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "loss: {:.4}, accuracy: {:.2}% ({} samples)",
            self.loss,
            self.accuracy * 100.0,
            self.samples
        )
    }
}

/// Reload a model from the experiment's saved configuration and a trained
/// record (the final artifact record or an epoch checkpoint), then evaluate
/// it on a dataset, computing mean loss and accuracy. The model is
/// reconstructed on the given single device with dropout disabled,
/// independent of the training setup.
pub fn evaluate<B, M, I, D>(
    device: B::Device,    // Device on which to perform computation
    artifact_dir: &str,   // Directory containing the saved config.json
    record_path: PathBuf, // Extension-less record stem to load weights from
    model_name: &str,     // The pretrained model name, for the tokenizer
    dataset: D,           // The dataset to evaluate on
    batch_size: usize,    // Batch size
) -> anyhow::Result<Evaluation>
where
    B: AutodiffBackend,
    M: Model<B> + 'static,
    I: Item + 'static,
    D: Dataset<I> + 'static,
    i64: From<<B as Backend>::IntElem>,
{
    // Load experiment configuration, with dropout disabled for evaluation
    let config = M::Config::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?
        .with_dropout(0.0);

    // Load trained model weights
    log::info!("Loading weights from {}...", record_path.display());

    let record = CompactRecorder::new()
        .load(record_path, &device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    // Create model using loaded weights
    let model = config.init::<B>(&device).load_record(record);

    let dataloader = build_dataloader::<B, I, D>(
        device.clone(),
        config.get_config(),
        model_name,
        dataset,
        batch_size,
    )?;

    evaluate_loader(&model, dataloader)
}

fn build_dataloader<B, I, D>(
    device: B::Device,
    config: super::Config,
    model_name: &str,
    dataset: D,
    batch_size: usize,
) -> anyhow::Result<Arc<dyn DataLoader<batcher::Train<B>>>>
where
    B: Backend,
    I: Item + 'static,
    D: Dataset<I> + 'static,
{
    let tokenizer = Tokenizer::from_pretrained(model_name, None)
        .map_err(|e| anyhow!("Unable to load tokenizer for {}: {}", model_name, e))?;

    let batcher = Batcher::<B>::new(tokenizer, config, device);

    let workers = std::thread::available_parallelism()?;

    Ok(DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(workers.into())
        .build(dataset))
}

fn evaluate_loader<B, M>(
    model: &M,
    dataloader: Arc<dyn DataLoader<batcher::Train<B>>>,
) -> anyhow::Result<Evaluation>
where
    B: AutodiffBackend,
    M: Model<B>,
    i64: From<<B as Backend>::IntElem>,
{
    let mut total_loss = 0.0;
    let mut correct = 0;
    let mut samples = 0;

    for batch in dataloader.iter() {
        let batch_size = batch.targets.dims()[0];
        let output = model.forward(batch);

        let predictions: Vec<i64> = output.output.argmax(1).into_data().convert::<i64>().value;
        let targets: Vec<i64> = output.targets.into_data().convert::<i64>().value;

        correct += predictions
            .iter()
            .zip(targets.iter())
            .filter(|(prediction, target)| prediction == target)
            .count();

        total_loss += output.loss.into_scalar().elem::<f64>() * batch_size as f64;
        samples += batch_size;
    }

    if samples == 0 {
        return Err(anyhow!("the evaluation file contains no samples"));
    }

    Ok(Evaluation {
        loss: total_loss / samples as f64,
        accuracy: correct as f64 / samples as f64,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reports_are_rendered_for_the_log() {
        let report = Evaluation {
            loss: 0.3271,
            accuracy: 0.8725,
            samples: 800,
        };

        assert_eq!(
            report.to_string(),
            "loss: 0.3271, accuracy: 87.25% (800 samples)"
        );
    }
}
