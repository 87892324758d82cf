use std::path::Path;

use burn::{
    config::Config as _,
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    lr_scheduler::noam::NoamLrSchedulerConfig,
    optim::AdamWConfig,
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
    train::{
        metric::{AccuracyMetric, CudaMetric, LearningRateMetric, LossMetric},
        ClassificationOutput, LearnerBuilder, ValidStep,
    },
};
use tokenizers::Tokenizer;

use crate::{config::ExperimentConfig, experiment::Experiment, utils::hugging_face::download_model};

use super::{batcher::Train, Batcher, Item, Model, ModelConfig};

/// Seed for dataloader shuffling when a split enables it
const SHUFFLE_SEED: u64 = 42;

/// Fine-tune a pretrained model on the given datasets, checkpointing through
/// the framework's file checkpointer, and persist the final config and model
/// record under the experiment's artifact directory. Returns the trained
/// model along with its configuration.
pub async fn train<B, M, I, D>(
    devices: Vec<B::Device>, // Devices on which to perform computation (e.g., CPU or CUDA devices)
    dataset_train: D,        // Training dataset
    dataset_valid: D,        // Validation dataset used during fit
    config: &ExperimentConfig, // Experiment configuration
    experiment: &Experiment, // Artifact directory bookkeeping
) -> anyhow::Result<(M, M::Config)>
where
    B: AutodiffBackend,
    M: Model<B> + 'static,
    I: Item + 'static,
    D: Dataset<I> + 'static,

    i64: From<<B as Backend>::IntElem>,

    M::InnerModule: ValidStep<
        Train<<B as AutodiffBackend>::InnerBackend>,
        ClassificationOutput<<B as AutodiffBackend>::InnerBackend>,
    >,
{
    let device = &devices[0];
    let artifact_dir = experiment.artifact_dir();
    let settings = &config.model;

    let (config_file, model_file) = download_model(&settings.pretrained_model_name).await?;

    let model_config = M::Config::load_pretrained(
        config_file,
        &settings.labels,
        settings.max_seq_length,
        settings.hidden_dropout_prob,
    )
    .await
    .map_err(|e| anyhow!("Unable to load pre-trained model config file: {}", e))?;

    let model = M::load_from_safetensors(device, model_file, model_config.clone())?;

    // Initialize tokenizer
    let tokenizer = Tokenizer::from_pretrained(&settings.pretrained_model_name, None)
        .map_err(|e| {
            anyhow!(
                "Unable to load tokenizer for {}: {}",
                settings.pretrained_model_name,
                e
            )
        })?;

    // Initialize batchers for training and validation data
    let batcher_train =
        Batcher::<B>::new(tokenizer.clone(), model_config.get_config(), device.clone());
    let batcher_valid =
        Batcher::<B::InnerBackend>::new(tokenizer, model_config.get_config(), device.clone());

    let workers = std::thread::available_parallelism()?;

    // Initialize data loaders for training and validation data
    let mut builder_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(settings.train_ds.batch_size)
        .num_workers(workers.into());
    if settings.train_ds.shuffle {
        builder_train = builder_train.shuffle(SHUFFLE_SEED);
    }
    let dataloader_train = builder_train.build(dataset_train);

    let mut builder_valid = DataLoaderBuilder::new(batcher_valid)
        .batch_size(settings.validation_ds.batch_size)
        .num_workers(workers.into());
    if settings.validation_ds.shuffle {
        builder_valid = builder_valid.shuffle(SHUFFLE_SEED);
    }
    let dataloader_valid = builder_valid.build(dataset_valid);

    // Initialize optimizer
    let optimizer = AdamWConfig::new().with_epsilon(settings.adam_epsilon).init();

    // Initialize learning rate scheduler
    let lr_scheduler = NoamLrSchedulerConfig::new(settings.learning_rate)
        .with_warmup_steps(0)
        .with_model_size(model_config.get_config().hidden_size)
        .init();

    // Initialize learner
    let learner = LearnerBuilder::new(artifact_dir)
        .metric_train(CudaMetric::new())
        .metric_valid(CudaMetric::new())
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .metric_train_numeric(LearningRateMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(devices)
        .num_epochs(config.trainer.num_epochs)
        .summary()
        .build(model, optimizer, lr_scheduler);

    // Train the model
    let model_trained = learner.fit(dataloader_train, dataloader_valid);

    // Save the configuration and the trained model
    model_config.save(format!("{artifact_dir}/config.json"))?;

    CompactRecorder::new()
        .record(
            model_trained.clone().into_record(),
            format!("{artifact_dir}/model").into(),
        )
        .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    Ok((model_trained, model_config))
}

/// Write a distribution-ready bundle of a trained model: the weights record
/// next to a config sidecar, both named after the export path's stem
pub fn export<B, M>(model: &M, model_config: &M::Config, export_path: &str) -> anyhow::Result<()>
where
    B: AutodiffBackend,
    M: Model<B> + 'static,
    i64: From<<B as Backend>::IntElem>,
{
    let path = Path::new(export_path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let stem = path.with_extension("");

    model_config.save(stem.with_extension("json"))?;

    CompactRecorder::new()
        .record(model.clone().into_record(), stem)
        .map_err(|e| anyhow!("Unable to package trained model weights: {}", e))?;

    Ok(())
}
