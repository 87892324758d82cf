//! Command line tool driving the full text classification lifecycle:
//! training, packaging, test evaluation, checkpoint re-evaluation and
//! sample-query inference for a named configuration preset.

use anyhow::Result;
use burn::backend::{libtorch::LibTorchDevice, Autodiff, LibTorch};
use pico_args::Arguments;

use bert_classify::{
    config::ExperimentConfig,
    datasets::tsv,
    experiment::{banner, Experiment},
    models::bert,
    pipeline::{self, ModelConfig},
};

const HELP: &str = "\
Usage: finetune [OPTIONS]

Fine-tunes a pretrained text classification model for the selected
configuration, then evaluates and runs inference with the result.

Options:
  -h, --help           Print help
  -c, --config-name    The configuration preset to run; 'sentiment_analysis'
                       (the default) and 'dialect_classification' are provided
  -p, --config-path    The directory containing configuration presets
                       (defaults to 'configs')
";

/// Sample queries classified with the trained model at the end of the run
const SAMPLE_QUERIES: &[&str] = &[
    "استفدت برشا نعشق فيديوهاتك و نحب نعرف وقتاه تعلمت هذ الكل",
    "بصراحة أحسن حاجة كيف رجعتو كريم القنات نورت بيك ربي يوفقك يا خويا كريم يا باهي",
    "المسلسل هاذا رغم سقاطتو و رغم كلشي فيه اما فيه برشا حاجات مش خايبين",
    "الله اعز مسلسل تونسي",
    " رجعتوا لفساد بطولة و لخماج قفازة  حسبنا الله ونعم الوكيل",
    "والله لا تحشم.. عيب عليك.. تحب تفدلك على ربي!!!!!! يعني لا دين، لا ملة",
];

type Backend = Autodiff<LibTorch>;
type Model = bert::Model<Backend>;

#[derive(Debug)]
struct Args {
    config_name: String,
    config_path: String,
}

impl Args {
    fn parse() -> Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config_name: pargs
                .opt_value_from_str(["-c", "--config-name"])?
                .unwrap_or_else(|| "sentiment_analysis".to_string()),
            config_path: pargs
                .opt_value_from_str(["-p", "--config-path"])?
                .unwrap_or_else(|| "configs".to_string()),
        };

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let output = Args::parse()?;

    if output.is_none() {
        print!("{}", HELP);

        return Ok(());
    }
    let args = output.unwrap();

    let config = ExperimentConfig::from_preset(&args.config_path, &args.config_name)?;
    log::info!("Config params:\n{}", serde_yaml::to_string(&config)?);

    let experiment = Experiment::resolve(&args.config_name, config.exp_manager.as_ref());

    // The training file is the one hard requirement; checked before any
    // framework object is constructed
    let train_file = config.validate()?;

    // Device placement is a single availability check, passed through to the
    // framework for everything else
    let devices: Vec<LibTorchDevice> = if tch::Cuda::is_available() {
        (0..config.trainer.devices).map(LibTorchDevice::Cuda).collect()
    } else {
        vec![LibTorchDevice::Cpu]
    };

    let settings = &config.model;

    if !bert::MODELS.contains(&settings.pretrained_model_name.as_str()) {
        log::warn!(
            "{} has not been tested with this classifier head",
            settings.pretrained_model_name
        );
    }

    let dataset_train = tsv::Dataset::load(train_file).await?;
    if dataset_train.num_classes() > settings.labels.len() {
        log::warn!(
            "{} contains more classes than 'model.labels' defines",
            train_file
        );
    }

    // The validation split doubles as the fit validation loader; fall back to
    // the training file when it is not configured
    let valid_file = match settings.validation_ds.file_path.as_deref() {
        Some(path) => path,
        None => {
            log::info!("No validation file configured, validating on the training file");
            train_file
        }
    };
    let dataset_valid = tsv::Dataset::load(valid_file).await?;

    banner();
    log::info!("Starting training...");

    let (model, model_config) = pipeline::train::<Backend, Model, tsv::Item, tsv::Dataset>(
        devices.clone(),
        dataset_train,
        dataset_valid,
        &config,
        &experiment,
    )
    .await?;

    log::info!("Training finished!");
    banner();

    if let Some(export_path) = &settings.export_path {
        pipeline::export::<Backend, Model>(&model, &model_config, export_path)?;
        log::info!("Model is saved into: {}", export_path);
    }

    // Evaluate the trained model on the test set if test_ds is set in the
    // config. The final record written by fit carries the trained weights;
    // reloading it runs the pass with dropout disabled.
    if let Some(test_file) = settings.test_ds.file_path.as_deref() {
        banner();
        log::info!("Starting the testing of the trained model on the test set...");

        let dataset_test = tsv::Dataset::load(test_file).await?;
        let report = pipeline::evaluate::<Backend, Model, tsv::Item, tsv::Dataset>(
            devices[0].clone(),
            experiment.artifact_dir(),
            experiment.model_record(),
            &settings.pretrained_model_name,
            dataset_test,
            settings.test_ds.batch_size,
        )?;

        log::info!("Test results: {}", report);
        log::info!("Testing finished!");
        banner();
    }

    // Locate the checkpoint written at the end of training by convention
    let checkpoint = experiment.last_checkpoint(config.trainer.num_epochs);

    // Re-evaluate the last checkpoint on the validation file, reloading the
    // model from disk on a single device so multi-device training state never
    // leaks into the evaluation
    match (&checkpoint, settings.validation_ds.file_path.as_deref()) {
        (Some(checkpoint), Some(valid_file)) => {
            banner();
            log::info!("Starting the evaluation of the last checkpoint on the validation file...");

            let dataset_valid = tsv::Dataset::load(valid_file).await?;
            let report = pipeline::evaluate::<Backend, Model, tsv::Item, tsv::Dataset>(
                devices[0].clone(),
                experiment.artifact_dir(),
                checkpoint.clone(),
                &settings.pretrained_model_name,
                dataset_valid,
                settings.validation_ds.batch_size,
            )?;

            log::info!("Evaluation results: {}", report);
            log::info!("Evaluation of the last checkpoint finished!");
            banner();
        }
        _ => {
            log::info!(
                "No file_path was set for validation_ds or no checkpoint was found, \
                 so final evaluation is skipped!"
            );
        }
    }

    // Classify a fixed list of sample queries with the reloaded checkpoint
    if let Some(checkpoint) = checkpoint {
        banner();
        log::info!("Starting the inference on some sample queries...");

        let queries: Vec<String> = SAMPLE_QUERIES.iter().map(|q| (*q).to_string()).collect();

        let (predictions, infer_config) = pipeline::classify::<Backend, Model>(
            devices[0].clone(),
            &settings.pretrained_model_name,
            experiment.artifact_dir(),
            checkpoint,
            queries.clone(),
        )?;

        let id2label = infer_config.get_config().id2label;

        log::info!("The prediction results of some sample queries with the trained model:");
        for (i, query) in queries.iter().enumerate() {
            #[allow(clippy::single_range_in_vec_init)]
            let prediction = predictions.clone().slice([i..i + 1]);

            let class_index = prediction.argmax(1).into_data().convert::<i64>().value[0] as usize;

            let label = id2label
                .get(&class_index)
                .cloned()
                .unwrap_or_else(|| class_index.to_string());

            log::info!("Query : {}", query);
            log::info!("Predicted label: {}", label);
        }

        log::info!("Inference finished!");
        banner();
    } else {
        log::info!("Inference is skipped as no checkpoint was found from the training!");
    }

    Ok(())
}
