//! BERT with a linear head for text classification (such as sentiment
//! analysis or dialect identification)

/// The model
pub mod model;

/// The model configuration
pub mod config;

pub use config::Config;
pub use model::{Model, ModelRecord};

/// Models known to work with this classifier head
pub static MODELS: &[&str] = &[
    "bert-base-uncased",
    "bert-base-cased",
    "bert-base-multilingual-cased",
];
