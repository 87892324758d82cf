//! The text classification pipeline: batching, training, evaluation and
//! inference around a pretrained model

/// Pipeline items
pub mod item;

/// Common model config and traits
pub mod model;

/// Batcher
pub mod batcher;

/// Training
pub mod training;

/// Evaluation
pub mod evaluation;

/// Inference
pub mod inference;

pub use batcher::Batcher;
pub use evaluation::{evaluate, Evaluation};
pub use inference::classify;
pub use item::Item;
pub use model::{Config, Model, ModelConfig};
pub use training::{export, train};
