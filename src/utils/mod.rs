/// Utilities for classification labels
pub mod classes;

/// Hugging Face utilities
pub mod hugging_face;
