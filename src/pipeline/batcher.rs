use std::collections::BTreeMap;

use burn::{
    data::dataloader,
    nn::attention::generate_padding_mask,
    tensor::{backend::Backend, Bool, Data, ElementConversion, Int, Tensor},
};
use derive_new::new;
use tokenizers::Tokenizer;

use crate::utils::classes::invert_map;

use super::{model, Item};

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Tokenized text as 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,

    /// Padding mask for the tokenized text containing booleans for padding locations
    pub mask_pad: Tensor<B, 2, Bool>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching text classification items
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Tokenizer for converting text to token IDs
    pub tokenizer: Tokenizer,

    /// Maximum sequence length for tokenized text
    pub max_seq_length: usize,

    /// ID of the padding token
    pub pad_token_id: usize,

    /// A mapping from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,

    /// A mapping from class name labels to class ids
    pub label2id: BTreeMap<String, usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(tokenizer: Tokenizer, config: model::Config, device: B::Device) -> Self {
        let label2id = invert_map(&config.id2label);

        Self {
            tokenizer,
            pad_token_id: config.pad_token_id,
            max_seq_length: config.max_seq_len.unwrap_or(config.max_position_embeddings),
            id2label: config.id2label,
            label2id,
            device,
        }
    }

    /// Resolve a raw label column value to a class id
    fn class_id(&self, label: &str) -> usize {
        resolve_class_id(label, &self.label2id)
    }
}

/// Data files carry either zero-based class ids or class names in the label
/// column. Unresolvable labels fall back to class 0.
fn resolve_class_id(label: &str, label2id: &BTreeMap<String, usize>) -> usize {
    let label = label.trim();

    label
        .parse::<usize>()
        .ok()
        .or_else(|| label2id.get(label).copied())
        .unwrap_or_default()
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<String, Infer<B>> for Batcher<B> {
    /// Collects a vector of text samples into an inference batch
    fn batch(&self, items: Vec<String>) -> Infer<B> {
        let batch_size = items.len();

        let mut token_ids_list = Vec::with_capacity(batch_size);

        for input in items {
            let tokens = self
                .tokenizer
                .encode(input, true)
                .expect("unable to encode");

            let token_ids: Vec<_> = tokens.get_ids().iter().map(|t| *t as usize).collect();

            token_ids_list.push(token_ids);
        }

        let padding = generate_padding_mask(
            self.pad_token_id,
            token_ids_list,
            Some(self.max_seq_length),
            &self.device,
        );

        Infer {
            tokens: padding.tensor,
            mask_pad: padding.mask,
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend, I: Item> dataloader::batcher::Batcher<I, Train<B>> for Batcher<B> {
    /// Collects a vector of text classification items into a training batch
    fn batch(&self, items: Vec<I>) -> Train<B> {
        let batch_size = items.len();

        let inputs = items.iter().map(|item| item.input().to_string()).collect();
        let input: Infer<B> = self.batch(inputs);

        let mut class_id_list = Vec::with_capacity(batch_size);

        for item in &items {
            let class_id = self.class_id(item.class_label());

            class_id_list.push(Tensor::from_data(
                Data::from([(class_id as i64).elem()]),
                &self.device,
            ));
        }

        let targets = Tensor::cat(class_id_list, 0);

        Train { input, targets }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn label2id() -> BTreeMap<String, usize> {
        [("negative".to_string(), 0), ("positive".to_string(), 1)]
            .into_iter()
            .collect()
    }

    #[test]
    fn numeric_labels_are_class_ids() {
        assert_eq!(resolve_class_id("1", &label2id()), 1);
        assert_eq!(resolve_class_id(" 0 ", &label2id()), 0);
    }

    #[test]
    fn class_names_resolve_through_the_label_map() {
        assert_eq!(resolve_class_id("positive", &label2id()), 1);
        assert_eq!(resolve_class_id("negative", &label2id()), 0);
    }

    #[test]
    fn unknown_labels_fall_back_to_class_zero() {
        assert_eq!(resolve_class_id("neutral", &label2id()), 0);
    }
}
