//! Tab-separated data files with two columns of text and label, i.e.:
//! `[WORD][SPACE][WORD][SPACE][WORD][TAB][LABEL]`

use std::collections::BTreeSet;

use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::pipeline;

/// A single text classification record
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The text for classification
    pub text: String,

    /// The class label, either a zero-based class id or a class name
    pub label: String,
}

impl pipeline::Item for Item {
    fn input(&self) -> &str {
        &self.text
    }

    fn class_label(&self) -> &str {
        &self.label
    }
}

/// A text classification dataset stored in a tab-separated file
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl Dataset {
    /// Load a tab-separated data file
    pub async fn load(file_path: &str) -> std::io::Result<Self> {
        let mut reader = csv::ReaderBuilder::new();
        reader.delimiter(b'\t').has_headers(false).quoting(false);

        let dataset = InMemDataset::from_csv(file_path, &reader)?;

        Ok(Self { dataset })
    }

    /// The number of distinct classes present in the file
    pub fn num_classes(&self) -> usize {
        let mut labels = BTreeSet::new();

        for index in 0..self.len() {
            if let Some(item) = self.get(index) {
                labels.insert(item.label);
            }
        }

        labels.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write_tsv(name: &str, contents: &str) -> String {
        let dir = std::env::temp_dir().join(format!("bert-classify-tsv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();

        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn loads_two_column_rows() {
        let path = write_tsv(
            "rows.tsv",
            "this show was wonderful\t1\nwhat a waste of an evening\t0\n",
        );

        let dataset = Dataset::load(&path).await.unwrap();

        assert_eq!(dataset.len(), 2);

        let item = dataset.get(0).unwrap();
        assert_eq!(item.text, "this show was wonderful");
        assert_eq!(item.label, "1");
    }

    #[tokio::test]
    async fn counts_distinct_classes() {
        let path = write_tsv(
            "classes.tsv",
            "first\t0\nsecond\t1\nthird\t1\nfourth\t2\n",
        );

        let dataset = Dataset::load(&path).await.unwrap();

        assert_eq!(dataset.num_classes(), 3);
    }

    #[tokio::test]
    async fn keeps_quotes_in_the_text_column() {
        let path = write_tsv("quotes.tsv", "he said \"never again\" twice\t1\n");

        let dataset = Dataset::load(&path).await.unwrap();

        assert_eq!(
            dataset.get(0).unwrap().text,
            "he said \"never again\" twice"
        );
    }

    #[tokio::test]
    async fn missing_files_are_io_errors() {
        assert!(Dataset::load("data/does-not-exist.tsv").await.is_err());
    }
}
