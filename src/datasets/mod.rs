/// Tab-separated text classification datasets
pub mod tsv;
