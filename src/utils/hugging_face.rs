use std::path::PathBuf;

use hf_hub::api::tokio::Api;

/// Download the pretrained config and weights from the Hugging Face Hub.
/// Files already present in the local cache are not downloaded again.
pub async fn download_model(model_name: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
    let api = Api::new()?;
    let repo = api.model(model_name.to_string());

    let model_file = repo.get("model.safetensors").await.map_err(|e| {
        anyhow!(
            "Failed to download model.safetensors for {} from the Hugging Face Hub: {}",
            model_name,
            e
        )
    })?;

    let config_file = repo.get("config.json").await.map_err(|e| {
        anyhow!(
            "Failed to download config.json for {} from the Hugging Face Hub: {}",
            model_name,
            e
        )
    })?;

    Ok((config_file, model_file))
}
