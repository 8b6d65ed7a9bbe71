//! Shared setup for the pipeline subcommands

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::AppConfig;
use crate::domain::component::{ComponentContext, ComponentSpec};
use crate::domain::ingestion::ParserInput;
use crate::infrastructure::embedding::REMOTE_EMBEDDER_KEY;
use crate::infrastructure::init_global_registry;
use crate::infrastructure::index::{InMemoryTextIndex, InMemoryVectorStore};

/// Component context over fresh in-memory backends
pub fn context() -> anyhow::Result<ComponentContext> {
    Ok(ComponentContext::new(init_global_registry()?)
        .with_vector_store(Arc::new(InMemoryVectorStore::new()))
        .with_text_index(Arc::new(InMemoryTextIndex::new())))
}

/// Embedder selection for a key, with connection settings for `remote`
pub fn embedder_spec(key: &str, config: &AppConfig) -> ComponentSpec {
    let spec = ComponentSpec::new(key);

    if key != REMOTE_EMBEDDER_KEY {
        return spec;
    }

    spec.with_option("base_url", config.embedding.base_url.clone())
        .with_option("api_key_env", config.embedding.api_key_env.clone())
        .with_option("model", config.embedding.model.clone())
}

/// Read each file; the path as given becomes the filename, so files sharing
/// a basename in different directories keep distinct document ids
pub async fn read_inputs(files: &[impl AsRef<Path>]) -> anyhow::Result<Vec<ParserInput>> {
    let mut inputs = Vec::with_capacity(files.len());

    for path in files {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        inputs.push(ParserInput::from_bytes(bytes).with_filename(path.to_string_lossy()));
    }

    Ok(inputs)
}

/// Token cancelled on Ctrl-C
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            child.cancel();
        }
    });

    token
}

pub fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_basename_in_different_directories() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a").join("notes.txt");
        let second = dir.path().join("b").join("notes.txt");

        for path in [&first, &second] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "meeting notes").unwrap();
        }

        let inputs = read_inputs(&[&first, &second]).await.unwrap();

        assert_eq!(inputs[0].filename.as_deref(), first.to_str());
        assert_eq!(inputs[1].filename.as_deref(), second.to_str());
        assert_ne!(inputs[0].filename, inputs[1].filename);
        assert_eq!(inputs[0].extension(), Some("txt".to_string()));
    }

    #[tokio::test]
    async fn test_missing_file_names_the_path() {
        let err = read_inputs(&["/nonexistent/notes.txt"]).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/notes.txt"));
    }
}
