use std::path::{Path, PathBuf};

use crate::error::{EngineError, LoadError};
use crate::message::EngineMessage;

/// Raw OpenAI-style completion object (`id`, `object`, `created`, `model`,
/// `choices`, `usage`) exactly as the engine produced it.
pub type Completion = serde_json::Value;

/// A loaded multimodal chat engine.
///
/// Calls are synchronous and may block for as long as generation takes.
/// Implementations are driven from a single thread (see
/// [`crate::InferenceWorker`]) so they need not be `Send` or `Sync`.
pub trait ChatEngine {
    fn chat_complete(
        &mut self,
        messages: &[EngineMessage],
        temperature: f32,
        max_tokens: i32,
    ) -> Result<Completion, EngineError>;
}

/// Load parameters for the model pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    /// Multimodal projector weights.
    pub mmproj_path: PathBuf,
    pub n_ctx: u32,
    /// Layers to offload to the GPU; negative means all of them.
    pub n_gpu_layers: i32,
}

impl EngineConfig {
    pub fn new(
        model_path: impl Into<PathBuf>,
        mmproj_path: impl Into<PathBuf>,
        n_ctx: u32,
        n_gpu_layers: i32,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            mmproj_path: mmproj_path.into(),
            n_ctx,
            n_gpu_layers,
        }
    }

    /// Fail fast when either weights file is missing, listing what *is* in
    /// the containing directory to make misconfigured mounts obvious.
    pub fn verify_model_files(&self) -> Result<(), LoadError> {
        require_file("Model", &self.model_path)?;
        require_file("MMProj", &self.mmproj_path)?;
        Ok(())
    }
}

fn require_file(kind: &'static str, path: &Path) -> Result<(), LoadError> {
    if path.exists() {
        return Ok(());
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Err(LoadError::FileNotFound {
        kind,
        path: path.to_path_buf(),
        listing: list_dir(&dir),
        dir,
    })
}

fn list_dir(dir: &Path) -> String {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return "Not Found or Empty".to_owned();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    if names.is_empty() {
        return "Not Found or Empty".to_owned();
    }
    names.sort();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn verify_passes_when_both_files_exist() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.gguf");
        let mmproj = dir.path().join("mmproj.gguf");
        std::fs::write(&model, b"gguf").unwrap();
        std::fs::write(&mmproj, b"gguf").unwrap();

        let config = EngineConfig::new(&model, &mmproj, 2048, -1);
        assert!(config.verify_model_files().is_ok());
    }

    #[test]
    fn missing_model_lists_directory_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("other.gguf"), b"gguf").unwrap();
        std::fs::write(dir.path().join("mmproj.gguf"), b"gguf").unwrap();

        let config = EngineConfig::new(
            dir.path().join("missing.gguf"),
            dir.path().join("mmproj.gguf"),
            2048,
            -1,
        );
        let err = config.verify_model_files().unwrap_err();
        let message = err.to_string();

        assert!(message.starts_with("Model file not found at"), "{message}");
        assert!(message.contains("[mmproj.gguf, other.gguf]"), "{message}");
    }

    #[test]
    fn missing_mmproj_is_reported_after_model_check() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model.gguf");
        std::fs::write(&model, b"gguf").unwrap();

        let config = EngineConfig::new(&model, dir.path().join("mmproj.gguf"), 2048, -1);
        let err = config.verify_model_files().unwrap_err();

        assert!(matches!(err, LoadError::FileNotFound { kind: "MMProj", .. }));
    }

    #[test]
    fn missing_directory_is_reported_as_not_found() {
        let config = EngineConfig::new(
            "/definitely/not/here/model.gguf",
            "/definitely/not/here/mmproj.gguf",
            2048,
            -1,
        );
        let message = config.verify_model_files().unwrap_err().to_string();
        assert!(message.ends_with("Not Found or Empty"), "{message}");
    }
}
