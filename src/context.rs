// AppContext: Dependency Injection Container
// Centralizes the state shared by request handlers, built once at startup

#[cfg(test)]
use std::sync::Arc;

use crate::analysis::features::FeatureExtractor;
use crate::config::AppConfig;
use crate::error::{log_model_error, ModelError};
use crate::model::Classifier;

/// AppContext: everything a request handler needs
///
/// Consolidates the per-process state into a single container:
/// - AppConfig: configuration snapshot
/// - FeatureExtractor: precomputed filterbanks, shared across requests
/// - Classifier: network weights loaded from the artifact
///
/// The context is immutable after construction and shared behind an `Arc`,
/// so handlers never take locks and tests never reset global state.
pub struct AppContext {
    config: AppConfig,
    extractor: FeatureExtractor,
    classifier: Classifier,
}

impl AppContext {
    /// Build the context from configuration
    ///
    /// Loads the classifier artifact named by `config.model.path`. A load
    /// failure here is fatal; the server must not come up without a model.
    ///
    /// # Errors
    /// Any `ModelError` from reading or validating the artifact
    pub fn initialize(config: AppConfig) -> Result<Self, ModelError> {
        let extractor = FeatureExtractor::new(&config.pipeline);
        let classifier = Classifier::load(&config.model.path).map_err(|err| {
            log_model_error(&err, "initialize");
            err
        })?;

        tracing::info!(
            "Classifier loaded from {:?} (hidden width {})",
            config.model.path,
            classifier.hidden_width()
        );

        Ok(Self {
            config,
            extractor,
            classifier,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

// ========================================================================
// TEST SUPPORT
// ========================================================================

#[cfg(test)]
impl AppContext {
    /// Create an isolated context for testing
    ///
    /// Writes a seeded random artifact into a fresh temp directory and
    /// points the data directory there too, so parallel tests never share
    /// files. The returned `TempDir` must be kept alive for the duration
    /// of the test.
    pub fn new_test() -> (Arc<Self>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let model_path = dir.path().join("classifier.safetensors");
        crate::model::classifier::save_random_artifact(&model_path, 32, 42)
            .expect("write test artifact");

        let mut config = AppConfig::default();
        config.model.path = model_path;
        config.server.data_dir = dir.path().join("server_data");
        std::fs::create_dir_all(&config.server.data_dir).expect("create data dir");

        let context = Self::initialize(config).expect("context should initialize");
        (Arc::new(context), dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_with_valid_artifact() {
        let (context, _dir) = AppContext::new_test();
        assert_eq!(context.classifier().hidden_width(), 32);
        assert_eq!(context.config().server.port, 10110);
    }

    #[test]
    fn test_initialize_fails_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.model.path = dir.path().join("missing.safetensors");

        let result = AppContext::initialize(config);
        assert!(matches!(result, Err(ModelError::ArtifactRead { .. })));
    }

    #[test]
    fn test_context_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppContext>();
    }

    #[test]
    fn test_parallel_test_isolation() {
        let (ctx1, _dir1) = AppContext::new_test();
        let (ctx2, _dir2) = AppContext::new_test();
        assert_ne!(
            ctx1.config().server.data_dir,
            ctx2.config().server.data_dir
        );
    }
}
