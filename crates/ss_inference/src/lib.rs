pub mod models;
pub mod embeddings;

pub use embeddings::{create_embedder, EmbedderKind, EmbeddingConfig};
pub use models::{create_model, Config, LlmKind};

/// Browser-free clients still need a sane request timeout.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 60;

pub(crate) fn http_client() -> ss_core::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Join `path` onto a base URL without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub mod prelude {
    pub use super::{create_embedder, create_model, Config, EmbedderKind, EmbeddingConfig, LlmKind};
    pub use ss_core::{EmbeddingModel, Error, InferenceModel, Result};
}
