//! Image assets
//!
//! Loading is an optimization: the next profile's image is warmed during the
//! display period, and a failed or slow load only degrades the swap visually.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::{BoardError, Result};

/// Loads a profile image so a later swap shows it without delay
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, reference: &str) -> Result<()>;
}

/// Why a load was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Lookahead during the display period
    Prefetch,
    /// Started at swap time because no prefetch had finished
    Fallback,
}

/// Load request emitted by the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub slot: usize,
    /// Pool index of the profile
    pub index: usize,
    pub reference: String,
    pub kind: LoadKind,
}

/// Finished load reported back to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutcome {
    pub slot: usize,
    pub index: usize,
    pub kind: LoadKind,
    /// Failure reason, `None` when the asset loaded
    pub error: Option<String>,
}

impl AssetOutcome {
    pub fn is_loaded(&self) -> bool {
        self.error.is_none()
    }
}

/// Run one load under a timeout
pub async fn load_bounded(
    loader: &dyn AssetLoader,
    request: &AssetRequest,
    timeout: Duration,
) -> AssetOutcome {
    let result = match tokio::time::timeout(timeout, loader.load(&request.reference)).await {
        Ok(result) => result,
        Err(_) => Err(BoardError::AssetTimeout {
            reference: request.reference.clone(),
            millis: timeout.as_millis() as u64,
        }),
    };

    AssetOutcome {
        slot: request.slot,
        index: request.index,
        kind: request.kind,
        error: result.err().map(|e| e.to_string()),
    }
}

/// Reads images from the local filesystem
///
/// References carrying a URL scheme are rejected; [`RoutedAssetLoader`] sends
/// http(s) references to [`HttpAssetLoader`] instead.
#[derive(Debug, Clone, Default)]
pub struct FileAssetLoader {
    root: Option<PathBuf>,
}

impl FileAssetLoader {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(reference),
            None => PathBuf::from(reference),
        }
    }
}

#[async_trait]
impl AssetLoader for FileAssetLoader {
    async fn load(&self, reference: &str) -> Result<()> {
        if reference.contains("://") {
            return Err(BoardError::AssetLoad {
                reference: reference.to_string(),
                reason: "not a local path".to_string(),
            });
        }

        let path = self.resolve(reference);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| BoardError::AssetLoad {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Asset loaded");
        Ok(())
    }
}

/// Fetches images over HTTP(S)
///
/// The whole body is read so the image is warm in any cache in front of the
/// kiosk. No client timeout is set; callers bound loads with [`load_bounded`].
#[derive(Debug, Clone)]
pub struct HttpAssetLoader {
    client: reqwest::Client,
}

impl HttpAssetLoader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BoardError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetLoader for HttpAssetLoader {
    async fn load(&self, reference: &str) -> Result<()> {
        let failed = |reason: String| BoardError::AssetLoad {
            reference: reference.to_string(),
            reason,
        };

        let response = self
            .client
            .get(reference)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        debug!(url = reference, bytes = bytes.len(), "Asset fetched");
        Ok(())
    }
}

/// Dispatches by scheme: http(s) URLs go over the network, the rest to disk
#[derive(Debug, Clone)]
pub struct RoutedAssetLoader {
    file: FileAssetLoader,
    http: HttpAssetLoader,
}

impl RoutedAssetLoader {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            file: FileAssetLoader::new(root),
            http: HttpAssetLoader::new()?,
        })
    }
}

fn is_http(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl AssetLoader for RoutedAssetLoader {
    async fn load(&self, reference: &str) -> Result<()> {
        if is_http(reference) {
            self.http.load(reference).await
        } else {
            self.file.load(reference).await
        }
    }
}
