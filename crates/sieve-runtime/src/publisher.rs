//! # Publication
//!
//! Hands the persisted snapshot to a content store clients fetch from.
//! Writes are conditional: the caller names the content it expects to
//! replace and the sink refuses with `Conflict` if something else is there.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use sv_03_tally_engine::{PublicationConfig, PublicationPayload, TallyApi, TallyError};
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path {0:?} escapes the publication root")]
    InvalidPath(String),

    #[error("Payload error: {0}")]
    Payload(#[from] TallyError),

    #[error("Publication task failed: {0}")]
    Task(#[from] JoinError),
}

/// Result of a conditional publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Content written; `token` identifies it for the next precondition
    Published { token: String },
    /// Current content did not match the precondition; nothing written
    Conflict {
        expected: Option<String>,
        actual: Option<String>,
    },
}

/// Publication target (Driven Port)
#[async_trait]
pub trait PublicationSink: Send + Sync {
    /// Token of the content currently at `path`, `None` if absent.
    async fn current_token(&self, path: &str) -> Result<Option<String>, PublishError>;

    /// Write the payload if `payload.precondition` matches the current token.
    async fn publish(&self, payload: &PublicationPayload) -> Result<PublishOutcome, PublishError>;
}

/// Directory-backed sink. Tokens are hex SHA-256 digests of file content.
///
/// File I/O runs on the blocking pool.
pub struct FilesystemSink {
    root: PathBuf,
    // serializes compare-and-write within this process
    write_lock: Arc<Mutex<()>>,
}

impl FilesystemSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, PublishError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(PublishError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn read_token(file: &Path) -> Result<Option<String>, PublishError> {
    match fs::read(file) {
        Ok(bytes) => Ok(Some(content_token(&bytes))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_if_current(
    lock: &Mutex<()>,
    file: &Path,
    content: &[u8],
    precondition: &Option<String>,
) -> Result<PublishOutcome, PublishError> {
    let _guard = lock.lock();
    let actual = read_token(file)?;
    if actual != *precondition {
        return Ok(PublishOutcome::Conflict {
            expected: precondition.clone(),
            actual,
        });
    }

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    let staging = file.with_extension("tmp");
    {
        let mut out = fs::File::create(&staging)?;
        out.write_all(content)?;
        out.sync_all()?;
    }
    fs::rename(&staging, file)?;

    Ok(PublishOutcome::Published {
        token: content_token(content),
    })
}

#[async_trait]
impl PublicationSink for FilesystemSink {
    async fn current_token(&self, path: &str) -> Result<Option<String>, PublishError> {
        let file = self.resolve(path)?;
        task::spawn_blocking(move || read_token(&file)).await?
    }

    async fn publish(&self, payload: &PublicationPayload) -> Result<PublishOutcome, PublishError> {
        let file = self.resolve(&payload.path)?;
        let content = payload.content()?;
        let precondition = payload.precondition.clone();
        let lock = Arc::clone(&self.write_lock);
        task::spawn_blocking(move || write_if_current(&lock, &file, &content, &precondition))
            .await?
    }
}

/// Hex SHA-256 of published content.
pub fn content_token(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Publish the engine's current snapshot. `None` when nothing is persisted yet.
pub async fn publish_current<T, P>(
    engine: &T,
    sink: &P,
    config: &PublicationConfig,
) -> Result<Option<PublishOutcome>, PublishError>
where
    T: TallyApi + ?Sized,
    P: PublicationSink + ?Sized,
{
    let Some(snapshot) = engine.current_snapshot().await? else {
        return Ok(None);
    };

    let payload = PublicationPayload::build(&snapshot, config, None)?;
    let token = sink.current_token(&payload.path).await?;
    let payload = payload.with_precondition(token);

    let outcome = sink.publish(&payload).await?;
    match &outcome {
        PublishOutcome::Published { token } => {
            info!(path = %payload.path, version = %snapshot.version, token = %token, "Snapshot published")
        }
        PublishOutcome::Conflict { .. } => {
            warn!(path = %payload.path, "Publication target changed underneath us, skipping")
        }
    }
    Ok(Some(outcome))
}
