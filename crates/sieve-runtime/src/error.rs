//! Errors raised by a scheduled tally pass.

use shared_types::StoreError;
use sv_03_tally_engine::TallyError;
use thiserror::Error;

use crate::publisher::PublishError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Lease error: {0}")]
    Lease(#[from] StoreError),

    #[error("Tally error: {0}")]
    Tally(#[from] TallyError),

    #[error("Publication error: {0}")]
    Publish(#[from] PublishError),
}
