use thiserror::Error;
use uuid::Uuid;

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate trait key '{0}' in catalog")]
    DuplicateTraitKey(String),

    #[error("Trait '{0}' is not available for this form")]
    UnknownTrait(String),

    #[error("Position {index} is out of range for {len} selected schemas")]
    PositionOutOfRange { index: usize, len: usize },

    #[error("Form session {0} not found")]
    FormNotFound(Uuid),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
