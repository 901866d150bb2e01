use thiserror::Error;

use crate::homeassistant::transport::TransportError;

#[derive(Debug, Error)]
pub enum Error {
    /// Grouped entities share one JSON state payload and need a template to pick their value.
    #[error("grouped entities need a value template (`value_template` or `val_tpl`)")]
    MissingValueTemplate,

    #[error("group members must be created from the device that owns the group")]
    ForeignDevice,

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;
