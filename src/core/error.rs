// Error handling for the signal core

use thiserror::Error;

use crate::core::format::SignalType;

pub type Result<T, E = SourceError> = std::result::Result<T, E>;

/// Why a request to the record service failed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// A failed load of one signal slot. The slot keeps its previous series.
#[derive(Error, Debug)]
#[error("Failed to fetch {signal_type} data for id '{id}': {cause}")]
pub struct FetchError {
    pub signal_type: SignalType,
    pub id: String,
    #[source]
    pub cause: SourceError,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog refresh failed: {0}")]
    Refresh(#[from] SourceError),
}
