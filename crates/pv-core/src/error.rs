//! Crate-wide error type. Mirrors the `thiserror` + `Result` alias shape of
//! `rf-core::error::RfError` / `rf-spatial::error::SpatialError`, narrowed to
//! the two error kinds the source actually raises.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("not enough memory to construct module")]
    NotEnoughMemory,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
