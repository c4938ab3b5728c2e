/*
 * Error Module
 *
 * Errors surfaced by the engine's boundaries. None of them are fatal: callers
 * log them and fall back to defaults so the animation keeps running.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoleculesError {
    #[error("settings payload is not valid JSON: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("settings I/O error: {0}")]
    SettingsIo(#[from] std::io::Error),

    #[error("unrecognized colour value: {0:?}")]
    ColorParse(String),
}

pub type Result<T> = std::result::Result<T, MoleculesError>;
