use thiserror::Error;

/// Errors originating from the core module.
///
/// Every variant is recoverable: the session reports it and keeps its state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Resolution rejected for the current padded canvas.
    #[error("Résolution invalide : {resolution} ({reason})")]
    InvalidResolution {
        /// Requested column count.
        resolution: u32,
        /// Human readable cause.
        reason: String,
    },

    /// Malformed charset argument (range, literal).
    #[error("Plage de caractères invalide : {0}")]
    InvalidCharRange(String),

    /// Conversion requested while the charset holds no glyph.
    #[error("Charset vide : ajoutez au moins un caractère")]
    EmptyCharset,

    /// Conversion requested before any image was loaded.
    #[error("Aucune image chargée")]
    NoImage,

    /// Named charset preset does not exist.
    #[error("Preset de charset inconnu : {0}")]
    UnknownPreset(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidResolution`].
    #[must_use]
    pub fn resolution(resolution: u32, reason: impl Into<String>) -> Self {
        Self::InvalidResolution {
            resolution,
            reason: reason.into(),
        }
    }
}
