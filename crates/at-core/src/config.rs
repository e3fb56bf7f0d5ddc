use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration de session, chargée au démarrage.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use at_core::config::SessionConfig;
/// let config = SessionConfig::default();
/// assert_eq!(config.resolution, 64);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SessionConfig {
    /// Nombre de colonnes demandé (puissance de deux).
    pub resolution: u32,
    /// Charset initial : un nom de preset ou une liste littérale de caractères.
    pub charset: String,
    /// Inverser la luminance (pour fond clair).
    pub invert: bool,
    /// Police TrueType/OpenType de référence. `None` = police bitmap intégrée.
    pub font_path: Option<PathBuf>,
    /// Taille de rasterisation des glyphes outline, en pixels.
    pub font_scale: f32,
    /// Taille de police de l'export HTML, en points.
    pub html_font_size: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            charset: "compact".to_string(),
            invert: false,
            font_path: None,
            font_scale: 24.0,
            html_font_size: 8.0,
        }
    }
}

impl SessionConfig {
    /// Ramène chaque champ numérique dans sa plage valide.
    pub fn clamp_all(&mut self) {
        self.resolution = self.resolution.clamp(1, 1 << 14);
        self.font_scale = self.font_scale.clamp(8.0, 128.0);
        self.html_font_size = self.html_font_size.clamp(1.0, 72.0);
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    session: Option<SessionSection>,
    export: Option<ExportSection>,
}

#[derive(Deserialize)]
struct SessionSection {
    resolution: Option<u32>,
    charset: Option<String>,
    invert: Option<bool>,
    font_path: Option<PathBuf>,
    font_scale: Option<f32>,
}

#[derive(Deserialize)]
struct ExportSection {
    html_font_size: Option<f32>,
}

/// Load a TOML configuration, falling back to defaults for missing keys.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse TOML text into a clamped [`SessionConfig`].
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use at_core::config::parse_config;
/// let config = parse_config("[session]\nresolution = 32\n").unwrap();
/// assert_eq!(config.resolution, 32);
/// assert_eq!(config.charset, "compact");
/// ```
pub fn parse_config(content: &str) -> Result<SessionConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = SessionConfig::default();

    if let Some(s) = file.session {
        if let Some(v) = s.resolution {
            config.resolution = v;
        }
        if let Some(v) = s.charset {
            config.charset = v;
        }
        if let Some(v) = s.invert {
            config.invert = v;
        }
        if s.font_path.is_some() {
            config.font_path = s.font_path;
        }
        if let Some(v) = s.font_scale {
            config.font_scale = v;
        }
    }
    if let Some(e) = file.export {
        if let Some(v) = e.html_font_size {
            config.html_font_size = v;
        }
    }

    config.clamp_all();
    log::debug!("Config chargée : {config:?}");
    Ok(config)
}
