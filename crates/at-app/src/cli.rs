use std::path::PathBuf;

use clap::Parser;

/// asciitile: convertit une image en ASCII art par couverture de glyphes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Image source (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Nombre de colonnes (puissance de deux). Écrase la config.
    #[arg(short, long)]
    pub resolution: Option<u32>,

    /// Charset initial : preset (compact, standard, minimal, digital), "all",
    /// ou caractères littéraux.
    #[arg(long)]
    pub charset: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Police TrueType/OpenType pour mesurer les glyphes.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Inverser la luminance (fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Fichier de sortie. Défaut : stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Écrire un document HTML au lieu de texte brut.
    #[arg(long, default_value_t = false)]
    pub html: bool,

    /// Session interactive sur stdin, même avec --image.
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Whether to run the command loop rather than a one-shot conversion.
    #[must_use]
    pub fn wants_session(&self) -> bool {
        self.interactive || self.image.is_none()
    }

    /// Validate flag combinations.
    ///
    /// # Errors
    /// Returns an error if `--html` is combined with an interactive session.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.html && self.wants_session() {
            anyhow::bail!("--html ne s'applique qu'à la conversion directe (--image sans -i).");
        }
        Ok(())
    }
}
