use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use at_ascii::engine::ConversionEngine;
use at_ascii::glyph::{GlyphCoverage, GlyphRasterizer};
use at_core::charset::{self, PRINTABLE_ASCII};
use at_core::config::SessionConfig;
use at_core::error::CoreError;
use at_core::frame::CharGrid;
use at_core::traits::{GridSink, ImageLoader};
use at_export::{HtmlSink, TextSink};
use at_source::ImageFileLoader;

use crate::command::{Command, HELP, parse_command};

/// Suite de la boucle après une commande.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Lire la commande suivante.
    Continue,
    /// Sortir de la boucle.
    Quit,
}

/// Session interactive : un moteur, un chargeur, une config.
///
/// Les erreurs utilisateur sont affichées et la session continue ; l'état
/// (image, résolution, charset, cache) reste celui d'avant la commande.
pub struct Session<L = ImageFileLoader, R = GlyphRasterizer> {
    engine: ConversionEngine<R>,
    loader: L,
    config: SessionConfig,
    image_name: Option<String>,
    prompt: bool,
}

impl<L: ImageLoader, R: GlyphCoverage> Session<L, R> {
    /// Build a session around an engine already holding its charset.
    pub fn new(engine: ConversionEngine<R>, loader: L, config: SessionConfig) -> Self {
        Self {
            engine,
            loader,
            config,
            image_name: None,
            prompt: false,
        }
    }

    /// Print a `> ` prompt before each command.
    #[must_use]
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// The underlying engine.
    pub fn engine(&self) -> &ConversionEngine<R> {
        &self.engine
    }

    /// Convert the current image, reusing the cached grid when valid.
    ///
    /// # Errors
    /// Returns the engine's error (no image, empty charset, bad resolution).
    pub fn convert(&mut self) -> Result<Arc<CharGrid>> {
        Ok(self.engine.convert()?)
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// # Errors
    /// Returns an error only if `input` or `out` fail; command errors are
    /// reported on `out` and the loop continues.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        if self.prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        for line in input.lines() {
            let line = line.context("Lecture de l'entrée impossible")?;
            match self.execute(&line, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    log::warn!("Commande `{}` échouée : {e:#}", line.trim());
                    writeln!(out, "erreur : {e:#}")?;
                }
            }
            if self.prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
        }
        Ok(())
    }

    /// Execute one command line.
    ///
    /// # Errors
    /// Returns the command's error; session state is unchanged in that case.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let Some(command) = parse_command(line)? else {
            return Ok(Flow::Continue);
        };
        log::debug!("Commande : {command:?}");

        match command {
            Command::Load(path) => self.load(&path, out)?,
            Command::Resolution(n) => self.set_resolution(n, out)?,
            Command::Add(arg) => {
                let chars = charset::parse_charset_arg(&arg)?;
                let added = self.engine.add_chars(chars);
                let total = self.engine.table().len();
                writeln!(out, "{added} caractère(s) ajouté(s), {total} au total")?;
            }
            Command::Remove(arg) => {
                let chars = charset::parse_charset_arg(&arg)?;
                let removed = self.engine.remove_chars(chars);
                let total = self.engine.table().len();
                writeln!(out, "{removed} caractère(s) retiré(s), {total} au total")?;
            }
            Command::Charset => {
                let chars: String = self.engine.table().charset().collect();
                writeln!(out, "[{chars}] ({})", self.engine.table().len())?;
            }
            Command::Preset(name) => {
                let chars = charset::preset(&name)?;
                self.replace_charset(chars.chars());
                let total = self.engine.table().len();
                writeln!(out, "preset {name} : {total} caractère(s)")?;
            }
            Command::Invert => {
                let invert = !self.engine.invert();
                self.engine.set_invert(invert);
                let state = if invert { "activée" } else { "désactivée" };
                writeln!(out, "inversion {state}")?;
            }
            Command::Show => {
                let grid = self.convert()?;
                TextSink::new(&mut *out).write_grid(&grid)?;
            }
            Command::Save(path) => {
                let grid = self.convert()?;
                let file = create(&path)?;
                TextSink::new(BufWriter::new(file)).write_grid(&grid)?;
                writeln!(out, "texte écrit dans {}", path.display())?;
            }
            Command::Html(path) => {
                let grid = self.convert()?;
                let file = create(&path)?;
                let title = self.image_name.clone().unwrap_or_else(|| "asciitile".into());
                HtmlSink::new(BufWriter::new(file), self.config.html_font_size)
                    .with_title(title)
                    .write_grid(&grid)?;
                writeln!(out, "HTML écrit dans {}", path.display())?;
            }
            Command::Info => self.info(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Load an image; on failure the previous image is kept.
    ///
    /// # Errors
    /// Returns the loader's error.
    pub fn load(&mut self, path: &Path, out: &mut impl Write) -> Result<()> {
        let image = self.loader.load(path)?;
        self.engine.set_image(Arc::new(image));
        self.image_name = path.file_name().and_then(|n| n.to_str()).map(String::from);

        if let Some((pw, ph)) = self.engine.padded_size() {
            let current = self.engine.resolution();
            let fitted = fit_resolution(current, pw, ph);
            if fitted != current {
                self.engine.set_resolution(fitted)?;
                writeln!(
                    out,
                    "résolution ajustée {current} → {fitted} pour un canevas {pw}×{ph}"
                )?;
            }
            writeln!(out, "image chargée : {} (canevas {pw}×{ph})", path.display())?;
        }
        Ok(())
    }

    fn set_resolution(&mut self, n: u32, out: &mut impl Write) -> Result<()> {
        if !n.is_power_of_two() {
            return Err(CoreError::resolution(n, "doit être une puissance de deux").into());
        }
        if self.engine.set_resolution(n)? {
            writeln!(out, "résolution : {n} colonnes")?;
        }
        Ok(())
    }

    /// Replace the whole charset, touching only the characters that differ.
    pub fn replace_charset(&mut self, chars: impl IntoIterator<Item = char>) {
        let wanted: Vec<char> = chars.into_iter().collect();
        let stale: Vec<char> = self
            .engine
            .table()
            .charset()
            .filter(|c| !wanted.contains(c))
            .collect();
        self.engine.remove_chars(stale);
        self.engine.add_chars(wanted);
    }

    fn info(&self, out: &mut impl Write) -> Result<()> {
        match (self.engine.image(), self.engine.padded_size()) {
            (Some(img), Some((pw, ph))) => writeln!(
                out,
                "image : {} {}×{} (canevas {pw}×{ph})",
                self.image_name.as_deref().unwrap_or("?"),
                img.width(),
                img.height()
            )?,
            _ => writeln!(out, "image : aucune")?,
        }
        writeln!(out, "résolution : {}", self.engine.resolution())?;
        writeln!(out, "charset : {} caractère(s)", self.engine.table().len())?;
        writeln!(out, "inversion : {}", self.engine.invert())?;
        writeln!(
            out,
            "conversions : {} (cache {})",
            self.engine.conversions(),
            if self.engine.is_cached() { "valide" } else { "vide" }
        )?;
        Ok(())
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Impossible de créer {}", path.display()))
}

/// Nearest valid resolution for a padded canvas: a power of two between
/// `width / height` and `width`.
#[must_use]
pub fn fit_resolution(resolution: u32, padded_width: u32, padded_height: u32) -> u32 {
    let min = (padded_width / padded_height).max(1);
    let clamped = resolution.clamp(min, padded_width);
    // Arrondi à la puissance de deux inférieure ; min et max en sont déjà.
    1 << (31 - clamped.leading_zeros())
}

/// Resolve a charset argument: a preset name, `all`, or literal characters.
#[must_use]
pub fn resolve_charset(arg: &str) -> Vec<char> {
    match charset::preset(arg) {
        Ok(chars) => chars.chars().collect(),
        Err(_) if arg == "all" => PRINTABLE_ASCII.collect(),
        Err(_) => arg.chars().collect(),
    }
}
