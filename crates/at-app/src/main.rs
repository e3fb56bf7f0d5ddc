use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Result;
use at_ascii::engine::ConversionEngine;
use at_ascii::glyph::GlyphRasterizer;
use at_ascii::table::GlyphBrightnessTable;
use at_core::config::SessionConfig;
use at_core::traits::GridSink;
use at_export::{HtmlSink, TextSink};
use at_source::ImageFileLoader;
use clap::Parser;

pub mod cli;
pub mod command;
pub mod session;

use session::Session;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    cli.validate()?;

    // 3. Charger la config, puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    if let Some(resolution) = cli.resolution {
        config.resolution = resolution;
    }
    if let Some(ref charset) = cli.charset {
        config.charset.clone_from(charset);
    }
    if cli.font.is_some() {
        config.font_path.clone_from(&cli.font);
    }
    config.invert |= cli.invert;

    // 4. Moteur : rasterizer, charset initial
    let rasterizer = match &config.font_path {
        Some(path) => GlyphRasterizer::from_font_file(path, config.font_scale)?,
        None => GlyphRasterizer::reference(),
    };
    let table = GlyphBrightnessTable::new(rasterizer);
    let mut engine = ConversionEngine::new(table, config.resolution);
    engine.add_chars(session::resolve_charset(&config.charset));
    engine.set_invert(config.invert);
    log::info!(
        "Charset initial : {} caractère(s), résolution {}",
        engine.table().len(),
        engine.resolution()
    );

    let wants_session = cli.wants_session();
    let html = cli.html;
    let html_font_size = config.html_font_size;
    let mut session = Session::new(engine, ImageFileLoader, config).with_prompt(wants_session);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(ref path) = cli.image {
        session.load(path, &mut io::sink())?;
    }

    // 5. Boucle interactive
    if wants_session {
        writeln!(out, "asciitile : tapez `help` pour la liste des commandes")?;
        return session.run(io::stdin().lock(), &mut out);
    }

    // 6. Conversion directe
    let grid = session.convert()?;
    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(out),
    };
    if html {
        HtmlSink::new(writer, html_font_size).write_grid(&grid)?;
    } else {
        TextSink::new(writer).write_grid(&grid)?;
    }
    Ok(())
}

/// Resolve config: --config if present, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<SessionConfig> {
    if cli.config.exists() {
        at_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(SessionConfig::default())
    }
}
