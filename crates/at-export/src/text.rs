use std::io::Write;

use anyhow::{Context, Result};
use at_core::frame::CharGrid;
use at_core::traits::GridSink;

/// Écrit la grille en texte brut, une ligne par rangée.
///
/// # Example
/// ```
/// use at_core::frame::CharGrid;
/// use at_core::traits::GridSink;
/// use at_export::text::TextSink;
///
/// let grid = CharGrid::from_cells(2, 2, vec!['#', '.', '.', '#']).unwrap();
/// let mut sink = TextSink::new(Vec::new());
/// sink.write_grid(&grid).unwrap();
/// assert_eq!(sink.into_inner(), b"#.\n.#\n");
/// ```
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GridSink for TextSink<W> {
    fn write_grid(&mut self, grid: &CharGrid) -> Result<()> {
        for line in grid.lines() {
            writeln!(self.out, "{line}").context("Écriture texte impossible")?;
        }
        self.out.flush().context("Flush texte impossible")?;
        Ok(())
    }
}
