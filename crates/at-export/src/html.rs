use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use at_core::frame::CharGrid;
use at_core::traits::GridSink;

/// Écrit la grille dans un document HTML autonome, police à chasse fixe.
pub struct HtmlSink<W: Write> {
    out: W,
    font_size: f32,
    title: String,
}

impl<W: Write> HtmlSink<W> {
    /// Wrap a writer; `font_size` is in points.
    pub fn new(out: W, font_size: f32) -> Self {
        Self {
            out,
            font_size,
            title: "asciitile".to_string(),
        }
    }

    /// Set the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GridSink for HtmlSink<W> {
    fn write_grid(&mut self, grid: &CharGrid) -> Result<()> {
        let mut doc = String::with_capacity(
            256 + (grid.width() as usize + 1) * grid.height() as usize,
        );
        // Line-height 1 : les cellules restent proches du carré.
        let _ = write!(
            doc,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
             <style>pre {{ font-family: \"Courier New\", Courier, monospace; \
             font-size: {}pt; line-height: 1; letter-spacing: 0; }}</style>\n\
             </head>\n<body>\n<pre>\n",
            escape(&self.title),
            self.font_size
        );
        for line in grid.lines() {
            doc.push_str(&escape(&line));
            doc.push('\n');
        }
        doc.push_str("</pre>\n</body>\n</html>\n");

        self.out
            .write_all(doc.as_bytes())
            .context("Écriture HTML impossible")?;
        self.out.flush().context("Flush HTML impossible")?;
        log::debug!("HTML écrit : {}×{}", grid.width(), grid.height());
        Ok(())
    }
}

/// Échappe `& < > "` pour le contenu et les attributs HTML.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(grid: &CharGrid) -> String {
        let mut sink = HtmlSink::new(Vec::new(), 6.0).with_title("test <1>");
        sink.write_grid(grid).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn escapes_markup_characters() {
        let grid = CharGrid::from_cells(4, 1, vec!['<', '&', '>', '"']).unwrap();
        let html = render(&grid);
        assert!(html.contains("<pre>\n&lt;&amp;&gt;&quot;\n</pre>"));
        assert!(html.contains("<title>test &lt;1&gt;</title>"));
    }

    #[test]
    fn uses_a_monospace_font_at_the_given_size() {
        let html = render(&CharGrid::new(2, 2));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("monospace"));
        assert!(html.contains("font-size: 6pt"));
        assert!(html.contains("<pre>\n  \n  \n</pre>"));
    }

    #[test]
    fn writes_to_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut sink = HtmlSink::new(file.reopen().unwrap(), 8.0);
        sink.write_grid(&CharGrid::new(1, 1)).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.ends_with("</html>\n"));
    }
}
