use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, point};
use anyhow::{Context, Result};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, iso_8859_1::FONT_10X20};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

/// Police bitmap de référence (10×20, ISO-8859-1).
pub const REFERENCE_FONT: &MonoFont<'static> = &FONT_10X20;

/// Source of raw glyph brightness (ink coverage in `[0, 1]`).
///
/// Implemented by [`GlyphRasterizer`] and by any `FnMut(char) -> f64`, which
/// lets tests pin raw values.
pub trait GlyphCoverage {
    /// Ink coverage of `ch`. Must be deterministic for a given source.
    fn coverage(&mut self, ch: char) -> f64;
}

impl<F: FnMut(char) -> f64> GlyphCoverage for F {
    fn coverage(&mut self, ch: char) -> f64 {
        self(ch)
    }
}

/// Bitmap binaire d'un glyphe (true = encre).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl GlyphBitmap {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at (`x`, `y`) is inked.
    #[must_use]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.pixels[(y * self.width + x) as usize]
    }

    fn mark(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = true;
        }
    }

    /// Foreground pixels over total pixels.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let inked = self.pixels.iter().filter(|&&p| p).count();
        inked as f64 / self.pixels.len() as f64
    }
}

impl OriginDimensions for GlyphBitmap {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for GlyphBitmap {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(pos, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(pos.x), u32::try_from(pos.y)) {
                if color.is_on() {
                    self.mark(x, y);
                }
            }
        }
        Ok(())
    }
}

enum Face {
    Reference,
    Outline {
        font: FontVec,
        scale: PxScale,
        cell_width: u32,
        cell_height: u32,
    },
}

/// Rasterise des caractères dans une police fixe et mesure leur couverture.
///
/// Le résultat est mémoïsé par caractère : un même glyphe donne toujours la
/// même valeur pour la durée de vie du rasterizer.
///
/// # Example
/// ```
/// use at_ascii::glyph::{GlyphCoverage, GlyphRasterizer};
/// let mut raster = GlyphRasterizer::reference();
/// assert_eq!(raster.coverage(' '), 0.0);
/// assert!(raster.coverage('#') > raster.coverage('.'));
/// ```
pub struct GlyphRasterizer {
    face: Face,
    memo: HashMap<char, f64>,
}

impl GlyphRasterizer {
    /// Rasterizer over the built-in reference bitmap font.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            face: Face::Reference,
            memo: HashMap::new(),
        }
    }

    /// Rasterizer over an outline font.
    ///
    /// The cell is sized like a terminal cell: the advance of `M` by the
    /// font's line height at `scale_px`.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn from_font_data(font_data: Vec<u8>, scale_px: f32) -> Result<Self> {
        let font = FontVec::try_from_vec(font_data)?;
        let scale = PxScale::from(scale_px);

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / font.height_unscaled()).ceil() as u32;

        let m_glyph = font.glyph_id('M');
        let h_advance = font.h_advance_unscaled(m_glyph);
        let width = (h_advance * scale.x / font.height_unscaled()).ceil() as u32;

        log::debug!("Police outline chargée, cellule {width}×{height}px");
        Ok(Self {
            face: Face::Outline {
                font,
                scale,
                cell_width: width.max(1),
                cell_height: height.max(1),
            },
            memo: HashMap::new(),
        })
    }

    /// Load an outline font from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid font.
    pub fn from_font_file(path: &Path, scale_px: f32) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Impossible de lire la police {}", path.display()))?;
        Self::from_font_data(data, scale_px)
            .with_context(|| format!("Police invalide : {}", path.display()))
    }

    /// Glyph cell size in pixels.
    #[must_use]
    pub fn cell_size(&self) -> (u32, u32) {
        match &self.face {
            Face::Reference => (
                REFERENCE_FONT.character_size.width,
                REFERENCE_FONT.character_size.height,
            ),
            Face::Outline {
                cell_width,
                cell_height,
                ..
            } => (*cell_width, *cell_height),
        }
    }

    /// Render `ch` into a fresh binary bitmap.
    #[must_use]
    pub fn bitmap(&self, ch: char) -> GlyphBitmap {
        let (w, h) = self.cell_size();
        let mut bitmap = GlyphBitmap::blank(w, h);
        match &self.face {
            Face::Reference => {
                let style = MonoTextStyle::new(REFERENCE_FONT, BinaryColor::On);
                let mut buf = [0u8; 4];
                let text = Text::with_baseline(
                    ch.encode_utf8(&mut buf),
                    Point::zero(),
                    style,
                    Baseline::Top,
                );
                let Ok(_) = text.draw(&mut bitmap);
            }
            Face::Outline { font, scale, .. } => {
                let gid = font.glyph_id(ch);
                let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();
                let glyph = gid.with_scale_and_position(*scale, point(0.0, ascent_px));

                if let Some(outline) = font.outline_glyph(glyph) {
                    let bounds = outline.px_bounds();
                    #[allow(clippy::cast_possible_wrap)]
                    outline.draw(|x, y, v| {
                        if v < 0.5 {
                            return;
                        }
                        let px = x as i32 + bounds.min.x as i32;
                        let py = y as i32 + bounds.min.y as i32;
                        if let (Ok(px), Ok(py)) = (u32::try_from(px), u32::try_from(py)) {
                            bitmap.mark(px, py);
                        }
                    });
                }
            }
        }
        bitmap
    }
}

impl GlyphCoverage for GlyphRasterizer {
    fn coverage(&mut self, ch: char) -> f64 {
        if let Some(&v) = self.memo.get(&ch) {
            return v;
        }
        let v = self.bitmap(ch).coverage();
        self.memo.insert(ch, v);
        v
    }
}
