use std::sync::Arc;

use at_core::error::CoreError;
use at_core::frame::{CharGrid, RasterImage};
use rayon::prelude::*;

use crate::glyph::{GlyphCoverage, GlyphRasterizer};
use crate::pad::{PaddedImage, SubImage};
use crate::table::GlyphBrightnessTable;

/// Convert `image` to a character grid of `resolution` columns.
///
/// Each square sub-image of the padded canvas is scored and replaced by the
/// glyph of nearest normalized brightness.
///
/// # Errors
/// Returns [`CoreError::InvalidResolution`] if `resolution` does not fit the
/// padded canvas, or [`CoreError::EmptyCharset`] if the table is empty.
///
/// # Example
/// ```
/// use at_core::frame::{RasterImage, Sample};
/// use at_ascii::engine::convert;
/// use at_ascii::table::GlyphBrightnessTable;
///
/// let img = RasterImage::filled(8, 4, Sample::WHITE).unwrap();
/// let mut table = GlyphBrightnessTable::new(|ch: char| if ch == '#' { 0.8 } else { 0.1 });
/// table.add_chars(['.', '#']);
/// let grid = convert(&img, 4, &table).unwrap();
/// assert_eq!((grid.width(), grid.height()), (4, 2));
/// assert_eq!(grid.to_string(), "####\n####");
/// ```
pub fn convert<R>(
    image: &RasterImage,
    resolution: u32,
    table: &GlyphBrightnessTable<R>,
) -> Result<CharGrid, CoreError> {
    render(image, resolution, table, false)
}

fn render<R>(
    image: &RasterImage,
    resolution: u32,
    table: &GlyphBrightnessTable<R>,
    invert: bool,
) -> Result<CharGrid, CoreError> {
    let padded = PaddedImage::new(image);
    let partition = padded.partition(resolution)?;
    if table.is_empty() {
        return Err(CoreError::EmptyCharset);
    }

    // Scoring en parallèle, ordre row-major préservé par collect().
    let scores: Vec<f64> = partition
        .cells()
        .par_iter()
        .map(SubImage::brightness)
        .collect();

    let cells = scores
        .into_iter()
        .map(|b| table.nearest_char(if invert { 1.0 - b } else { b }))
        .collect::<Result<Vec<char>, CoreError>>()?;

    CharGrid::from_cells(partition.cols(), partition.rows(), cells)
}

/// Moteur de conversion avec cache du dernier résultat.
///
/// Le cache n'est invalidé que par un changement effectif : nouvelle image,
/// nouvelle résolution, inversion basculée, ou charset réellement modifié.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use at_core::frame::{RasterImage, Sample};
/// use at_ascii::engine::ConversionEngine;
///
/// let mut engine = ConversionEngine::with_reference_font(8);
/// engine.add_chars(" .:#@".chars());
/// engine.set_image(Arc::new(RasterImage::filled(16, 16, Sample::BLACK).unwrap()));
/// let first = engine.convert().unwrap();
/// let second = engine.convert().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(engine.conversions(), 1);
/// ```
pub struct ConversionEngine<R = GlyphRasterizer> {
    table: GlyphBrightnessTable<R>,
    image: Option<Arc<RasterImage>>,
    resolution: u32,
    invert: bool,
    cached: Option<Arc<CharGrid>>,
    conversions: u64,
}

impl ConversionEngine<GlyphRasterizer> {
    /// Engine over the reference bitmap font, with an empty charset.
    #[must_use]
    pub fn with_reference_font(resolution: u32) -> Self {
        Self::new(GlyphBrightnessTable::default(), resolution)
    }
}

impl<R: GlyphCoverage> ConversionEngine<R> {
    /// Engine over `table`, without image.
    pub fn new(table: GlyphBrightnessTable<R>, resolution: u32) -> Self {
        Self {
            table,
            image: None,
            resolution,
            invert: false,
            cached: None,
            conversions: 0,
        }
    }

    /// Replace the image. Returns `false` if it is the very same image.
    pub fn set_image(&mut self, image: Arc<RasterImage>) -> bool {
        if self
            .image
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &image))
        {
            return false;
        }
        log::debug!("Nouvelle image {}×{}", image.width(), image.height());
        self.image = Some(image);
        self.invalidate();
        true
    }

    /// Change the column count. Returns `Ok(false)` for the current value.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidResolution`] if the value is zero or does
    /// not fit the current image; the engine is left unchanged.
    pub fn set_resolution(&mut self, resolution: u32) -> Result<bool, CoreError> {
        if resolution == self.resolution {
            return Ok(false);
        }
        match &self.image {
            Some(image) => {
                PaddedImage::new(image).cell_edge(resolution)?;
            }
            None if resolution == 0 => {
                return Err(CoreError::resolution(resolution, "doit être positive"));
            }
            None => {}
        }
        self.resolution = resolution;
        self.invalidate();
        Ok(true)
    }

    /// Toggle brightness inversion for light backgrounds.
    pub fn set_invert(&mut self, invert: bool) -> bool {
        if invert == self.invert {
            return false;
        }
        self.invert = invert;
        self.invalidate();
        true
    }

    /// Add one character to the charset.
    pub fn add_char(&mut self, ch: char) -> bool {
        self.add_chars([ch]) == 1
    }

    /// Remove one character from the charset.
    pub fn remove_char(&mut self, ch: char) -> bool {
        self.remove_chars([ch]) == 1
    }

    /// Add characters; invalidates only if at least one was new.
    pub fn add_chars(&mut self, chars: impl IntoIterator<Item = char>) -> usize {
        let added = self.table.add_chars(chars);
        if added > 0 {
            self.invalidate();
        }
        added
    }

    /// Remove characters; invalidates only if at least one was present.
    pub fn remove_chars(&mut self, chars: impl IntoIterator<Item = char>) -> usize {
        let removed = self.table.remove_chars(chars);
        if removed > 0 {
            self.invalidate();
        }
        removed
    }

    /// Converted grid for the current inputs, computed at most once per
    /// input state.
    ///
    /// # Errors
    /// Returns [`CoreError::NoImage`], [`CoreError::EmptyCharset`] or
    /// [`CoreError::InvalidResolution`]. Nothing is cached on failure.
    pub fn convert(&mut self) -> Result<Arc<CharGrid>, CoreError> {
        if let Some(grid) = &self.cached {
            return Ok(Arc::clone(grid));
        }
        let image = self.image.as_ref().ok_or(CoreError::NoImage)?;
        let grid = Arc::new(render(image, self.resolution, &self.table, self.invert)?);
        self.conversions += 1;
        log::debug!(
            "Conversion #{} : {}×{} caractères",
            self.conversions,
            grid.width(),
            grid.height()
        );
        self.cached = Some(Arc::clone(&grid));
        Ok(grid)
    }
}

impl<R> ConversionEngine<R> {
    fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            log::trace!("Cache de conversion invalidé");
        }
    }

    /// The live charset.
    #[must_use]
    pub fn table(&self) -> &GlyphBrightnessTable<R> {
        &self.table
    }

    /// Current image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<RasterImage>> {
        self.image.as_ref()
    }

    /// Current column count.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Whether brightness is inverted.
    #[must_use]
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Padded canvas size of the current image.
    #[must_use]
    pub fn padded_size(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| {
            let padded = PaddedImage::new(img);
            (padded.width(), padded.height())
        })
    }

    /// Whether a valid result is cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Number of conversions actually computed.
    #[must_use]
    pub fn conversions(&self) -> u64 {
        self.conversions
    }
}

#[cfg(test)]
mod tests {
    use at_core::frame::Sample;

    use super::*;

    type Fixed = fn(char) -> f64;

    fn two_tone(ch: char) -> f64 {
        if ch == 'a' { 0.1 } else { 0.9 }
    }

    fn engine(resolution: u32) -> ConversionEngine<Fixed> {
        let table = GlyphBrightnessTable::new(two_tone as Fixed);
        let mut engine = ConversionEngine::new(table, resolution);
        engine.add_chars(['a', 'b']);
        engine
    }

    fn halves(width: u32, height: u32) -> Arc<RasterImage> {
        Arc::new(
            RasterImage::from_fn(width, height, |_, col| {
                if col < width / 2 { Sample::BLACK } else { Sample::WHITE }
            })
            .unwrap(),
        )
    }

    #[test]
    fn maps_dark_and_light_cells() {
        let mut engine = engine(2);
        engine.set_image(halves(8, 8));
        let grid = engine.convert().unwrap();
        assert_eq!(grid.to_string(), "ab\nab");
    }

    #[test]
    fn invert_swaps_the_mapping() {
        let mut engine = engine(2);
        engine.set_image(halves(8, 8));
        assert!(engine.set_invert(true));
        assert_eq!(engine.convert().unwrap().to_string(), "ba\nba");
        assert!(!engine.set_invert(true));
    }

    #[test]
    fn padding_reads_as_white() {
        let mut engine = engine(16);
        engine.set_image(Arc::new(RasterImage::filled(10, 7, Sample::BLACK).unwrap()));
        let grid = engine.convert().unwrap();
        assert_eq!((grid.width(), grid.height()), (16, 8));
        assert_eq!(grid.lines()[0], "bbbaaaaaaaaaabbb");
        assert_eq!(grid.lines()[7], "bbbbbbbbbbbbbbbb");
    }

    #[test]
    fn repeated_convert_hits_the_cache() {
        let mut engine = engine(4);
        engine.set_image(halves(16, 8));
        let first = engine.convert().unwrap();
        let second = engine.convert().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.conversions(), 1);
    }

    #[test]
    fn resolution_change_invalidates() {
        let mut engine = engine(8);
        engine.set_image(halves(16, 8));
        let at_8 = engine.convert().unwrap();
        assert!(engine.set_resolution(16).unwrap());
        assert!(!engine.is_cached());
        let at_16 = engine.convert().unwrap();
        assert_eq!(at_16.width(), at_8.width() * 2);
        assert!(!Arc::ptr_eq(&at_8, &at_16));
        assert_eq!(engine.conversions(), 2);
    }

    #[test]
    fn no_op_mutations_keep_the_cache() {
        let mut engine = engine(8);
        engine.set_image(halves(16, 8));
        let first = engine.convert().unwrap();

        assert!(!engine.set_resolution(8).unwrap());
        assert!(!engine.add_char('a'));
        assert!(!engine.remove_char('z'));
        let image = Arc::clone(engine.image().unwrap());
        assert!(!engine.set_image(image));

        assert!(Arc::ptr_eq(&first, &engine.convert().unwrap()));
        assert_eq!(engine.conversions(), 1);
    }

    #[test]
    fn charset_and_image_changes_invalidate() {
        let mut engine = engine(8);
        engine.set_image(halves(16, 8));
        engine.convert().unwrap();

        assert!(engine.add_char('c'));
        assert!(!engine.is_cached());
        engine.convert().unwrap();

        assert!(engine.remove_char('c'));
        assert!(!engine.is_cached());
        engine.convert().unwrap();

        assert!(engine.set_image(halves(16, 8)));
        assert!(!engine.is_cached());
        engine.convert().unwrap();
        assert_eq!(engine.conversions(), 4);
    }

    #[test]
    fn invalid_resolution_leaves_state_untouched() {
        let mut engine = engine(8);
        engine.set_image(halves(10, 7));
        let cached = engine.convert().unwrap();
        for bad in [0, 3, 12, 32] {
            assert!(matches!(
                engine.set_resolution(bad),
                Err(CoreError::InvalidResolution { .. })
            ));
        }
        assert_eq!(engine.resolution(), 8);
        assert!(Arc::ptr_eq(&cached, &engine.convert().unwrap()));
    }

    #[test]
    fn stale_resolution_is_reported_at_convert() {
        let mut engine = engine(16);
        engine.set_image(halves(8, 8));
        assert!(matches!(
            engine.convert(),
            Err(CoreError::InvalidResolution { resolution: 16, .. })
        ));
        assert!(!engine.is_cached());
    }

    #[test]
    fn empty_charset_and_missing_image_are_errors() {
        let mut engine = engine(4);
        assert_eq!(engine.convert(), Err(CoreError::NoImage));
        engine.set_image(halves(16, 16));
        engine.remove_chars(['a', 'b']);
        assert_eq!(engine.convert(), Err(CoreError::EmptyCharset));
        assert_eq!(engine.conversions(), 0);
    }

    #[test]
    fn free_convert_matches_the_engine() {
        let image = halves(16, 8);
        let mut engine = engine(8);
        engine.set_image(Arc::clone(&image));
        let direct = convert(&image, 8, engine.table()).unwrap();
        assert_eq!(*engine.convert().unwrap(), direct);
    }
}
