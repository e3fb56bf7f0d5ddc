use std::fmt;

use crate::error::CoreError;

/// Poids BT.709 en fixe (×10000). La somme vaut exactement 10000.
const LUMA_R: u64 = 2126;
const LUMA_G: u64 = 7152;
const LUMA_B: u64 = 722;

/// Luma maximale d'un pixel (blanc pur) dans l'échelle fixe.
pub const LUMA_SCALE: u64 = 10_000 * 255;

/// Un pixel RGB, 8 bits par canal.
///
/// # Example
/// ```
/// use at_core::frame::Sample;
/// assert_eq!(Sample::WHITE.luma(), at_core::frame::LUMA_SCALE);
/// assert_eq!(Sample::BLACK.luma(), 0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Sample {
    /// Pure white, maximum brightness.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Build a sample from its three channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Luma pondérée BT.709, échelle `[0, LUMA_SCALE]`.
    #[inline(always)]
    #[must_use]
    pub fn luma(self) -> u64 {
        u64::from(self.r) * LUMA_R + u64::from(self.g) * LUMA_G + u64::from(self.b) * LUMA_B
    }
}

/// Immutable row-major pixel grid.
///
/// Created once per loaded image and replaced wholesale, never mutated.
///
/// # Example
/// ```
/// use at_core::frame::{RasterImage, Sample};
/// let img = RasterImage::filled(4, 2, Sample::WHITE).unwrap();
/// assert_eq!(img.brightness(), 1.0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<Sample>,
}

impl RasterImage {
    /// Wrap a row-major pixel buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if a dimension is zero or
    /// `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Sample>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image of a single color.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if a dimension is zero.
    pub fn filled(width: u32, height: u32, sample: Sample) -> Result<Self, CoreError> {
        Self::new(width, height, vec![sample; width as usize * height as usize])
    }

    /// Build an image by evaluating `f(row, col)` for every pixel.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if a dimension is zero.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Sample,
    ) -> Result<Self, CoreError> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                pixels.push(f(row, col));
            }
        }
        Self::new(width, height, pixels)
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

    /// Pixel at (`row`, `col`).
    ///
    /// # Panics
    /// Panics if the coordinates are outside the image.
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, row: u32, col: u32) -> Sample {
        assert!(
            row < self.height && col < self.width,
            "pixel ({row}, {col}) hors de l'image {}×{}",
            self.width,
            self.height
        );
        self.pixels[row as usize * self.width as usize + col as usize]
    }

    /// Somme des lumas fixes d'un rectangle. Utilisé par les vues paddées.
    ///
    /// # Panics
    /// Panics if the rectangle is not fully inside the image.
    #[must_use]
    pub fn luma_sum(&self, row: u32, col: u32, height: u32, width: u32) -> u64 {
        assert!(
            row + height <= self.height && col + width <= self.width,
            "région ({row}, {col}, {height}×{width}) hors de l'image {}×{}",
            self.width,
            self.height
        );
        let stride = self.width as usize;
        (row as usize..(row + height) as usize)
            .map(|r| {
                let start = r * stride + col as usize;
                self.pixels[start..start + width as usize]
                    .iter()
                    .map(|s| s.luma())
                    .sum::<u64>()
            })
            .sum()
    }

    /// Average luma-weighted brightness of the whole image, in `[0, 1]`.
    ///
    /// All-white yields exactly 1.0, all-black exactly 0.0.
    #[must_use]
    pub fn brightness(&self) -> f64 {
        self.region_brightness(0, 0, self.height, self.width)
    }

    /// Average brightness of the rectangle starting at (`row`, `col`).
    ///
    /// # Panics
    /// Panics if the rectangle is empty or leaves the image.
    #[must_use]
    pub fn region_brightness(&self, row: u32, col: u32, height: u32, width: u32) -> f64 {
        assert!(height > 0 && width > 0, "région vide");
        let count = u64::from(height) * u64::from(width);
        luma_ratio(self.luma_sum(row, col, height, width), count)
    }
}

/// Convert an accumulated fixed-point luma sum over `count` pixels to `[0, 1]`.
#[inline(always)]
#[must_use]
pub fn luma_ratio(sum: u64, count: u64) -> f64 {
    debug_assert!(count > 0, "luma_ratio sur zéro pixel");
    sum as f64 / (LUMA_SCALE * count) as f64
}

/// Grille de sortie ASCII, row-major.
///
/// # Example
/// ```
/// use at_core::frame::CharGrid;
/// let mut grid = CharGrid::new(3, 2);
/// grid.set(1, 0, '@');
/// assert_eq!(grid.get(1, 0), '@');
/// assert_eq!(grid.to_string(), " @ \n   ");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharGrid {
    cells: Vec<char>,
    width: u32,
    height: u32,
}

impl CharGrid {
    /// Crée une grille remplie d'espaces.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: vec![' '; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wrap an already assembled row-major buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the buffer length does not
    /// match `width * height`.
    pub fn from_cells(width: u32, height: u32, cells: Vec<char>) -> Result<Self, CoreError> {
        if cells.len() != width as usize * height as usize {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set the cell at column `x`, row `y`.
    #[inline(always)]
    pub fn set(&mut self, x: u32, y: u32, ch: char) {
        self.cells[y as usize * self.width as usize + x as usize] = ch;
    }

    /// Cell at column `x`, row `y`.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> char {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.cells.chunks_exact(self.width.max(1) as usize)
    }

    /// Rows rendered as owned strings.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.rows().map(|row| row.iter().collect()).collect()
    }
}

impl fmt::Display for CharGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            for &ch in row {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_extremes_are_exact() {
        let white = RasterImage::filled(7, 3, Sample::WHITE).unwrap();
        let black = RasterImage::filled(7, 3, Sample::BLACK).unwrap();
        assert_eq!(white.brightness(), 1.0);
        assert_eq!(black.brightness(), 0.0);
    }

    #[test]
    fn brightness_uses_bt709_weights() {
        let red = RasterImage::filled(2, 2, Sample::new(255, 0, 0)).unwrap();
        let green = RasterImage::filled(2, 2, Sample::new(0, 255, 0)).unwrap();
        assert!((red.brightness() - 0.2126).abs() < 1e-12);
        assert!((green.brightness() - 0.7152).abs() < 1e-12);
    }

    #[test]
    fn region_brightness_averages_only_the_window() {
        // Moitié gauche noire, moitié droite blanche.
        let img = RasterImage::from_fn(4, 2, |_, col| {
            if col < 2 { Sample::BLACK } else { Sample::WHITE }
        })
        .unwrap();
        assert_eq!(img.region_brightness(0, 0, 2, 2), 0.0);
        assert_eq!(img.region_brightness(0, 2, 2, 2), 1.0);
        assert_eq!(img.brightness(), 0.5);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(
            RasterImage::new(0, 3, vec![]),
            Err(CoreError::InvalidDimensions {
                width: 0,
                height: 3
            })
        );
        assert!(RasterImage::new(2, 2, vec![Sample::BLACK; 3]).is_err());
    }

    #[test]
    #[should_panic(expected = "hors de l'image")]
    fn pixel_out_of_bounds_panics() {
        let img = RasterImage::filled(2, 2, Sample::BLACK).unwrap();
        let _ = img.pixel(2, 0);
    }

    #[test]
    fn char_grid_lines() {
        let grid = CharGrid::from_cells(2, 2, vec!['a', 'b', 'c', 'd']).unwrap();
        assert_eq!(grid.lines(), vec!["ab".to_string(), "cd".to_string()]);
        assert_eq!(grid.get(0, 1), 'c');
    }
}
