//! Power-of-two padding and square partitioning of a source image.

use at_core::error::CoreError;
use at_core::frame::{LUMA_SCALE, RasterImage, Sample, luma_ratio};

/// Vue paddée d'une image source, centrée dans un canevas 2^n × 2^m.
///
/// Tout pixel hors de l'empreinte centrée de la source se lit en blanc pur.
/// Coordinates are `(row, col)`.
///
/// # Example
/// ```
/// use at_core::frame::{RasterImage, Sample};
/// use at_ascii::pad::PaddedImage;
///
/// let img = RasterImage::filled(10, 7, Sample::BLACK).unwrap();
/// let padded = PaddedImage::new(&img);
/// assert_eq!((padded.width(), padded.height()), (16, 8));
/// assert_eq!((padded.row_padding(), padded.col_padding()), (0, 3));
/// assert_eq!(padded.get_pixel(0, 0), Sample::WHITE);
/// assert_eq!(padded.get_pixel(0, 3), Sample::BLACK);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PaddedImage<'a> {
    source: &'a RasterImage,
    width: u32,
    height: u32,
    row_padding: u32,
    col_padding: u32,
}

impl<'a> PaddedImage<'a> {
    /// Wrap `source` in its power-of-two canvas.
    #[must_use]
    pub fn new(source: &'a RasterImage) -> Self {
        let width = source.width().next_power_of_two();
        let height = source.height().next_power_of_two();
        Self {
            source,
            width,
            height,
            // Marge impaire : le pixel en trop va en bas / à droite.
            row_padding: (height - source.height()) / 2,
            col_padding: (width - source.width()) / 2,
        }
    }

    /// Padded width (power of two).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Padded height (power of two).
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// White rows above the source.
    #[must_use]
    pub fn row_padding(&self) -> u32 {
        self.row_padding
    }

    /// White columns left of the source.
    #[must_use]
    pub fn col_padding(&self) -> u32 {
        self.col_padding
    }

    /// The wrapped image.
    #[must_use]
    pub fn source(&self) -> &'a RasterImage {
        self.source
    }

    /// Pixel of the padded canvas.
    ///
    /// # Panics
    /// Panics if (`row`, `col`) is outside `[0, height) × [0, width)`. That is
    /// a partitioning bug, not a user error.
    #[must_use]
    pub fn get_pixel(&self, row: u32, col: u32) -> Sample {
        assert!(
            row < self.height && col < self.width,
            "accès ({row}, {col}) hors du canevas paddé {}×{}",
            self.width,
            self.height
        );
        let in_rows = (self.row_padding..self.row_padding + self.source.height()).contains(&row);
        let in_cols = (self.col_padding..self.col_padding + self.source.width()).contains(&col);
        if in_rows && in_cols {
            self.source
                .pixel(row - self.row_padding, col - self.col_padding)
        } else {
            Sample::WHITE
        }
    }

    /// Check `resolution` against this canvas and return the sub-image edge.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidResolution`] if the resolution is zero,
    /// exceeds the padded width, does not divide it, or would leave fewer than
    /// one row of square cells.
    pub fn cell_edge(&self, resolution: u32) -> Result<u32, CoreError> {
        if resolution == 0 {
            return Err(CoreError::resolution(resolution, "doit être positive"));
        }
        if resolution > self.width {
            return Err(CoreError::resolution(
                resolution,
                format!("dépasse la largeur paddée {}", self.width),
            ));
        }
        if self.width % resolution != 0 {
            return Err(CoreError::resolution(
                resolution,
                format!("ne divise pas la largeur paddée {}", self.width),
            ));
        }
        let edge = self.width / resolution;
        if edge > self.height {
            return Err(CoreError::resolution(
                resolution,
                format!(
                    "minimum {} pour un canevas {}×{}",
                    self.width / self.height,
                    self.width,
                    self.height
                ),
            ));
        }
        Ok(edge)
    }

    /// Split the canvas into `resolution` columns of square sub-images.
    ///
    /// The cells are row-major and tile the canvas exactly.
    ///
    /// # Errors
    /// Propagates [`PaddedImage::cell_edge`] failures.
    pub fn partition(&self, resolution: u32) -> Result<Partition<'a>, CoreError> {
        let edge = self.cell_edge(resolution)?;
        let rows = self.height / edge;
        let mut cells = Vec::with_capacity(rows as usize * resolution as usize);
        for r in 0..rows {
            for c in 0..resolution {
                cells.push(SubImage {
                    canvas: *self,
                    row: r * edge,
                    col: c * edge,
                    edge,
                });
            }
        }
        log::trace!(
            "Partition {}×{} → {rows}×{resolution} cellules de {edge}px",
            self.width,
            self.height
        );
        Ok(Partition {
            cells,
            rows,
            cols: resolution,
            edge,
        })
    }

    /// Luma sum of a canvas rectangle; padding pixels count as white.
    fn window_luma_sum(&self, row: u32, col: u32, height: u32, width: u32) -> u64 {
        let src_rows = (self.row_padding, self.row_padding + self.source.height());
        let src_cols = (self.col_padding, self.col_padding + self.source.width());

        let r_lo = row.max(src_rows.0);
        let r_hi = (row + height).min(src_rows.1);
        let c_lo = col.max(src_cols.0);
        let c_hi = (col + width).min(src_cols.1);

        let total = u64::from(height) * u64::from(width);
        if r_lo >= r_hi || c_lo >= c_hi {
            return total * LUMA_SCALE;
        }

        let inner_h = r_hi - r_lo;
        let inner_w = c_hi - c_lo;
        let inner = self.source.luma_sum(
            r_lo - self.row_padding,
            c_lo - self.col_padding,
            inner_h,
            inner_w,
        );
        let white = total - u64::from(inner_h) * u64::from(inner_w);
        inner + white * LUMA_SCALE
    }
}

/// Square read-only window over a padded canvas.
#[derive(Clone, Copy, Debug)]
pub struct SubImage<'a> {
    canvas: PaddedImage<'a>,
    row: u32,
    col: u32,
    edge: u32,
}

impl SubImage<'_> {
    /// Top row of the window in canvas coordinates.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Left column of the window in canvas coordinates.
    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Side length in pixels.
    #[must_use]
    pub fn edge(&self) -> u32 {
        self.edge
    }

    /// Pixel at window-local (`row`, `col`).
    ///
    /// # Panics
    /// Panics if the coordinates leave the window.
    #[must_use]
    pub fn get_pixel(&self, row: u32, col: u32) -> Sample {
        assert!(row < self.edge && col < self.edge, "accès hors de la cellule");
        self.canvas.get_pixel(self.row + row, self.col + col)
    }

    /// Average brightness of the window in `[0, 1]`.
    #[must_use]
    pub fn brightness(&self) -> f64 {
        let sum = self
            .canvas
            .window_luma_sum(self.row, self.col, self.edge, self.edge);
        luma_ratio(sum, u64::from(self.edge) * u64::from(self.edge))
    }
}

/// Row-major grid of sub-images produced by [`PaddedImage::partition`].
#[derive(Clone, Debug)]
pub struct Partition<'a> {
    cells: Vec<SubImage<'a>>,
    rows: u32,
    cols: u32,
    edge: u32,
}

impl<'a> Partition<'a> {
    /// Number of cell rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cell columns (the requested resolution).
    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Cell side length in pixels.
    #[must_use]
    pub fn edge(&self) -> u32 {
        self.edge
    }

    /// All cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[SubImage<'a>] {
        &self.cells
    }

    /// Cell at (`row`, `col`) of the grid.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<&SubImage<'a>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get((row * self.cols + col) as usize)
    }
}
