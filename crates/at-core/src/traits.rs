use std::path::Path;

use crate::frame::{CharGrid, RasterImage};

/// Fournit une image raster à partir d'un chemin.
///
/// Implémenté par : `ImageFileLoader`.
///
/// # Example
/// ```
/// use at_core::traits::ImageLoader;
/// use at_core::frame::{RasterImage, Sample};
/// use std::path::Path;
///
/// struct Solid;
/// impl ImageLoader for Solid {
///     fn load(&self, _path: &Path) -> anyhow::Result<RasterImage> {
///         Ok(RasterImage::filled(1, 1, Sample::WHITE)?)
///     }
/// }
/// assert_eq!(Solid.load(Path::new("x")).unwrap().width(), 1);
/// ```
pub trait ImageLoader {
    /// Décode l'image située à `path`.
    ///
    /// # Errors
    /// Returns an error if the file is missing or cannot be decoded.
    fn load(&self, path: &Path) -> anyhow::Result<RasterImage>;
}

/// Consomme une grille de caractères terminée.
///
/// Implémenté par : `TextSink`, `HtmlSink`.
pub trait GridSink {
    /// Rend la grille vers la destination du sink.
    ///
    /// # Errors
    /// Returns an error if the destination cannot be written.
    fn write_grid(&mut self, grid: &CharGrid) -> anyhow::Result<()>;
}
