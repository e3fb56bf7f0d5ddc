use std::path::Path;

use anyhow::{Context, Result};
use at_core::frame::{RasterImage, Sample};
use at_core::traits::ImageLoader;
use image::{DynamicImage, RgbaImage};

/// Chargeur d'images depuis le disque (PNG, JPEG, BMP, GIF).
///
/// La transparence est composée sur fond blanc, la couleur du padding.
///
/// # Example
/// ```no_run
/// use at_core::traits::ImageLoader;
/// use at_source::image::ImageFileLoader;
/// use std::path::Path;
/// let image = ImageFileLoader.load(Path::new("photo.png")).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<RasterImage> {
        let img = image::open(path)
            .with_context(|| format!("Impossible de charger {}", path.display()))?;
        let raster = from_dynamic(&img)?;
        log::info!(
            "Image chargée : {} ({}×{})",
            path.display(),
            raster.width(),
            raster.height()
        );
        Ok(raster)
    }
}

/// Convenance : charge une image via [`ImageFileLoader`].
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &str) -> Result<RasterImage> {
    ImageFileLoader.load(Path::new(path))
}

/// Convert a decoded image, compositing alpha over white.
///
/// # Errors
/// Returns an error if the image has a zero dimension.
pub fn from_dynamic(img: &DynamicImage) -> Result<RasterImage> {
    from_rgba(&img.to_rgba8())
}

fn from_rgba(rgba: &RgbaImage) -> Result<RasterImage> {
    let (width, height) = rgba.dimensions();
    let pixels = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            Sample::new(over_white(r, a), over_white(g, a), over_white(b, a))
        })
        .collect();
    Ok(RasterImage::new(width, height, pixels)?)
}

#[inline(always)]
fn over_white(channel: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(channel) * a + 255 * (255 - a) + 127) / 255) as u8
}
