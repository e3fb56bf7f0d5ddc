/// ASCII conversion engine for asciitile.
///
/// Pads an image to a power-of-two canvas, partitions it into square cells,
/// and maps each cell to the glyph of nearest ink coverage.
pub mod engine;
pub mod glyph;
pub mod pad;
pub mod table;

pub use engine::{ConversionEngine, convert};
pub use glyph::{GlyphCoverage, GlyphRasterizer};
pub use pad::{PaddedImage, Partition, SubImage};
pub use table::{Glyph, GlyphBrightnessTable};
