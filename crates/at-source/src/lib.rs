/// Image sources for asciitile.

pub mod image;

pub use self::image::{ImageFileLoader, load_image};
