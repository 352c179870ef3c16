pub mod event;
pub mod image;
pub mod outcome;

pub use event::*;
pub use image::*;
pub use outcome::*;
