pub mod error;
pub mod layer;
pub mod points;
pub mod shaders;
pub mod symbology;

pub use error::*;
pub use layer::*;
pub use points::*;
