pub mod capitals;

pub use capitals::*;
