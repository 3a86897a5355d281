pub mod buffers;
pub mod context;
#[cfg(feature = "glow")]
pub mod glow_device;
pub mod pipeline;
pub mod recording;

pub use buffers::*;
pub use context::*;
pub use pipeline::*;
