use gpu::DeviceError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("coordinate buffer has odd length {0}; expected [lng, lat] pairs")]
    OddCoordinateLength(usize),
    #[error("{count} points exceed the per-layer limit of {max}")]
    TooManyPoints { count: usize, max: usize },
    #[error("layer is already bound to a device context")]
    AlreadyBound,
}
