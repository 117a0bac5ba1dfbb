mod config;
mod executor;

pub use config::RuntimeConfig;
pub use executor::Runtime;

use thiserror::Error;

use crate::vm::VmError;

/// Error type for runtime operations
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vm(#[from] VmError),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
