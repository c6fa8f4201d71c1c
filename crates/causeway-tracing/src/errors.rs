use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tracing dispatch already initialized")]
    AlreadyInitialized,
    #[error("Ring capacity cannot be zero")]
    InvalidRingCapacity,
    #[error("Failed to spawn the assembly worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
