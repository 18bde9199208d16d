use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposureError {
    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("Invalid state descriptor '{name}': {problems:?}")]
    InvalidDescriptor { name: String, problems: Vec<String> },

    #[error("Handle range collision: '{subsystem}' [{base}, {end}) overlaps '{other}'")]
    IdCollision {
        subsystem: String,
        other: String,
        base: u32,
        end: u32,
    },

    #[error("Unknown actor: {0:?}")]
    UnknownActor(crate::core::types::ActorId),

    #[error("Unknown handle: {0}")]
    UnknownHandle(u32),

    #[error("Descriptor file error: {0}")]
    DescriptorFile(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ComposureError>;
