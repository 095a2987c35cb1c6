use thiserror::Error;

/// Errors related to creating, wrapping and restoring types.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum TypeError {
    #[error("Unsupported type shape for serializable wrapping: {0}")]
    UnsupportedType(String),
    #[error("Cannot find class: {0}")]
    ClassNotFound(String),
    #[error("Could not find original class structure: {member} in {declaring_class}")]
    StructureNotFound {
        declaring_class: String,
        member: String,
        #[source]
        source: Option<Box<TypeError>>,
    },
    #[error("Unsupported persisted type schema version {found} (supported: {supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    #[error("Invalid member reference: {0}")]
    InvalidMember(#[from] AssertionError),
}

/// Precondition violations reported by the [assert](crate::assert) helpers.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum AssertionError {
    #[error("{0}")]
    IllegalArgument(String),
    #[error("{0}")]
    IllegalState(String),
}
