//! Error kinds shared by every container and policy combination.

/// Failure of a container operation.
///
/// Every fallible operation returns one of these directly; the container
/// is left exactly as it was before the failing call.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Error {
    /// The key was rejected by its policy (e.g. its referent is gone).
    #[error("key is invalid")]
    KeyIsInvalid,
    /// The value was rejected by its policy.
    #[error("value is invalid")]
    ValueIsInvalid,
    /// A set item was rejected by its policy.
    #[error("item is invalid")]
    ItemIsInvalid,
    #[error("memory allocation failed")]
    MemoryAllocationFailed,
    #[error("key already exists")]
    KeyAlreadyExists,
    #[error("key not found")]
    KeyNotFound,
    #[error("item not found")]
    ItemNotFound,
    #[error("map is empty")]
    MapIsEmpty,
    #[error("set is empty")]
    SetIsEmpty,
    /// The cursor's entry was removed, or the cursor belongs to another container.
    #[error("entry is invalid")]
    EntryIsInvalid,
    /// No successor/predecessor past the cursor.
    #[error("end of sequence")]
    EndOfSequence,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    /// Rename map-flavored kinds to their set counterparts.
    pub(crate) fn into_set_error(self) -> Self {
        match self {
            Error::KeyIsInvalid => Error::ItemIsInvalid,
            Error::KeyNotFound => Error::ItemNotFound,
            Error::MapIsEmpty => Error::SetIsEmpty,
            other => other,
        }
    }
}
