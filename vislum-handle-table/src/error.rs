use thiserror::Error;

use crate::id::{IntoRawResourceId, RawResourceId};
use crate::resource::CloseError;

/// A resource ID is invalid, missing or refers to a resource of another type.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid resource ID '{rid}'")]
pub struct BadResourceId {
    rid: RawResourceId,
}

impl BadResourceId {
    #[inline]
    pub fn new(rid: impl IntoRawResourceId) -> Self {
        Self {
            rid: rid.into_raw_resource_id(),
        }
    }

    /// The offending resource ID.
    #[inline]
    pub fn rid(&self) -> RawResourceId {
        self.rid
    }
}

/// Every resource ID is taken.
///
/// There are more live resources than the ID space can hold. This is not an
/// operational error and [`ResourceTable::add`](crate::ResourceTable::add) panics on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no available resource IDs (max ID {max_id})")]
pub struct IdSpaceExhausted {
    pub max_id: u64,
}

#[derive(Debug, Error)]
pub enum RemoveError {
    #[error(transparent)]
    BadResourceId(#[from] BadResourceId),
    /// The resource was removed, but its close operation failed.
    #[error(transparent)]
    Close(CloseError),
}

impl RemoveError {
    /// Returns the close failure, if that is what this error is.
    pub fn into_close_error(self) -> Option<CloseError> {
        match self {
            Self::Close(err) => Some(err),
            Self::BadResourceId(_) => None,
        }
    }
}
