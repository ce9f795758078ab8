use crate::manager::AtlasManagerError;
use crate::registry::RegistryError;

/// Errors surfaced to a caller awaiting an enqueued atlas operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasOpError {
    /// Superseded by a later operation on the same image before it ran, or
    /// the queue was cleared while the operation was still pending.
    Cancelled,
    ResourceExhaustion,
    Duplicate,
}

impl From<AtlasManagerError> for AtlasOpError {
    fn from(error: AtlasManagerError) -> Self {
        match error {
            AtlasManagerError::ResourceExhaustion => AtlasOpError::ResourceExhaustion,
        }
    }
}

impl From<RegistryError> for AtlasOpError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::Duplicate => AtlasOpError::Duplicate,
        }
    }
}
