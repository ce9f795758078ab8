use sprite_atlas::{AtlasManagerError, RegistryError};
use sprite_glyph::RasterizeError;
use sprite_store::MutationError;

/// Composed from every subsystem's own error type via `From`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteLayerError {
    InvalidImage,
    Duplicate,
    InvalidOrigin,
    Cancelled,
    ProjectionUnavailable,
    ResourceExhaustion,
}

impl From<MutationError> for SpriteLayerError {
    fn from(error: MutationError) -> Self {
        match error {
            MutationError::Duplicate => SpriteLayerError::Duplicate,
            MutationError::InvalidOrigin(_) => SpriteLayerError::InvalidOrigin,
        }
    }
}

impl From<RegistryError> for SpriteLayerError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::Duplicate => SpriteLayerError::Duplicate,
        }
    }
}

impl From<AtlasManagerError> for SpriteLayerError {
    fn from(error: AtlasManagerError) -> Self {
        match error {
            AtlasManagerError::ResourceExhaustion => SpriteLayerError::ResourceExhaustion,
        }
    }
}

impl From<RasterizeError> for SpriteLayerError {
    fn from(error: RasterizeError) -> Self {
        match error {
            RasterizeError::Failed => SpriteLayerError::InvalidImage,
        }
    }
}
