//! Public sprite-layer facade: host collaborator traits, configuration, and
//! the single `SpriteLayer` entry point.

mod config;
mod error;
mod hosts;
mod layer;
mod tracking;

pub use config::{DebugFlags, MagFilter, MinFilter, SpriteLayerConfig, SpriteScalingOptions, TextureFilteringOptions};
pub use error::SpriteLayerError;
pub use hosts::{CalculationHost, GraphicsContext, HostMap, PointerSource, ProjectionHost};
pub use layer::SpriteLayer;
pub use tracking::SpriteTracking;
