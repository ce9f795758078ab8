//! `Channel<T>` interpolation primitives: commit/step/clear/invalidate over a
//! pausable virtual clock, plus the compound types (`Location`, `Angle`) the
//! render pipeline interpolates.

mod channel;
mod clock;
mod interpolable;
mod opacity;

pub use channel::{Channel, ChannelOptions, InterpolationMode};
pub use clock::VirtualInstant;
pub use interpolable::{Angle, Interpolable, Location};
pub use opacity::OpacityChannel;
