//! Value types for channel configuration and brightness.

mod brightness;
mod channel;

pub use brightness::Brightness;
pub use channel::{Channel, ChannelLevels, ChannelMax, ChannelOptions};
