//! Brightness as shown to the automation host.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::channel::{Channel, ChannelLevels, ChannelOptions};

/// Brightness level from 0 to 255.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Brightness {
    pub const MAX: u8 = 255;

    /// Full brightness, used when a turn-on request carries none.
    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn create(value: u8) -> Self {
        Brightness { value }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Derive the displayed brightness from observed channel levels.
    ///
    /// Each channel contributes `level / max`; the smallest ratio limits the
    /// result, which is scaled to 255 and clamped there. Levels above their
    /// maximum are not clamped before scaling. Fractions are truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use aquael_rs::{Brightness, ChannelLevels, ChannelMax, ChannelOptions};
    ///
    /// let options = ChannelOptions::new(
    ///     ChannelMax::create(100).unwrap(),
    ///     ChannelMax::create(150).unwrap(),
    ///     ChannelMax::create(200).unwrap(),
    /// );
    /// let levels = ChannelLevels::new(50, 150, 100);
    /// assert_eq!(Brightness::derive(&levels, &options).value(), 127);
    /// ```
    pub fn derive(levels: &ChannelLevels, options: &ChannelOptions) -> Self {
        // floor(min(l/m) * 255) == min(floor(l * 255 / m)), kept in integers.
        let scaled = Channel::iter()
            .map(|c| u32::from(levels.get(c)) * 255 / u32::from(options.get(c).value()))
            .min()
            .unwrap_or(0);

        Brightness {
            value: scaled.min(u32::from(Self::MAX)) as u8,
        }
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Brightness::create(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelMax;

    fn options(red: i64, blue: i64, white: i64) -> ChannelOptions {
        ChannelOptions::new(
            ChannelMax::create(red).unwrap(),
            ChannelMax::create(blue).unwrap(),
            ChannelMax::create(white).unwrap(),
        )
    }

    #[test]
    fn test_limited_by_weakest_channel() {
        let levels = ChannelLevels::new(50, 150, 100);
        assert_eq!(Brightness::derive(&levels, &options(100, 150, 200)).value(), 127);
    }

    #[test]
    fn test_all_channels_at_max() {
        let levels = ChannelLevels::new(100, 150, 200);
        assert_eq!(Brightness::derive(&levels, &options(100, 150, 200)).value(), 255);
    }

    #[test]
    fn test_any_dark_channel_forces_zero() {
        let opts = options(100, 100, 100);
        assert_eq!(Brightness::derive(&ChannelLevels::new(0, 100, 100), &opts).value(), 0);
        assert_eq!(Brightness::derive(&ChannelLevels::new(100, 0, 100), &opts).value(), 0);
        assert_eq!(Brightness::derive(&ChannelLevels::new(100, 100, 0), &opts).value(), 0);
    }

    #[test]
    fn test_overdriven_channels_clamp_at_max() {
        let levels = ChannelLevels::new(255, 255, 255);
        assert_eq!(Brightness::derive(&levels, &options(1, 1, 1)).value(), 255);
    }

    #[test]
    fn test_overdriven_channel_does_not_lift_weaker_one() {
        // red is 2x its max but white at 1/4 still limits the result
        let levels = ChannelLevels::new(200, 100, 25);
        assert_eq!(Brightness::derive(&levels, &options(100, 100, 100)).value(), 63);
    }

    #[test]
    fn test_always_within_range() {
        for max in [1, 7, 100, 199, 200] {
            for level in [0u8, 1, 99, 100, 200, 255] {
                let levels = ChannelLevels::new(level, level, level);
                let value = Brightness::derive(&levels, &options(max, max, max)).value();
                let expected = (u32::from(level) * 255 / max as u32).min(255) as u8;
                assert_eq!(value, expected);
            }
        }
    }
}
