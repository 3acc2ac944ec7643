//! Colour channels of the Leddy Slim Link controller.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

/// The three colour channels driven by the controller, in device order.
///
/// The strum name is the option key used in forms and persisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr)]
pub enum Channel {
    #[strum(serialize = "color_red")]
    Red,
    #[strum(serialize = "color_blue")]
    Blue,
    #[strum(serialize = "color_white")]
    White,
}

/// User-configured ceiling of a colour channel, 1 to 200.
///
/// The lower bound keeps brightness derivation free of divisions by zero.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "i64", into = "i64")]
pub struct ChannelMax {
    value: u8,
}

impl ChannelMax {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 200;
    pub const DEFAULT: u8 = 100;

    pub fn new() -> Self {
        ChannelMax {
            value: Self::DEFAULT,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (1-200).
    ///
    /// # Examples
    ///
    /// ```
    /// use aquael_rs::ChannelMax;
    ///
    /// assert!(ChannelMax::create(0).is_none());
    /// assert_eq!(ChannelMax::create(1).unwrap().value(), 1);
    /// assert_eq!(ChannelMax::create(200).unwrap().value(), 200);
    /// assert!(ChannelMax::create(201).is_none());
    /// ```
    pub fn create(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Some(ChannelMax { value: value as u8 })
        } else {
            None
        }
    }

    /// Returns default (100) if value is invalid.
    pub fn create_or(value: i64) -> Self {
        Self::create(value).unwrap_or_default()
    }
}

impl Default for ChannelMax {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<i64> for ChannelMax {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        ChannelMax::create(value).ok_or_else(|| {
            format!(
                "channel maximum {value} outside {}..={}",
                ChannelMax::MIN,
                ChannelMax::MAX
            )
        })
    }
}

impl From<ChannelMax> for i64 {
    fn from(max: ChannelMax) -> Self {
        i64::from(max.value)
    }
}

/// Per-channel maxima configured through the options flow.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelOptions {
    #[serde(rename = "color_red", default)]
    pub red: ChannelMax,
    #[serde(rename = "color_blue", default)]
    pub blue: ChannelMax,
    #[serde(rename = "color_white", default)]
    pub white: ChannelMax,
}

impl ChannelOptions {
    pub fn new(red: ChannelMax, blue: ChannelMax, white: ChannelMax) -> Self {
        Self { red, blue, white }
    }

    pub fn get(&self, channel: Channel) -> ChannelMax {
        match channel {
            Channel::Red => self.red,
            Channel::Blue => self.blue,
            Channel::White => self.white,
        }
    }

    pub fn set(&mut self, channel: Channel, max: ChannelMax) {
        match channel {
            Channel::Red => self.red = max,
            Channel::Blue => self.blue = max,
            Channel::White => self.white = max,
        }
    }

    /// Maxima in device order (red, blue, white).
    pub fn values(&self) -> [u8; 3] {
        [self.red.value(), self.blue.value(), self.white.value()]
    }
}

/// Channel levels as reported by the device, in device order.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLevels {
    pub red: u8,
    pub blue: u8,
    pub white: u8,
}

impl ChannelLevels {
    pub fn new(red: u8, blue: u8, white: u8) -> Self {
        Self { red, blue, white }
    }

    pub fn get(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Blue => self.blue,
            Channel::White => self.white,
        }
    }

    /// Iterate `(channel, level)` pairs in device order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, u8)> + '_ {
        Channel::iter().map(move |c| (c, self.get(c)))
    }
}

impl From<[u8; 3]> for ChannelLevels {
    fn from(colors: [u8; 3]) -> Self {
        ChannelLevels::new(colors[0], colors[1], colors[2])
    }
}
