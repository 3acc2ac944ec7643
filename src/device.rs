//! Interface of the device-control library.
//!
//! The Leddy Slim Link wire protocol lives outside this crate. Anything that
//! can talk to the controller plugs in by implementing [`Device`] for one
//! controller handle and [`Connector`] to create handles from a host address.

use std::future::Future;

use crate::errors::DeviceError;
use crate::types::ChannelLevels;

type Result<T> = std::result::Result<T, DeviceError>;

/// A handle to a single Aquael light controller.
///
/// The readable state (`is_on`, `brightness`, `colors`) reflects the last
/// successful [`Device::update`]; it is never refreshed implicitly.
pub trait Device: Send {
    /// Host name or address the handle talks to.
    fn host(&self) -> &str;

    /// Check that the controller answers.
    fn test_connection(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Human readable name stored on the controller.
    fn get_name(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Hardware address of the controller, in any common MAC notation.
    fn get_mac_address(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Fetch fresh state from the controller.
    fn update(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Set the channels to the given absolute levels and switch on.
    fn turn_on(&mut self, red: u8, blue: u8, white: u8) -> impl Future<Output = Result<()>> + Send;

    /// Switch the controller off.
    fn turn_off(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn is_on(&self) -> bool;

    /// Brightness hint last reported by, or stored on, the handle.
    fn brightness(&self) -> Option<u8>;

    /// Store a brightness hint on the handle. No command is sent.
    fn set_brightness(&mut self, brightness: u8);

    /// Channel levels in device order (red, blue, white).
    fn colors(&self) -> ChannelLevels;
}

/// Creates [`Device`] handles for host addresses.
pub trait Connector: Send + Sync {
    type Device: Device + 'static;

    /// Build a handle for `host`. No traffic is sent until the first call on it.
    fn connect(&self, host: &str) -> Self::Device;
}
