//! # aquael_rs
//!
//! Async glue for running Aquael Leddy Slim Link aquarium lights under a
//! home-automation host.
//!
//! The crate does not speak the controller's wire protocol. A device library
//! plugs in through the [`Device`] and [`Connector`] traits, and this crate
//! provides everything around it:
//!
//! - **Setup flow**: [`ConfigFlow`] probes a host, reads the controller's name
//!   and MAC address, and stores a [`ConfigEntry`] keyed by the normalized MAC
//! - **Options flow**: [`OptionsFlow`] edits the red, blue and white channel
//!   maxima (1-200) used when turning the light on
//! - **Light entity**: [`LightEntity`] polls the controller and derives one
//!   [`Brightness`] from the three channel levels
//! - **Lifecycle**: [`Integration`] sets up, reloads and unloads entries and
//!   can poll lights on an interval through a [`Poller`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use aquael_rs::{ConfigEntries, HostInput, Integration, Logger, SCAN_INTERVAL};
//!
//! async fn add_light(connector: impl aquael_rs::Connector) -> Result<(), aquael_rs::Error> {
//!     let path = std::path::Path::new("aquael.json");
//!     let mut integration = Integration::new(connector, ConfigEntries::load(path)?, Logger::global())
//!         .with_poll_interval(SCAN_INTERVAL);
//!
//!     let mut flow = integration.config_flow();
//!     let result = integration
//!         .submit_config_flow(&mut flow, Some(HostInput::new("192.168.1.40")))
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&result).unwrap());
//!
//!     integration.entries().save(path)
//! }
//! ```
//!
//! ## Brightness
//!
//! The controller reports absolute channel levels. The displayed brightness is
//! the smallest `level / maximum` ratio over the three channels, scaled to 255
//! and truncated. Turning on always sends the configured maxima; a requested
//! brightness is passed to the device handle as a hint only.
//!
//! ## Runtime Selection
//!
//! This library is runtime-agnostic. Select your preferred runtime using feature flags:
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod config_flow;
mod device;
mod entry;
mod errors;
mod form;
mod history;
mod identity;
mod integration;
mod light;
pub mod logging;
mod poller;
pub mod runtime;
#[cfg(test)]
mod testing;
mod types;

// Re-export public API
pub use config_flow::{
    ABORT_ALREADY_CONFIGURED, ABORT_FLOW_FINISHED, CONNECT_TIMEOUT, ConfigFlow, ERROR_CONNECTION,
    ERROR_OUT_OF_RANGE, ERROR_REQUIRED, ERROR_UNKNOWN, FlowState, HostInput, OptionsFlow,
    OptionsInput, STEP_INIT, STEP_USER,
};
pub use device::{Connector, Device};
pub use entry::{ConfigEntries, ConfigEntry, EntryData, EntryState};
pub use errors::{DeviceError, Error};
pub use form::{BASE_ERROR, Field, FieldKind, FlowResult, Form};
pub use history::{EventHistory, EventKind, EventOutcome, HistoryEntry, HistorySummary};
pub use identity::{DeviceId, format_mac};
pub use integration::Integration;
pub use light::{Availability, ColorMode, LightEntity, UPDATE_TIMEOUT};
pub use logging::Logger;
pub use poller::{Poller, SCAN_INTERVAL, SharedLight};
pub use types::{Brightness, Channel, ChannelLevels, ChannelMax, ChannelOptions};
