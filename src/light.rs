//! Light entity backed by one Leddy Slim Link controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config_flow::CONNECT_TIMEOUT;
use crate::device::{Connector, Device};
use crate::entry::ConfigEntry;
use crate::errors::{DeviceError, Error};
use crate::history::{EventHistory, EventKind, EventOutcome};
use crate::identity::DeviceId;
use crate::logging::Logger;
use crate::runtime;
use crate::types::{Brightness, ChannelLevels, ChannelOptions};

type Result<T> = std::result::Result<T, Error>;

/// Upper bound for a single poll or command.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Colour modes a light entity can expose. Only brightness is supported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Brightness,
}

/// Reachability of the device as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// No state has been read yet.
    Uninitialized,
    Ready,
    /// The last poll timed out.
    Unavailable,
}

/// Adapter between the host's light model and an Aquael controller.
///
/// Reads map the three channel levels onto one brightness value. Turning on
/// always drives the channels to their configured maxima; the requested
/// brightness is only stored on the device handle as a hint.
pub struct LightEntity<D: Device> {
    device: D,
    options: ChannelOptions,
    name: String,
    unique_id: String,
    entity_id: String,
    is_on: bool,
    brightness: Option<Brightness>,
    availability: Availability,
    history: EventHistory,
    logger: Logger,
}

impl<D: Device> LightEntity<D> {
    /// Build the entity for an entry once the device answered.
    ///
    /// A device that times out or cannot be resolved yields
    /// [`Error::NotReady`]; the host should try again later.
    pub async fn setup<C>(entry: &ConfigEntry, connector: &C, logger: Logger) -> Result<Self>
    where
        C: Connector<Device = D>,
    {
        let data = entry.data();
        let mut device = connector.connect(&data.host);

        runtime::timeout(CONNECT_TIMEOUT, device.test_connection())
            .await
            .map_err(DeviceError::from)
            .and_then(|r| r)
            .map_err(|e| Error::setup(&data.host, e))?;

        let mut light = Self::new(device, &data.name, &data.device_id, *entry.options(), logger);
        light.availability = Availability::Ready;
        light.history.record(EventKind::Connect, EventOutcome::Success);
        Ok(light)
    }

    /// Wrap a device handle, seeding state from what the handle last saw.
    pub fn new(
        device: D,
        name: &str,
        device_id: &DeviceId,
        options: ChannelOptions,
        logger: Logger,
    ) -> Self {
        LightEntity {
            is_on: device.is_on(),
            brightness: device.brightness().map(Brightness::create),
            device,
            options,
            name: name.to_string(),
            unique_id: format!("{device_id}_light"),
            entity_id: format!("light.{}", slugify(name)),
            availability: Availability::Uninitialized,
            history: EventHistory::new(),
            logger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn host(&self) -> &str {
        self.device.host()
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.options
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// Unavailable only after a poll timed out.
    pub fn available(&self) -> bool {
        self.availability != Availability::Unavailable
    }

    pub fn color_mode(&self) -> ColorMode {
        ColorMode::Brightness
    }

    pub fn supported_color_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::Brightness]
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    /// Where this entity's records go.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Refresh state from the device.
    ///
    /// A timeout marks the entity unavailable and warns once per outage.
    /// Any other failure is logged and leaves everything as it was.
    pub async fn update(&mut self) {
        let result = runtime::timeout(UPDATE_TIMEOUT, self.device.update())
            .await
            .map_err(DeviceError::from)
            .and_then(|r| r);

        match result {
            Ok(()) => {}
            Err(DeviceError::Timeout) => {
                if self.available() {
                    self.logger
                        .warn(format_args!("Update timed out for {}", self.entity_id));
                }
                self.availability = Availability::Unavailable;
                self.history
                    .record_error(EventKind::Poll, EventOutcome::Timeout, "timed out");
                return;
            }
            Err(e) => {
                self.logger
                    .error(format_args!("Error while updating {}: {}", self.entity_id, e));
                self.history
                    .record_error(EventKind::Poll, EventOutcome::Failure, &e.to_string());
                return;
            }
        }

        self.availability = Availability::Ready;
        self.is_on = self.device.is_on();
        self.brightness = Some(self.compute_brightness());
        self.history.record(EventKind::Poll, EventOutcome::Success);
        self.logger.debug(format_args!(
            "{} polled: on={} brightness={:?}",
            self.entity_id, self.is_on, self.brightness
        ));
    }

    fn compute_brightness(&self) -> Brightness {
        Brightness::derive(&self.device.colors(), &self.options)
    }

    /// Switch on at the configured channel maxima.
    ///
    /// `brightness` (default 255) is stored on the device handle only; it does
    /// not scale the channel levels that are sent.
    pub async fn turn_on(&mut self, brightness: Option<Brightness>) {
        let brightness = brightness.unwrap_or_default();
        self.device.set_brightness(brightness.value());

        let [red, blue, white] = self.options.values();
        let result = runtime::timeout(UPDATE_TIMEOUT, self.device.turn_on(red, blue, white))
            .await
            .map_err(DeviceError::from)
            .and_then(|r| r);

        self.finish_command(EventKind::TurnOn, "turning on", result);
    }

    /// Switch off. Local state is left for the next poll to reconcile.
    pub async fn turn_off(&mut self) {
        let result = runtime::timeout(UPDATE_TIMEOUT, self.device.turn_off())
            .await
            .map_err(DeviceError::from)
            .and_then(|r| r);

        self.finish_command(EventKind::TurnOff, "turning off", result);
    }

    fn finish_command(
        &mut self,
        kind: EventKind,
        action: &str,
        result: std::result::Result<(), DeviceError>,
    ) {
        match result {
            Ok(()) => self.history.record(kind, EventOutcome::Success),
            Err(e) => {
                self.logger.error(format_args!(
                    "Error while {action} {}: {e}",
                    self.entity_id
                ));
                let outcome = match e {
                    DeviceError::Timeout => EventOutcome::Timeout,
                    _ => EventOutcome::Failure,
                };
                self.history.record_error(kind, outcome, &e.to_string());
            }
        }
    }

    /// Returns diagnostics including identity, state, options, and history.
    pub fn diagnostics(&self) -> Value {
        let colors: ChannelLevels = self.device.colors();
        json!({
            "entity_id": self.entity_id,
            "unique_id": self.unique_id,
            "name": self.name,
            "host": self.device.host(),
            "availability": self.availability,
            "is_on": self.is_on,
            "brightness": self.brightness,
            "options": self.options,
            "colors": colors,
            "history": self.history.summary(),
        })
    }
}

/// Entity id suffix: lower-case alphanumerics with single underscores.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}
