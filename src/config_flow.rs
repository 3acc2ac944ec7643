//! Setup wizard and options editor.
//!
//! [`ConfigFlow`] walks a user from a host address to a stored
//! [`ConfigEntry`]; [`OptionsFlow`] edits the channel maxima of an existing
//! entry. Both only ever return a [`FlowResult`]; rendering is up to the host.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::device::{Connector, Device};
use crate::entry::{ConfigEntries, ConfigEntry, EntryData};
use crate::errors::{DeviceError, Error};
use crate::form::{BASE_ERROR, Field, Form, FlowResult};
use crate::identity::DeviceId;
use crate::logging::Logger;
use crate::runtime;
use crate::types::{Channel, ChannelMax, ChannelOptions};

/// Upper bound for each call made while probing a host.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const STEP_USER: &str = "user";
pub const STEP_INIT: &str = "init";

pub const ERROR_CONNECTION: &str = "connection_error";
pub const ERROR_UNKNOWN: &str = "unknown";
pub const ERROR_REQUIRED: &str = "required";
pub const ERROR_OUT_OF_RANGE: &str = "out_of_range";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";
pub const ABORT_FLOW_FINISHED: &str = "flow_finished";

/// Submitted setup form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInput {
    pub host: String,
}

impl HostInput {
    pub fn new(host: &str) -> Self {
        HostInput {
            host: host.to_string(),
        }
    }
}

/// Where a setup flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    AwaitingHostInput,
    Validating,
    ErrorReturnToInput,
    Created,
    AbortedDuplicate,
}

impl FlowState {
    pub fn is_finished(&self) -> bool {
        matches!(self, FlowState::Created | FlowState::AbortedDuplicate)
    }
}

/// What a reachable host told us about itself.
#[derive(Debug, Clone)]
struct DeviceInfo {
    name: String,
    mac_address: String,
}

/// Setup wizard for one new light.
#[derive(Debug)]
pub struct ConfigFlow {
    flow_id: Uuid,
    state: FlowState,
    logger: Logger,
}

impl ConfigFlow {
    pub fn new(logger: Logger) -> Self {
        ConfigFlow {
            flow_id: Uuid::new_v4(),
            state: FlowState::AwaitingHostInput,
            logger,
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Show the host form, or validate a submitted host.
    ///
    /// Once the flow has finished, further submissions abort. A flow that
    /// stopped on a duplicate repeats `already_configured`; one that created
    /// its entry answers `flow_finished`.
    pub async fn step_user<C: Connector>(
        &mut self,
        connector: &C,
        entries: &mut ConfigEntries,
        user_input: Option<HostInput>,
    ) -> FlowResult {
        if self.state.is_finished() {
            let reason = match self.state {
                FlowState::AbortedDuplicate => ABORT_ALREADY_CONFIGURED,
                _ => ABORT_FLOW_FINISHED,
            };
            return FlowResult::Abort {
                flow_id: self.flow_id,
                reason: reason.to_string(),
            };
        }

        let Some(input) = user_input else {
            return self.show_user_form(None, BTreeMap::new());
        };

        let host = input.host.trim();
        if host.is_empty() {
            let errors = BTreeMap::from([("host".to_string(), ERROR_REQUIRED.to_string())]);
            return self.show_user_form(None, errors);
        }

        self.state = FlowState::Validating;
        let info = match validate_input(connector, host).await {
            Ok(info) => info,
            Err(e) => {
                let code = if e.is_connection_error() {
                    ERROR_CONNECTION
                } else {
                    self.logger
                        .error(format_args!("Unexpected error while probing {host}: {e}"));
                    ERROR_UNKNOWN
                };
                self.state = FlowState::ErrorReturnToInput;
                let errors = BTreeMap::from([(BASE_ERROR.to_string(), code.to_string())]);
                return self.show_user_form(Some(host), errors);
            }
        };

        let unique_id = DeviceId::from_mac(&info.mac_address);
        if let Some(existing) = entries.find_by_unique_id(&unique_id) {
            let entry_id = existing.entry_id();
            if entries.update_host(&unique_id, host) {
                self.logger.info(format_args!(
                    "Device {unique_id} moved to {host}, updated entry {entry_id}"
                ));
            }
            self.state = FlowState::AbortedDuplicate;
            return FlowResult::Abort {
                flow_id: self.flow_id,
                reason: ABORT_ALREADY_CONFIGURED.to_string(),
            };
        }

        let data = EntryData {
            name: info.name.clone(),
            host: host.to_string(),
            device_id: unique_id,
        };
        let entry_id = entries.add(ConfigEntry::new(&info.name, data.clone()));
        self.state = FlowState::Created;

        FlowResult::CreateEntry {
            flow_id: self.flow_id,
            entry_id,
            title: info.name,
            data: json!(data),
        }
    }

    fn show_user_form(&self, host: Option<&str>, errors: BTreeMap<String, String>) -> FlowResult {
        let mut field = Field::string("host");
        if let Some(host) = host {
            field = field.with_suggested(host);
        }
        FlowResult::Form {
            flow_id: self.flow_id,
            step_id: STEP_USER.to_string(),
            data_schema: Form::new(vec![field]),
            errors,
        }
    }
}

/// Probe `host` and read back its identity.
async fn validate_input<C: Connector>(
    connector: &C,
    host: &str,
) -> std::result::Result<DeviceInfo, DeviceError> {
    let mut light = connector.connect(host);

    runtime::timeout(CONNECT_TIMEOUT, light.test_connection()).await??;
    let name = runtime::timeout(CONNECT_TIMEOUT, light.get_name()).await??;
    let mac_address = runtime::timeout(CONNECT_TIMEOUT, light.get_mac_address()).await??;

    Ok(DeviceInfo { name, mac_address })
}

/// Submitted options form. Values are checked against [`ChannelMax`] bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsInput {
    pub color_red: i64,
    pub color_blue: i64,
    pub color_white: i64,
}

impl OptionsInput {
    fn get(&self, channel: Channel) -> i64 {
        match channel {
            Channel::Red => self.color_red,
            Channel::Blue => self.color_blue,
            Channel::White => self.color_white,
        }
    }
}

impl From<ChannelOptions> for OptionsInput {
    fn from(options: ChannelOptions) -> Self {
        OptionsInput {
            color_red: options.red.value().into(),
            color_blue: options.blue.value().into(),
            color_white: options.white.value().into(),
        }
    }
}

/// Editor for the channel maxima of an existing entry.
#[derive(Debug)]
pub struct OptionsFlow {
    flow_id: Uuid,
    entry_id: Uuid,
}

impl OptionsFlow {
    pub fn new(entry_id: Uuid) -> Self {
        OptionsFlow {
            flow_id: Uuid::new_v4(),
            entry_id,
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    /// Show the options form, or store submitted maxima.
    pub fn step_init(
        &self,
        entries: &mut ConfigEntries,
        user_input: Option<OptionsInput>,
    ) -> Result<FlowResult, Error> {
        let current = *entries
            .get(&self.entry_id)
            .ok_or(Error::EntryNotFound(self.entry_id))?
            .options();

        let Some(input) = user_input else {
            return Ok(self.show_form(current, BTreeMap::new()));
        };

        let mut options = ChannelOptions::default();
        let mut errors = BTreeMap::new();
        for channel in Channel::iter() {
            match ChannelMax::create(input.get(channel)) {
                Some(max) => options.set(channel, max),
                None => {
                    errors.insert(channel.to_string(), ERROR_OUT_OF_RANGE.to_string());
                }
            }
        }
        if !errors.is_empty() {
            return Ok(self.show_form(current, errors));
        }

        entries.update_options(&self.entry_id, options)?;
        Ok(FlowResult::CreateEntry {
            flow_id: self.flow_id,
            entry_id: self.entry_id,
            title: String::new(),
            data: json!(options),
        })
    }

    fn show_form(&self, current: ChannelOptions, errors: BTreeMap<String, String>) -> FlowResult {
        let fields = Channel::iter()
            .map(|channel| {
                Field::integer(
                    channel.as_ref(),
                    ChannelMax::MIN.into(),
                    ChannelMax::MAX.into(),
                )
                .with_default(ChannelMax::DEFAULT)
                .with_suggested(current.get(channel).value())
            })
            .collect();

        FlowResult::Form {
            flow_id: self.flow_id,
            step_id: STEP_INIT.to_string(),
            data_schema: Form::new(fields),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnector, Outcome};

    const HOST: &str = "192.168.1.40";

    fn flow() -> ConfigFlow {
        ConfigFlow::new(Logger::global())
    }

    #[tokio::test]
    async fn test_initial_form() {
        let connector = MockConnector::default();
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        let result = flow.step_user(&connector, &mut entries, None).await;
        let FlowResult::Form { step_id, data_schema, errors, .. } = result else {
            panic!("expected form");
        };
        assert_eq!(step_id, STEP_USER);
        assert_eq!(data_schema.fields.len(), 1);
        assert!(data_schema.field("host").unwrap().required);
        assert!(errors.is_empty());
        assert_eq!(flow.state(), FlowState::AwaitingHostInput);
    }

    #[tokio::test]
    async fn test_create_entry() {
        let connector = MockConnector::default();
        connector.add(HOST).script(|s| {
            s.name = "Reef 60".into();
            s.mac = "A0-B1-C2-D3-E4-F5".into();
        });
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        let result = flow
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        let FlowResult::CreateEntry { entry_id, title, data, .. } = result else {
            panic!("expected entry");
        };
        assert_eq!(title, "Reef 60");
        assert_eq!(
            data,
            json!({"name": "Reef 60", "host": HOST, "device_id": "a0:b1:c2:d3:e4:f5"})
        );
        assert_eq!(flow.state(), FlowState::Created);

        let entry = entries.get(&entry_id).unwrap();
        assert_eq!(entry.unique_id().as_str(), "a0:b1:c2:d3:e4:f5");
        assert_eq!(entry.options(), &ChannelOptions::default());
    }

    #[tokio::test]
    async fn test_unreachable_host_returns_to_form() {
        let connector = MockConnector::default();
        connector.add(HOST).script(|s| s.connection = Outcome::Timeout);
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        let result = flow
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        let FlowResult::Form { data_schema, errors, .. } = result else {
            panic!("expected form");
        };
        assert_eq!(errors.get(BASE_ERROR).map(String::as_str), Some(ERROR_CONNECTION));
        assert_eq!(
            data_schema.field("host").unwrap().suggested_value,
            Some(json!(HOST))
        );
        assert_eq!(flow.state(), FlowState::ErrorReturnToInput);
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_connection_error() {
        let connector = MockConnector::default();
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        let result = flow
            .step_user(&connector, &mut entries, Some(HostInput::new("tank.invalid")))
            .await;
        assert_eq!(
            result.errors().get(BASE_ERROR).map(String::as_str),
            Some(ERROR_CONNECTION)
        );
    }

    #[tokio::test]
    async fn test_retry_after_error() {
        let connector = MockConnector::default();
        let light = connector.add(HOST);
        light.script(|s| s.connection = Outcome::Timeout);
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        flow.step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        assert_eq!(flow.state(), FlowState::ErrorReturnToInput);

        light.script(|s| s.connection = Outcome::Ok);
        let result = flow
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        assert!(matches!(result, FlowResult::CreateEntry { .. }));
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_protocol_error_is_unknown() {
        let connector = MockConnector::default();
        connector.add(HOST).script(|s| s.identity = Outcome::Protocol);
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        let result = flow
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        assert_eq!(
            result.errors().get(BASE_ERROR).map(String::as_str),
            Some(ERROR_UNKNOWN)
        );
    }

    #[tokio::test]
    async fn test_empty_host_is_required() {
        let connector = MockConnector::default();
        let mut entries = ConfigEntries::new();
        let mut flow = flow();

        let result = flow
            .step_user(&connector, &mut entries, Some(HostInput::new("  ")))
            .await;
        assert_eq!(
            result.errors().get("host").map(String::as_str),
            Some(ERROR_REQUIRED)
        );
        assert_eq!(flow.state(), FlowState::AwaitingHostInput);
    }

    #[tokio::test]
    async fn test_duplicate_updates_host() {
        let connector = MockConnector::default();
        connector.add(HOST).script(|s| s.mac = "a0:b1:c2:d3:e4:f5".into());
        connector.add("192.168.1.41").script(|s| s.mac = "A0B1C2D3E4F5".into());
        let mut entries = ConfigEntries::new();

        let first = flow()
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        let FlowResult::CreateEntry { entry_id, .. } = first else {
            panic!("expected entry");
        };

        let mut again = flow();
        let result = again
            .step_user(&connector, &mut entries, Some(HostInput::new("192.168.1.41")))
            .await;
        assert!(matches!(
            result,
            FlowResult::Abort { ref reason, .. } if reason == ABORT_ALREADY_CONFIGURED
        ));
        assert_eq!(again.state(), FlowState::AbortedDuplicate);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get(&entry_id).unwrap().data().host, "192.168.1.41");
    }

    #[tokio::test]
    async fn test_finished_flow_rejects_resubmission() {
        let connector = MockConnector::default();
        connector.add(HOST);
        let mut entries = ConfigEntries::new();

        let mut created = flow();
        created
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        let result = created
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        assert!(matches!(
            result,
            FlowResult::Abort { ref reason, .. } if reason == ABORT_FLOW_FINISHED
        ));
        assert_eq!(created.state(), FlowState::Created);

        let mut duplicate = flow();
        duplicate
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        let result = duplicate.step_user(&connector, &mut entries, None).await;
        assert!(matches!(
            result,
            FlowResult::Abort { ref reason, .. } if reason == ABORT_ALREADY_CONFIGURED
        ));
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_same_host() {
        let connector = MockConnector::default();
        connector.add(HOST);
        let mut entries = ConfigEntries::new();

        flow()
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        let result = flow()
            .step_user(&connector, &mut entries, Some(HostInput::new(HOST)))
            .await;
        assert!(matches!(result, FlowResult::Abort { .. }));
        assert_eq!(entries.iter().next().unwrap().data().host, HOST);
    }

    fn entries_with_one() -> (ConfigEntries, Uuid) {
        let mut entries = ConfigEntries::new();
        let id = entries.add(ConfigEntry::new(
            "Tank",
            EntryData {
                name: "Tank".into(),
                host: HOST.into(),
                device_id: DeviceId::from_mac("A0B1C2D3E4F5"),
            },
        ));
        (entries, id)
    }

    #[test]
    fn test_options_form_suggests_current_values() {
        let (mut entries, id) = entries_with_one();
        let flow = OptionsFlow::new(id);

        let result = flow.step_init(&mut entries, None).unwrap();
        let FlowResult::Form { step_id, data_schema, .. } = result else {
            panic!("expected form");
        };
        assert_eq!(step_id, STEP_INIT);
        let names: Vec<&str> = data_schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["color_red", "color_blue", "color_white"]);

        let red = data_schema.field("color_red").unwrap();
        assert_eq!(red.kind, crate::form::FieldKind::Integer { min: 1, max: 200 });
        assert_eq!(red.default, Some(json!(100)));
        assert_eq!(red.suggested_value, Some(json!(100)));
    }

    #[test]
    fn test_options_saved_verbatim() {
        let (mut entries, id) = entries_with_one();
        let flow = OptionsFlow::new(id);

        let input = OptionsInput {
            color_red: 1,
            color_blue: 200,
            color_white: 37,
        };
        let result = flow.step_init(&mut entries, Some(input)).unwrap();
        assert!(matches!(result, FlowResult::CreateEntry { .. }));
        assert_eq!(entries.get(&id).unwrap().options().values(), [1, 200, 37]);
        assert_eq!(OptionsInput::from(*entries.get(&id).unwrap().options()), input);
    }

    #[test]
    fn test_options_out_of_range() {
        let (mut entries, id) = entries_with_one();
        let flow = OptionsFlow::new(id);

        let input = OptionsInput {
            color_red: 0,
            color_blue: 150,
            color_white: 201,
        };
        let result = flow.step_init(&mut entries, Some(input)).unwrap();
        let errors = result.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["color_red"], ERROR_OUT_OF_RANGE);
        assert_eq!(errors["color_white"], ERROR_OUT_OF_RANGE);
        assert_eq!(entries.get(&id).unwrap().options(), &ChannelOptions::default());
    }

    #[test]
    fn test_options_unknown_entry() {
        let mut entries = ConfigEntries::new();
        let missing = Uuid::new_v4();
        assert_eq!(
            OptionsFlow::new(missing).step_init(&mut entries, None),
            Err(Error::EntryNotFound(missing))
        );
    }
}
