//! Entry lifecycle: the glue between flows, entries, and light entities.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config_flow::{ConfigFlow, HostInput, OptionsFlow, OptionsInput};
use crate::device::Connector;
use crate::entry::{ConfigEntries, ConfigEntry, EntryState};
use crate::errors::Error;
use crate::form::FlowResult;
use crate::light::LightEntity;
use crate::logging::Logger;
use crate::poller::{Poller, SharedLight};
use crate::runtime::Mutex;

type Result<T> = std::result::Result<T, Error>;

/// Owns the config entries of one host and the lights set up from them.
///
/// # Example
///
/// ```ignore
/// let mut integration = Integration::new(connector, ConfigEntries::load(&path)?, Logger::global())
///     .with_poll_interval(SCAN_INTERVAL);
///
/// let mut flow = integration.config_flow();
/// let result = integration
///     .submit_config_flow(&mut flow, Some(HostInput::new("192.168.1.40")))
///     .await;
/// integration.entries().save(&path)?;
/// ```
pub struct Integration<C: Connector> {
    connector: C,
    entries: ConfigEntries,
    lights: HashMap<Uuid, SharedLight<C::Device>>,
    pollers: HashMap<Uuid, Poller>,
    poll_interval: Option<Duration>,
    logger: Logger,
}

impl<C: Connector> Integration<C> {
    pub fn new(connector: C, entries: ConfigEntries, logger: Logger) -> Self {
        Integration {
            connector,
            entries,
            lights: HashMap::new(),
            pollers: HashMap::new(),
            poll_interval: None,
            logger,
        }
    }

    /// Poll every loaded light on this interval. Without it, the caller drives
    /// [`LightEntity::update`] itself.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn entries(&self) -> &ConfigEntries {
        &self.entries
    }

    /// The light set up for `entry_id`, if the entry is loaded.
    pub fn light(&self, entry_id: &Uuid) -> Option<SharedLight<C::Device>> {
        self.lights.get(entry_id).cloned()
    }

    pub fn config_flow(&self) -> ConfigFlow {
        ConfigFlow::new(self.logger.with_target(&self.target("config_flow")))
    }

    pub fn options_flow(&self, entry_id: &Uuid) -> Result<OptionsFlow> {
        self.entries
            .get(entry_id)
            .map(|e| OptionsFlow::new(e.entry_id()))
            .ok_or(Error::EntryNotFound(*entry_id))
    }

    /// Run a setup flow step and set up any entry it creates.
    ///
    /// When a duplicate setup moves an entry to a new host, a loaded entry is
    /// reloaded and one waiting in `SetupRetry` or `SetupError` is set up
    /// again at the new address.
    pub async fn submit_config_flow(
        &mut self,
        flow: &mut ConfigFlow,
        user_input: Option<HostInput>,
    ) -> FlowResult {
        let hosts = self.hosts();
        let result = flow
            .step_user(&self.connector, &mut self.entries, user_input)
            .await;

        // failures are already reflected in the entry state
        match &result {
            FlowResult::CreateEntry { entry_id, .. } => {
                let _ = self.setup_entry(entry_id).await;
            }
            FlowResult::Abort { .. } => {
                for entry_id in self.moved_entries(&hosts) {
                    let state = self.entries.get(&entry_id).map(ConfigEntry::state);
                    match state {
                        Some(EntryState::Loaded) => {
                            let _ = self.reload_entry(&entry_id).await;
                        }
                        Some(EntryState::SetupRetry | EntryState::SetupError) => {
                            let _ = self.setup_entry(&entry_id).await;
                        }
                        _ => {}
                    }
                }
            }
            FlowResult::Form { .. } => {}
        }
        result
    }

    /// Run an options flow step; a loaded entry is reloaded when its options change.
    pub async fn submit_options_flow(
        &mut self,
        flow: &OptionsFlow,
        user_input: Option<OptionsInput>,
    ) -> Result<FlowResult> {
        let entry_id = flow.entry_id();
        let before = *self
            .entries
            .get(&entry_id)
            .ok_or(Error::EntryNotFound(entry_id))?
            .options();

        let result = flow.step_init(&mut self.entries, user_input)?;

        let changed = self
            .entries
            .get(&entry_id)
            .is_some_and(|e| *e.options() != before);
        if changed && self.lights.contains_key(&entry_id) {
            self.reload_entry(&entry_id).await?;
        }
        Ok(result)
    }

    /// Connect to the entry's device and register its light.
    ///
    /// The light is polled once before it is registered.
    pub async fn setup_entry(&mut self, entry_id: &Uuid) -> Result<()> {
        if self.lights.contains_key(entry_id) {
            return Ok(());
        }
        let entry = self
            .entries
            .get(entry_id)
            .cloned()
            .ok_or(Error::EntryNotFound(*entry_id))?;

        let logger = self.logger.with_target(&self.target("light"));
        let mut light = match LightEntity::setup(&entry, &self.connector, logger).await {
            Ok(light) => light,
            Err(e) => {
                let state = if e.is_not_ready() {
                    EntryState::SetupRetry
                } else {
                    EntryState::SetupError
                };
                self.logger.warn(format_args!(
                    "Setting up {} failed ({state:?}): {e}",
                    entry.title()
                ));
                self.set_state(entry_id, state);
                return Err(e);
            }
        };
        light.update().await;

        let light = Arc::new(Mutex::new(light));
        if let Some(interval) = self.poll_interval {
            self.pollers
                .insert(*entry_id, Poller::start(Arc::clone(&light), interval));
        }
        self.lights.insert(*entry_id, light);
        self.set_state(entry_id, EntryState::Loaded);
        self.logger.info(format_args!(
            "Set up {} at {}",
            entry.title(),
            entry.data().host
        ));
        Ok(())
    }

    /// Try to set up every entry that is not loaded yet.
    ///
    /// Returns the number of entries loaded afterwards.
    pub async fn setup_all(&mut self) -> usize {
        let pending: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|e| e.state() != EntryState::Loaded)
            .map(ConfigEntry::entry_id)
            .collect();
        for entry_id in pending {
            let _ = self.setup_entry(&entry_id).await;
        }
        self.lights.len()
    }

    /// Stop polling and drop the entry's light.
    ///
    /// Returns `false` if the entry was not loaded.
    pub async fn unload_entry(&mut self, entry_id: &Uuid) -> Result<bool> {
        if self.entries.get(entry_id).is_none() {
            return Err(Error::EntryNotFound(*entry_id));
        }
        if let Some(mut poller) = self.pollers.remove(entry_id) {
            poller.stop();
        }
        let unloaded = self.lights.remove(entry_id).is_some();
        self.set_state(entry_id, EntryState::NotLoaded);
        Ok(unloaded)
    }

    pub async fn reload_entry(&mut self, entry_id: &Uuid) -> Result<()> {
        self.unload_entry(entry_id).await?;
        self.setup_entry(entry_id).await
    }

    pub async fn remove_entry(&mut self, entry_id: &Uuid) -> Result<ConfigEntry> {
        self.unload_entry(entry_id).await?;
        self.entries.remove(entry_id)
    }

    fn hosts(&self) -> HashMap<Uuid, String> {
        self.entries
            .iter()
            .map(|e| (e.entry_id(), e.data().host.clone()))
            .collect()
    }

    /// Entries whose host differs from the `before` snapshot.
    fn moved_entries(&self, before: &HashMap<Uuid, String>) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter(|e| {
                before
                    .get(&e.entry_id())
                    .is_some_and(|host| *host != e.data().host)
            })
            .map(ConfigEntry::entry_id)
            .collect()
    }

    fn set_state(&mut self, entry_id: &Uuid, state: EntryState) {
        if let Some(entry) = self.entries.get_mut(entry_id) {
            entry.set_state(state);
        }
    }

    fn target(&self, name: &str) -> String {
        format!("{}::{name}", self.logger.target())
    }
}
