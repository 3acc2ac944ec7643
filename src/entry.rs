//! Config entries: the persisted result of a finished setup flow.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Error;
use crate::identity::DeviceId;
use crate::types::ChannelOptions;

type Result<T> = std::result::Result<T, Error>;

/// Device record captured during setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub name: String,
    pub host: String,
    pub device_id: DeviceId,
}

/// Runtime state of an entry; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    #[default]
    NotLoaded,
    Loaded,
    /// The device was unreachable; the host should try again later.
    SetupRetry,
    SetupError,
}

/// A configured Aquael light.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    entry_id: Uuid,
    version: u32,
    minor_version: u32,
    title: String,
    unique_id: DeviceId,
    data: EntryData,
    #[serde(default)]
    options: ChannelOptions,
    #[serde(skip)]
    state: EntryState,
}

impl ConfigEntry {
    pub const VERSION: u32 = 1;
    pub const MINOR_VERSION: u32 = 0;

    pub fn new(title: &str, data: EntryData) -> Self {
        ConfigEntry {
            entry_id: Uuid::new_v4(),
            version: Self::VERSION,
            minor_version: Self::MINOR_VERSION,
            title: title.to_string(),
            unique_id: data.device_id.clone(),
            data,
            options: ChannelOptions::default(),
            state: EntryState::NotLoaded,
        }
    }

    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn unique_id(&self) -> &DeviceId {
        &self.unique_id
    }

    pub fn data(&self) -> &EntryData {
        &self.data
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.options
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: EntryState) {
        self.state = state;
    }
}

/// Registry of config entries, keyed by entry id and unique id.
///
/// # Example
///
/// ```
/// use aquael_rs::{ConfigEntries, ConfigEntry, DeviceId, EntryData};
///
/// let mut entries = ConfigEntries::new();
/// let id = entries.add(ConfigEntry::new("Tank", EntryData {
///     name: "Tank".into(),
///     host: "10.0.0.20".into(),
///     device_id: DeviceId::from_mac("A0B1C2D3E4F5"),
/// }));
///
/// let found = entries.find_by_unique_id(&DeviceId::from_mac("a0:b1:c2:d3:e4:f5")).unwrap();
/// assert_eq!(found.entry_id(), id);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntries {
    entries: Vec<ConfigEntry>,
}

impl ConfigEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read entries from a JSON file. A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(Error::storage("read", path, e)),
        };
        let entries: Self = serde_json::from_str(&raw).map_err(Error::JsonLoad)?;
        debug!("loaded {} config entries from {:?}", entries.len(), path);
        Ok(entries)
    }

    /// Write all entries to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).map_err(Error::JsonDump)?;
        fs::write(path, raw).map_err(|e| Error::storage("write", path, e))
    }

    pub fn add(&mut self, entry: ConfigEntry) -> Uuid {
        let id = entry.entry_id;
        self.entries.push(entry);
        id
    }

    pub fn remove(&mut self, entry_id: &Uuid) -> Result<ConfigEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| &e.entry_id == entry_id)
            .ok_or(Error::EntryNotFound(*entry_id))?;
        Ok(self.entries.remove(idx))
    }

    pub fn get(&self, entry_id: &Uuid) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| &e.entry_id == entry_id)
    }

    pub fn get_mut(&mut self, entry_id: &Uuid) -> Option<&mut ConfigEntry> {
        self.entries.iter_mut().find(|e| &e.entry_id == entry_id)
    }

    pub fn find_by_unique_id(&self, unique_id: &DeviceId) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| &e.unique_id == unique_id)
    }

    /// Point the entry with `unique_id` at a new host.
    ///
    /// Returns `true` if the stored host changed.
    pub fn update_host(&mut self, unique_id: &DeviceId, host: &str) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| &e.unique_id == unique_id) else {
            return false;
        };
        if entry.data.host == host {
            return false;
        }
        entry.data.host = host.to_string();
        true
    }

    /// Replace an entry's options.
    ///
    /// Returns `true` if they changed.
    pub fn update_options(&mut self, entry_id: &Uuid, options: ChannelOptions) -> Result<bool> {
        let entry = self
            .get_mut(entry_id)
            .ok_or(Error::EntryNotFound(*entry_id))?;
        if entry.options == options {
            return Ok(false);
        }
        entry.options = options;
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
