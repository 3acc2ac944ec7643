//! Scripted device and log capture shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use log::{Level, Log, Metadata, Record};

use crate::device::{Connector, Device};
use crate::errors::DeviceError;
use crate::types::ChannelLevels;

type Result<T> = std::result::Result<T, DeviceError>;

/// How a scripted call should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Timeout,
    Unresolvable,
    Protocol,
}

impl Outcome {
    fn into_result(self, host: &str) -> Result<()> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::Timeout => Err(DeviceError::Timeout),
            Outcome::Unresolvable => Err(DeviceError::Resolve(host.to_string())),
            Outcome::Protocol => Err(DeviceError::Protocol("unexpected frame".into())),
        }
    }
}

/// A command the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TurnOn { red: u8, blue: u8, white: u8, brightness: Option<u8> },
    TurnOff,
}

/// State the test script and the device handle share.
#[derive(Debug)]
pub struct MockState {
    pub name: String,
    pub mac: String,
    pub connection: Outcome,
    pub identity: Outcome,
    pub command: Outcome,
    /// Results of upcoming `update` calls; `Ok` once empty.
    pub updates: VecDeque<Outcome>,
    /// Colours and power reported after the next successful update.
    pub reported: (bool, ChannelLevels),
    pub is_on: bool,
    pub brightness: Option<u8>,
    pub colors: ChannelLevels,
    pub commands: Vec<Command>,
    pub update_calls: usize,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            name: "Leddy Slim Link".into(),
            mac: "A0:B1:C2:D3:E4:F5".into(),
            connection: Outcome::Ok,
            identity: Outcome::Ok,
            command: Outcome::Ok,
            updates: VecDeque::new(),
            reported: (false, ChannelLevels::default()),
            is_on: false,
            brightness: None,
            colors: ChannelLevels::default(),
            commands: Vec::new(),
            update_calls: 0,
        }
    }
}

/// In-memory controller handle driven by a shared [`MockState`].
#[derive(Debug, Clone)]
pub struct MockLight {
    host: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockLight {
    pub fn new(host: &str) -> Self {
        MockLight {
            host: host.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn script<F: FnOnce(&mut MockState)>(&self, f: F) {
        f(&mut self.state.lock().unwrap())
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }
}

impl Device for MockLight {
    fn host(&self) -> &str {
        &self.host
    }

    async fn test_connection(&mut self) -> Result<()> {
        let outcome = self.state.lock().unwrap().connection;
        outcome.into_result(&self.host)
    }

    async fn get_name(&mut self) -> Result<String> {
        let state = self.state.lock().unwrap();
        state.identity.into_result(&self.host)?;
        Ok(state.name.clone())
    }

    async fn get_mac_address(&mut self) -> Result<String> {
        let state = self.state.lock().unwrap();
        state.identity.into_result(&self.host)?;
        Ok(state.mac.clone())
    }

    async fn update(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        let outcome = state.updates.pop_front().unwrap_or(Outcome::Ok);
        outcome.into_result(&self.host)?;
        let (is_on, colors) = state.reported;
        state.is_on = is_on;
        state.colors = colors;
        Ok(())
    }

    async fn turn_on(&mut self, red: u8, blue: u8, white: u8) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let brightness = state.brightness;
        state.commands.push(Command::TurnOn { red, blue, white, brightness });
        state.command.into_result(&self.host)
    }

    async fn turn_off(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::TurnOff);
        state.command.into_result(&self.host)
    }

    fn is_on(&self) -> bool {
        self.state.lock().unwrap().is_on
    }

    fn brightness(&self) -> Option<u8> {
        self.state.lock().unwrap().brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.state.lock().unwrap().brightness = Some(brightness);
    }

    fn colors(&self) -> ChannelLevels {
        self.state.lock().unwrap().colors
    }
}

/// Hands out [`MockLight`]s registered per host; unknown hosts fail to resolve.
#[derive(Debug, Default, Clone)]
pub struct MockConnector {
    lights: Arc<Mutex<HashMap<String, MockLight>>>,
}

impl MockConnector {
    pub fn add(&self, host: &str) -> MockLight {
        let light = MockLight::new(host);
        self.lights
            .lock()
            .unwrap()
            .insert(host.to_string(), light.clone());
        light
    }
}

impl Connector for MockConnector {
    type Device = MockLight;

    fn connect(&self, host: &str) -> MockLight {
        if let Some(light) = self.lights.lock().unwrap().get(host) {
            return light.clone();
        }
        let light = MockLight::new(host);
        light.script(|s| {
            s.connection = Outcome::Unresolvable;
            s.identity = Outcome::Unresolvable;
        });
        light
    }
}

/// `log::Log` that keeps every record in memory.
#[derive(Debug, Default)]
pub struct CaptureLog {
    records: Mutex<Vec<(Level, String, String)>>,
}

impl CaptureLog {
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(level, _, msg)| (*level, msg.clone()))
            .collect()
    }

    pub fn targets(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(_, target, _)| target.clone())
            .collect()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.records().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Log for CaptureLog {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push((
            record.level(),
            record.target().to_string(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}
