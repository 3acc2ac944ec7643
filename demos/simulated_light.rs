//! Drive the setup flow, options flow and light entity against a simulated
//! Leddy Slim Link controller.
//!
//! Config entries are kept in a JSON file between invocations.
//!
//! Run with: cargo run --example simulated_light -- --help

use std::path::PathBuf;

use aquael_rs::{
    Brightness, ChannelLevels, ChannelMax, ChannelOptions, ConfigEntries, Connector, Device,
    DeviceError, HostInput, Integration, Logger, OptionsInput,
};
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "simulated-light")]
#[command(about = "Configure and control a simulated Aquael light", long_about = None)]
struct Cli {
    /// File holding the config entries
    #[arg(short, long, global = true, default_value = "aquael-entries.json")]
    store: PathBuf,

    /// MAC address the simulated controller reports
    #[arg(long, global = true, default_value = "A0:B1:C2:D3:E4:F5")]
    mac: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the setup flow for a host ("unreachable" simulates a timeout)
    Setup { host: String },

    /// List configured entries
    List,

    /// Set the channel maxima of an entry (1-200 each)
    Options {
        entry_id: Uuid,
        #[arg(long, default_value = "100")]
        red: i64,
        #[arg(long, default_value = "100")]
        blue: i64,
        #[arg(long, default_value = "100")]
        white: i64,
    },

    /// Set up an entry, turn the light on, poll it and print diagnostics
    Run {
        entry_id: Uuid,
        /// Brightness hint passed with the turn-on command (0-255)
        #[arg(short, long)]
        brightness: Option<u8>,
    },

    /// Compute the displayed brightness for channel levels and maxima
    Brightness {
        /// Observed levels as red,blue,white
        #[arg(long, value_delimiter = ',', num_args = 3)]
        levels: Vec<u8>,
        /// Channel maxima as red,blue,white
        #[arg(long, value_delimiter = ',', num_args = 3, default_value = "100,100,100")]
        max: Vec<i64>,
    },
}

/// In-process stand-in for a controller.
struct SimulatedLight {
    host: String,
    mac: String,
    is_on: bool,
    brightness: Option<u8>,
    colors: ChannelLevels,
}

impl SimulatedLight {
    fn check(&self) -> Result<(), DeviceError> {
        if self.host == "unreachable" {
            Err(DeviceError::Timeout)
        } else {
            Ok(())
        }
    }
}

impl Device for SimulatedLight {
    fn host(&self) -> &str {
        &self.host
    }

    async fn test_connection(&mut self) -> Result<(), DeviceError> {
        self.check()
    }

    async fn get_name(&mut self) -> Result<String, DeviceError> {
        self.check()?;
        Ok(format!("Leddy Slim Link ({})", self.host))
    }

    async fn get_mac_address(&mut self) -> Result<String, DeviceError> {
        self.check()?;
        Ok(self.mac.clone())
    }

    async fn update(&mut self) -> Result<(), DeviceError> {
        self.check()
    }

    async fn turn_on(&mut self, red: u8, blue: u8, white: u8) -> Result<(), DeviceError> {
        self.check()?;
        self.colors = ChannelLevels::new(red, blue, white);
        self.is_on = true;
        Ok(())
    }

    async fn turn_off(&mut self) -> Result<(), DeviceError> {
        self.check()?;
        self.is_on = false;
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.is_on
    }

    fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = Some(brightness);
    }

    fn colors(&self) -> ChannelLevels {
        self.colors
    }
}

struct SimulatedConnector {
    mac: String,
}

impl Connector for SimulatedConnector {
    type Device = SimulatedLight;

    fn connect(&self, host: &str) -> SimulatedLight {
        SimulatedLight {
            host: host.to_string(),
            mac: self.mac.clone(),
            is_on: false,
            brightness: None,
            colors: ChannelLevels::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Commands::Brightness { levels, max } = &cli.command {
        let options = ChannelOptions::new(
            ChannelMax::create(max[0]).ok_or("red maximum must be 1-200")?,
            ChannelMax::create(max[1]).ok_or("blue maximum must be 1-200")?,
            ChannelMax::create(max[2]).ok_or("white maximum must be 1-200")?,
        );
        let levels = ChannelLevels::new(levels[0], levels[1], levels[2]);
        println!("{}", Brightness::derive(&levels, &options).value());
        return Ok(());
    }

    let connector = SimulatedConnector {
        mac: cli.mac.clone(),
    };
    let entries = ConfigEntries::load(&cli.store)?;
    let mut integration = Integration::new(connector, entries, Logger::global());

    match cli.command {
        Commands::Brightness { .. } => unreachable!(),

        Commands::Setup { host } => {
            let mut flow = integration.config_flow();
            let result = integration
                .submit_config_flow(&mut flow, Some(HostInput::new(&host)))
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::List => {
            for entry in integration.entries().iter() {
                println!(
                    "{}  {:30}  {:15}  {}  max={:?}",
                    entry.entry_id(),
                    entry.title(),
                    entry.data().host,
                    entry.unique_id(),
                    entry.options().values()
                );
            }
        }

        Commands::Options {
            entry_id,
            red,
            blue,
            white,
        } => {
            let flow = integration.options_flow(&entry_id)?;
            let input = OptionsInput {
                color_red: red,
                color_blue: blue,
                color_white: white,
            };
            let result = integration.submit_options_flow(&flow, Some(input)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Run {
            entry_id,
            brightness,
        } => {
            integration.setup_entry(&entry_id).await?;
            let light = integration
                .light(&entry_id)
                .ok_or("entry did not load")?;
            let mut light = light.lock().await;

            light.turn_on(brightness.map(Brightness::create)).await;
            light.update().await;
            println!("{}", serde_json::to_string_pretty(&light.diagnostics())?);
        }
    }

    integration.entries().save(&cli.store)?;
    Ok(())
}
