//! Console emulator for the attendance terminal.
//!
//! Runs the full control loop against a real backend with console stand-ins
//! for the peripherals: the LCD prints to stdout, the buzzer logs, the link
//! is always up, and card taps are typed as UID hex lines on stdin.

use std::io::BufRead;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use presensi_core::CardUid;
use presensi_device::{Terminal, TerminalConfig};
use presensi_hardware::mock::{MockCardReader, MockCardReaderHandle};
use presensi_hardware::{BeepPattern, Buzzer, Connectivity, TerminalDisplay};

#[derive(Debug, Parser)]
#[command(name = "presensi-terminal", version, about = "RFID attendance terminal emulator")]
struct Args {
    /// Backend base URL.
    #[arg(long, env = "PRESENSI_SERVER_URL")]
    server_url: String,

    /// Device API key from the admin panel.
    #[arg(long, env = "PRESENSI_API_KEY")]
    api_key: String,

    /// Network name shown on the connecting screen.
    #[arg(long, env = "PRESENSI_WIFI_SSID", default_value = "emulator")]
    wifi_ssid: String,
}

/// LCD stand-in: each screen is one stdout line.
struct ConsoleDisplay;

impl TerminalDisplay for ConsoleDisplay {
    async fn show_message(&mut self, line1: &str, line2: &str) -> presensi_hardware::Result<()> {
        println!("[lcd] {line1} | {line2}");
        Ok(())
    }

    async fn show_idle(&mut self, clock: &str) -> presensi_hardware::Result<()> {
        println!("[lcd] Tap Kartu... | {clock}");
        Ok(())
    }

    async fn show_pairing(&mut self, student_name: &str) -> presensi_hardware::Result<()> {
        println!("[lcd] Mode Pairing | {student_name}");
        Ok(())
    }

    async fn show_result(&mut self, line1: &str, line2: &str) -> presensi_hardware::Result<()> {
        println!("[lcd] {line1} | {line2}");
        Ok(())
    }

    async fn show_error(&mut self, message: &str) -> presensi_hardware::Result<()> {
        println!("[lcd] ERROR | {message}");
        Ok(())
    }
}

struct ConsoleBuzzer;

impl Buzzer for ConsoleBuzzer {
    async fn play(&mut self, pattern: BeepPattern) -> presensi_hardware::Result<()> {
        info!(?pattern, "beep");
        Ok(())
    }
}

/// The emulator's link is the host network; always up.
struct AlwaysConnected {
    ssid: String,
}

impl Connectivity for AlwaysConnected {
    async fn is_connected(&self) -> presensi_hardware::Result<bool> {
        Ok(true)
    }

    fn ssid(&self) -> &str {
        &self.ssid
    }
}

/// Feed stdin lines to the reader as card presentations.
fn spawn_stdin_taps(handle: MockCardReaderHandle) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match CardUid::new(&line) {
                Ok(uid) => {
                    info!(%uid, "card presented");
                    handle.present_card(uid);
                }
                Err(e) => warn!(input = %line.trim(), error = %e, "not a card uid"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = TerminalConfig {
        server_url: args.server_url,
        api_key: args.api_key,
        wifi_ssid: args.wifi_ssid.clone(),
        wifi_password: String::new(),
    };

    let (reader, reader_handle) = MockCardReader::new();
    spawn_stdin_taps(reader_handle);

    let mut terminal = Terminal::new(
        config,
        reader,
        ConsoleDisplay,
        ConsoleBuzzer,
        AlwaysConnected {
            ssid: args.wifi_ssid,
        },
    );

    info!("type a card UID (hex) and press enter to tap");
    terminal.run().await?;
    Ok(())
}
