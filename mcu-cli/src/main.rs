//! Seewo Controller Unit Tool
//!
//! Queries and drives the controller unit of a Seewo interactive board over
//! its HID interface. Every command maps onto one facade operation; a command
//! whose operation reports "unavailable" exits with a failure status.

mod cli;
mod settings;
mod simulate;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mcu_detect::CandidateInterface;
use mcu_session::{ConnectionSession, HidPlatform, McuController, Platform};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use settings::Settings;

const DEFAULT_FILTER: &str = "mcuctl=info,mcu_protocol=info,mcu_detect=info,mcu_session=info,mcu_sim=info";

/// Everything `info` reports
#[derive(Debug, Serialize)]
struct InfoReport {
    path: String,
    vendor_id: Option<u16>,
    product_id: Option<u16>,
    revision: u16,
    variant: Option<&'static str>,
    board_name: String,
    ip: String,
    uid: String,
    touch_size: i32,
    firmware: String,
}

impl InfoReport {
    fn is_complete(&self) -> bool {
        !self.board_name.is_empty()
            && !self.ip.is_empty()
            && !self.uid.is_empty()
            && self.touch_size >= 0
            && !self.firmware.is_empty()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => DEFAULT_FILTER.to_string(),
        1 => DEFAULT_FILTER.replace("=info", "=debug"),
        _ => DEFAULT_FILTER.replace("=info", "=trace"),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut settings = Settings::load();

    match &cli.command {
        Command::Pin { path } => {
            settings.pinned_device = Some(path.clone());
            settings.save()?;
            println!("Pinned {}", path);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Unpin => {
            settings.pinned_device = None;
            settings.save()?;
            println!("Unpinned");
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let config = settings.session_config(cli);
    tracing::debug!("Session config: {:?}", config);

    if cli.simulate {
        let session = ConnectionSession::with_config(simulate::host(), config);
        execute(cli, &settings, McuController::new(session))
    } else {
        let platform = HidPlatform::new().context("failed to initialize HID access")?;
        let session = ConnectionSession::with_config(platform, config);
        execute(cli, &settings, McuController::new(session))
    }
}

fn execute<P: Platform>(cli: &Cli, settings: &Settings, controller: McuController<P>) -> Result<ExitCode> {
    let controller = controller.with_volume_step_delay(settings.volume_step_delay());

    if cli.command == Command::List {
        return list(cli, &controller);
    }

    if !connect(&controller, settings.device_path(cli)) {
        eprintln!("No controller found");
        return Ok(ExitCode::FAILURE);
    }

    let ok = match &cli.command {
        Command::Info => info(cli, &controller)?,
        Command::BoardName => print_text(controller.board_name()),
        Command::Ip => print_text(controller.ip()),
        Command::Uid => print_text(controller.uid()),
        Command::TouchSize => {
            let size = controller.touch_size();
            if size >= 0 {
                println!("{}", size);
            }
            size >= 0
        }
        Command::Version => print_text(controller.firmware_version()),
        Command::Volume { steps } => {
            let outcome = controller.volume(*steps);
            println!("{}/{} steps", outcome.succeeded, outcome.requested);
            outcome.is_complete()
        }
        Command::Hdmi => controller.switch_hdmi1(),
        Command::Pen { state } => controller.set_pen(state.enabled()),
        Command::List | Command::Pin { .. } | Command::Unpin => true,
    };

    controller.disconnect();
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Connect to `path` if given, otherwise discover
fn connect<P: Platform>(controller: &McuController<P>, path: Option<&str>) -> bool {
    let Some(path) = path else {
        return controller.connect();
    };

    let candidate = controller
        .list_candidates()
        .into_iter()
        .find(|c| c.path.eq_ignore_ascii_case(path))
        .unwrap_or_else(|| CandidateInterface::new(path, 0));
    controller.connect_to(candidate)
}

fn list<P: Platform>(cli: &Cli, controller: &McuController<P>) -> Result<ExitCode> {
    let candidates = controller.list_candidates();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else if candidates.is_empty() {
        println!("No controller interfaces found");
    } else {
        for (i, candidate) in candidates.iter().enumerate() {
            println!("{:>2}. {}", i + 1, candidate);
        }
    }
    Ok(if candidates.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn info<P: Platform>(cli: &Cli, controller: &McuController<P>) -> Result<bool> {
    let Some(device) = controller.device_info() else {
        return Ok(false);
    };
    let report = InfoReport {
        path: device.path,
        vendor_id: device.vendor_id,
        product_id: device.product_id,
        revision: device.revision,
        variant: device.variant,
        board_name: controller.board_name(),
        ip: controller.ip(),
        uid: controller.uid(),
        touch_size: controller.touch_size(),
        firmware: controller.firmware_version(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let hex = |id: Option<u16>| id.map_or_else(|| "?".to_string(), |v| format!("{:04X}", v));
        let text = |s: &str| if s.is_empty() { "unavailable".to_string() } else { s.to_string() };
        println!("Device:     {}", report.path);
        println!(
            "USB:        {}:{} rev {:04X}",
            hex(report.vendor_id),
            hex(report.product_id),
            report.revision
        );
        println!("Variant:    {}", report.variant.unwrap_or("unknown"));
        println!("Board:      {}", text(&report.board_name));
        println!("IP:         {}", text(&report.ip));
        println!("UID:        {}", text(&report.uid));
        if report.touch_size >= 0 {
            println!("Touch size: {}\"", report.touch_size);
        } else {
            println!("Touch size: unavailable");
        }
        println!("Firmware:   {}", text(&report.firmware));
    }
    Ok(report.is_complete())
}

/// Print a text result; empty means unavailable
fn print_text(value: String) -> bool {
    if value.is_empty() {
        return false;
    }
    println!("{}", value);
    true
}
