// CLI definitions using clap

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "mcuctl")]
#[command(author, version, about = "Seewo board controller unit tool")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Interface path to use instead of discovery (overrides the pinned device)
    #[arg(long, global = true, value_name = "PATH")]
    pub device: Option<String>,

    /// Read deadline per attempt in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Attempts per request
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub attempts: Option<u32>,

    /// Wait for acknowledgements of write-only commands
    #[arg(long, global = true)]
    pub confirm_acks: bool,

    /// Talk to a simulated controller instead of the HID stack
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // === Query Commands ===
    /// Show the bound device and everything the controller reports
    #[command(visible_alias = "i")]
    Info,

    /// Board model name
    #[command(visible_alias = "name")]
    BoardName,

    /// Board IP address
    Ip,

    /// Controller unique id
    Uid,

    /// Touch panel size in inches
    #[command(visible_alias = "size")]
    TouchSize,

    /// Firmware version string
    #[command(visible_aliases = ["firmware", "fw"])]
    Version,

    // === Set Commands ===
    /// Change the volume by a number of steps (negative lowers it; "up"/"down" mean one step)
    #[command(visible_alias = "vol")]
    Volume {
        #[arg(allow_hyphen_values = true, value_parser = parse_steps)]
        steps: i32,
    },

    /// Switch the display input to HDMI 1
    Hdmi,

    /// Enable or disable the stylus
    Pen {
        #[arg(value_enum)]
        state: Toggle,
    },

    // === Device Selection ===
    /// List interfaces that look like a controller, best first
    #[command(visible_alias = "ls")]
    List,

    /// Remember an interface path for later runs
    Pin {
        path: String,
    },

    /// Forget the remembered interface path
    Unpin,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

/// Volume steps: a signed count, or `up` / `down` for a single step
pub fn parse_steps(s: &str) -> Result<i32, String> {
    match s.to_ascii_lowercase().as_str() {
        "up" => Ok(1),
        "down" => Ok(-1),
        other => other
            .trim_start_matches('+')
            .parse::<i32>()
            .map_err(|_| format!("'{}' is not a step count (e.g. 3, -2, up, down)", s))
            .and_then(|n| {
                if n.unsigned_abs() <= 100 {
                    Ok(n)
                } else {
                    Err(format!("{} steps is out of range (-100..=100)", n))
                }
            }),
    }
}
