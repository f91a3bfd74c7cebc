pub mod advise;
pub mod scan;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "A concurrent scan-session engine with vulnerability correlation.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Reduce decorative output (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan one or more targets for open ports and known vulnerabilities
    #[command(alias = "s")]
    Scan(scan::ScanArgs),
    /// Fetch the remediation advisory for a vulnerability identifier
    #[command(alias = "a")]
    Advise { id: String },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
