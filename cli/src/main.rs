mod advisor;
mod commands;
mod terminal;

use commands::{CommandLine, Commands, advise, scan};
use vantage_common::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    terminal::logging::init(commands.verbose);

    let cfg = Config {
        quiet: commands.quiet,
        no_color: commands.no_color,
    };
    if cfg.no_color {
        colored::control::set_override(false);
    }

    match commands.command {
        Commands::Scan(args) => {
            terminal::print::header("starting scan session", cfg.quiet);
            scan::scan(args, &cfg).await
        }
        Commands::Advise { id } => {
            terminal::print::header("fetching advisory", cfg.quiet);
            advise::advise(&id, &cfg).await
        }
    }
}
