mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, results, scan, serve};
use netsweep_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands: CommandLine = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    print::banner();

    let cfg: Config = commands.config();

    match &commands.command {
        Commands::Scan { target } => {
            print::header("starting scanner");
            scan::scan(target, &cfg).await
        }
        Commands::Results { ip, limit, skip } => results::results(ip.as_deref(), *limit, *skip, &cfg).await,
        Commands::Latest { ip } => results::latest(ip, &cfg).await,
        Commands::Serve { .. } => {
            print::header("starting api server");
            serve::serve(&cfg).await
        }
        Commands::Check => check::check(&cfg).await,
    }
}
