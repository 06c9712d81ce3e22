use netsweep_common::config::Config;
use netsweep_common::success;
use netsweep_core::scanner;

use crate::terminal::print;

pub async fn check(cfg: &Config) -> anyhow::Result<()> {
    let program: String = cfg.nmap_path.display().to_string();
    print::print_status(format!("Probing '{program} --version'"));

    if !scanner::is_available(&cfg.nmap_path).await {
        anyhow::bail!("scanning tool '{program}' is not installed or not accessible");
    }
    success!("'{program}' is available");
    Ok(())
}
