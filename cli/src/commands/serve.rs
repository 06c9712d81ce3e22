use netsweep_common::config::Config;
use netsweep_common::info;

use crate::terminal::print;

pub async fn serve(cfg: &Config) -> anyhow::Result<()> {
    print::print_status(format!("Listening on http://{}", cfg.listen_addr));
    print::print_status(format!("Archive: {}", cfg.db_path.display()));
    info!("Press Ctrl+C to stop");

    netsweep_api::start_server(cfg).await
}
