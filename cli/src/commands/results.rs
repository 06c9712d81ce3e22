use colored::*;

use crate::commands::open_archive;
use crate::mprint;
use crate::terminal::{format, print};
use netsweep_common::config::Config;
use netsweep_core::QueryService;
use netsweep_core::archive::{Page, StoredRecord};
use netsweep_core::query::QueryError;

pub async fn results(ip: Option<&str>, limit: Option<i64>, skip: Option<i64>, cfg: &Config) -> anyhow::Result<()> {
    let query: QueryService = QueryService::new(open_archive(cfg).await?);
    let page: Page<StoredRecord> = query.list(ip, limit, skip).await?;

    if page.items.is_empty() {
        print::header("No results");
        print::print_status(format!("{} record(s) match, none on this page", page.total));
        return Ok(());
    }

    print::header("Scan Archive");
    for (idx, stored) in page.items.iter().enumerate() {
        print::tree_head(page.offset as usize + idx, &format::record_title(stored));
        print::as_tree_one_level(&format::record_details(&stored.record));
        if idx + 1 != page.items.len() {
            mprint!();
        }
    }

    let first: u64 = page.offset + 1;
    let last: u64 = page.offset + page.items.len() as u64;
    print::fat_separator();
    print::centerln(&format!(
        "Showing {}-{} of {}",
        first.to_string().bold(),
        last.to_string().bold(),
        page.total.to_string().bold().green()
    ));
    Ok(())
}

pub async fn latest(ip: &str, cfg: &Config) -> anyhow::Result<()> {
    let query: QueryService = QueryService::new(open_archive(cfg).await?);

    match query.latest(ip).await {
        Ok(stored) => {
            print::header("Latest Result");
            print::tree_head(0, &format::record_title(&stored));
            print::as_tree_one_level(&format::record_details(&stored.record));
            Ok(())
        }
        Err(e @ QueryError::NotFound { .. }) => anyhow::bail!("{e}: {}", ip.trim()),
        Err(e) => Err(e.into()),
    }
}
