//! `wck import`: replace the catalog from an `.xlsx` workbook.

use std::path::Path;

use anyhow::Result;

use wasabi_check_core::import;

use crate::config::Config;
use crate::spreadsheet;
use crate::sqlite_store::SqliteStore;

/// Read `path` and replace the whole catalog with it. With `dry_run` the
/// workbook is validated and counted but nothing is written.
pub async fn run_import(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let sheet = spreadsheet::read_workbook_file(path)?;

    if dry_run {
        let plan = import::plan_catalog(&sheet)?;
        println!(
            "Dry run: {} would import {} products, {} variants ({} rows)",
            path.display(),
            plan.products.len(),
            plan.variants.len(),
            sheet.rows.len()
        );
        return Ok(());
    }

    let store = SqliteStore::open(config).await?;
    let summary = import::replace_catalog(&store, &sheet).await?;
    println!(
        "Imported {} products, {} variants from {}",
        summary.products,
        summary.variants,
        path.display()
    );
    Ok(())
}
