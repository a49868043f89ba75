//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::DbContext;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    if settings.is_memory() {
        println!(
            "{} In-memory store configured; nothing to initialize",
            style("!").yellow()
        );
        return Ok(());
    }

    settings.ensure_directories()?;

    let ctx = DbContext::from_url(&settings.database_url());
    ctx.init_schema().await?;

    println!(
        "{} Initialized prospect database at {}",
        style("✓").green(),
        ctx.pool().database_url()
    );

    Ok(())
}
