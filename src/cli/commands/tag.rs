//! Enrichment and outreach tagging commands.

use console::style;
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::services::TaggingService;

use super::super::helpers::open_configured_store;

fn parse_metadata(raw: Option<&str>) -> anyhow::Result<Option<Map<String, Value>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(Some(map)),
        _ => anyhow::bail!("--metadata must be a JSON object"),
    }
}

/// Queue prospects for enrichment.
pub async fn cmd_enqueue(
    settings: &Settings,
    prospect_ids: &[String],
    list_tag: Option<&str>,
    metadata: Option<&str>,
) -> anyhow::Result<()> {
    let metadata = parse_metadata(metadata)?;
    let store = open_configured_store(settings).await?;
    let service = TaggingService::new(store, settings.list_tag_defaults());

    let outcome = service
        .enqueue_enrichment(prospect_ids, list_tag, metadata)
        .await?;

    println!(
        "{} Queued {} prospects for enrichment",
        style("✓").green(),
        outcome.queued
    );
    println!("  Run:  {}", outcome.run_id);
    if let Some(tag) = outcome.list_tag {
        println!("  List: {}", tag);
    }

    Ok(())
}

/// Mark prospects ready for outreach.
pub async fn cmd_tag_ready(
    settings: &Settings,
    prospect_ids: &[String],
    list_tag: Option<&str>,
) -> anyhow::Result<()> {
    let store = open_configured_store(settings).await?;
    let service = TaggingService::new(store, settings.list_tag_defaults());

    let outcome = service.tag_outreach_ready(prospect_ids, list_tag).await?;

    println!(
        "{} Tagged {} prospects ready for outreach (list {})",
        style("✓").green(),
        outcome.updated,
        outcome.list_tag
    );

    Ok(())
}

/// Show one enrichment run.
pub async fn cmd_show_run(settings: &Settings, run_id: &str) -> anyhow::Result<()> {
    let store = open_configured_store(settings).await?;

    let Some(run) = store.get_run(run_id).await? else {
        println!("{} Enrichment run not found: {}", style("✗").red(), run_id);
        return Ok(());
    };

    println!("\n{}", style(format!("Enrichment Run {}", run.id)).bold());
    println!("{}", "-".repeat(40));
    println!("  Created:   {}", run.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Status:    {}", run.status);
    println!("  Prospects: {}", run.prospect_count);
    println!("  List tag:  {}", run.list_tag.as_deref().unwrap_or("-"));
    if let Some(metadata) = run.metadata {
        println!(
            "  Metadata:  {}",
            serde_json::to_string(&Value::Object(metadata))?
        );
    }

    Ok(())
}
