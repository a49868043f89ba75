//! Listing commands.

use console::style;

use crate::config::Settings;
use crate::services::{list_options, ProspectFilters, ProspectLister, MAX_LIST_FILTERS};

use super::super::helpers::{open_configured_store, split_csv, truncate};

/// Arguments for `ls`.
pub struct LsArgs {
    pub page_size: usize,
    pub page_token: Option<String>,
    pub list_ids: Option<String>,
    pub priorities: Option<String>,
    pub statuses: Option<String>,
    pub search: Option<String>,
    pub json: bool,
}

/// List one page of prospects.
pub async fn cmd_ls(settings: &Settings, args: LsArgs) -> anyhow::Result<()> {
    let filters = ProspectFilters {
        list_ids: split_csv(args.list_ids.as_deref()),
        priorities: split_csv(args.priorities.as_deref()),
        statuses: split_csv(args.statuses.as_deref()),
        search: args.search.unwrap_or_default(),
    };
    if filters.list_ids.len() > MAX_LIST_FILTERS {
        anyhow::bail!("A maximum of {} list filters is supported.", MAX_LIST_FILTERS);
    }

    let store = open_configured_store(settings).await?;
    let lister = ProspectLister::new(store);
    let page = lister
        .list(args.page_size, args.page_token.as_deref(), &filters)
        .await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "data": page.data,
                "nextPageToken": page.next_page_token,
            }))?
        );
        return Ok(());
    }

    if page.data.is_empty() {
        println!("{} No prospects found", style("!").yellow());
        return Ok(());
    }

    println!(
        "{:<24} {:<28} {:<24} {:<10} Status",
        "ID", "Name", "Organization", "Priority"
    );
    println!("{}", "-".repeat(96));
    for record in &page.data {
        println!(
            "{:<24} {:<28} {:<24} {:<10} {}",
            truncate(&record.id, 23),
            truncate(record.sort_name(), 27),
            truncate(record.organization.as_deref().unwrap_or(""), 23),
            record.priority_bucket.as_deref().unwrap_or("-"),
            record.enrichment_status().unwrap_or("-"),
        );
    }

    println!();
    match page.next_page_token {
        Some(token) => println!(
            "{} {} prospects; next page: --page-token {}",
            style("→").cyan(),
            page.data.len(),
            token
        ),
        None => println!("{} {} prospects (end of results)", style("✓").green(), page.data.len()),
    }

    Ok(())
}

/// Show the list tags found in the sampled prospects.
pub async fn cmd_list_options(settings: &Settings) -> anyhow::Result<()> {
    let store = open_configured_store(settings).await?;
    let options = list_options(&store).await?;

    if options.is_empty() {
        println!("{} No list tags found", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("List Tags").bold());
    println!("{}", "-".repeat(40));
    for option in options {
        println!("  {}", option);
    }

    Ok(())
}
