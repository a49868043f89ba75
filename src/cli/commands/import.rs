//! Development import of prospect documents.

use std::path::Path;

use anyhow::Context;
use console::style;
use serde_json::Value;

use crate::config::Settings;
use crate::models::Document;
use crate::repository::{new_document_id, WriteBatch};
use crate::services::{chunk_count, chunked, BATCH_CHUNK_SIZE};

use super::super::helpers::open_configured_store;

/// Parse a JSON array of documents, or one document per line.
///
/// Documents without a string `id` get a generated one. Other fields are
/// kept as written.
fn parse_documents(contents: &str) -> anyhow::Result<Vec<(String, Document)>> {
    let values: Vec<Value> = if contents.trim_start().starts_with('[') {
        serde_json::from_str(contents).context("Failed to parse JSON array")?
    } else {
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", n + 1))
            })
            .collect::<anyhow::Result<_>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(n, value)| {
            let Value::Object(mut document) = value else {
                anyhow::bail!("Document {} is not a JSON object", n + 1);
            };
            let id = match document.remove("id") {
                Some(Value::String(id)) if !id.is_empty() => id,
                _ => new_document_id(),
            };
            Ok((id, document))
        })
        .collect()
}

/// Import prospects, replacing any existing documents with the same id.
pub async fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let documents = parse_documents(&contents)?;

    if documents.is_empty() {
        println!("{} No documents in {}", style("!").yellow(), file.display());
        return Ok(());
    }

    let store = open_configured_store(settings).await?;
    let total_chunks = chunk_count(documents.len(), BATCH_CHUNK_SIZE);

    let mut imported = 0;
    for (index, group) in chunked(&documents, BATCH_CHUNK_SIZE).enumerate() {
        let mut batch = WriteBatch::new();
        for (id, document) in group {
            batch.replace_document(id, document.clone());
        }
        store.commit(batch).await.with_context(|| {
            format!(
                "Import stopped at batch {}/{} after {} documents",
                index + 1,
                total_chunks,
                imported
            )
        })?;
        imported += group.len();
    }

    println!(
        "{} Imported {} prospects from {}",
        style("✓").green(),
        imported,
        file.display()
    );

    Ok(())
}
