//! Prospect records and the merge patches applied to them.
//!
//! A prospect is a loosely typed document owned by upstream ingestion. This
//! module only models the fields the listing and tagging flows read.
//! Writes go through [`ProspectPatch::apply`] on the raw [`Document`], so
//! fields this crate does not model, or that hold unexpected types, survive.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Raw document fields as stored, without the identifier.
pub type Document = Map<String, Value>;

/// Enrichment status written when a prospect is queued.
pub const STATUS_QUEUED: &str = "queued";

/// One prospect document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProspectRecord {
    /// Store-assigned document identifier.
    #[serde(default)]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub role_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority_bucket: Option<String>,
    /// List tags. Only ever grown by union in this crate.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub list_ids: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub enrichment: Option<EnrichmentState>,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub outreach: Option<OutreachState>,
    /// Fields written upstream that this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `enrichment` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentState {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub queue_run_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub queue_timestamp: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `outreach` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutreachState {
    #[serde(
        default,
        deserialize_with = "lenient::boolean",
        skip_serializing_if = "Option::is_none"
    )]
    pub ready: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub ready_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProspectRecord {
    /// Create an empty record.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sort key used by the store's `name` ordering. Missing names sort first.
    pub fn sort_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn enrichment_status(&self) -> Option<&str> {
        self.enrichment.as_ref().and_then(|e| e.status.as_deref())
    }

    /// Read a stored document, attaching its identifier.
    pub fn from_document(id: &str, document: Document) -> serde_json::Result<Self> {
        let mut record: ProspectRecord = serde_json::from_value(Value::Object(document))?;
        record.id = id.to_string();
        Ok(record)
    }

    /// Parse a stored JSON document body, attaching its identifier.
    pub fn from_json(id: &str, body: &str) -> serde_json::Result<Self> {
        let mut record: ProspectRecord = serde_json::from_str(body)?;
        record.id = id.to_string();
        Ok(record)
    }

    /// Document fields for storage. The identifier is kept out of the body.
    pub fn to_document(&self) -> serde_json::Result<Document> {
        let mut document = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        document.remove("id");
        Ok(document)
    }
}

/// Union a tag into a document's `list_ids` array, keeping every existing
/// entry. A missing or non-array `list_ids` becomes `[tag]`. Returns false if
/// the tag was already present.
pub fn union_list_id(document: &mut Document, tag: &str) -> bool {
    let tag = Value::String(tag.to_string());
    match document.get_mut("list_ids") {
        Some(Value::Array(items)) => {
            if items.contains(&tag) {
                return false;
            }
            items.push(tag);
        }
        _ => {
            document.insert("list_ids".to_string(), Value::Array(vec![tag]));
        }
    }
    true
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn set_leaf(fields: &mut Document, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value);
    }
}

/// Update the nested object under `key`, creating it when absent. A value
/// that is not an object is replaced.
fn update_object(document: &mut Document, key: &str, update: impl FnOnce(&mut Document)) {
    let mut fields = match document.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    update(&mut fields);
    document.insert(key.to_string(), Value::Object(fields));
}

/// Enrichment fields to merge; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentPatch {
    pub status: Option<String>,
    pub queue_run_id: Option<String>,
    pub queue_timestamp: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outreach fields to merge; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutreachPatch {
    pub ready: Option<bool>,
    pub ready_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A merge document for a prospect.
///
/// Merging sets only the leaf fields present in the patch; sibling fields
/// inside `enrichment` or `outreach` and every other field of the record are
/// preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProspectPatch {
    pub enrichment: Option<EnrichmentPatch>,
    pub outreach: Option<OutreachPatch>,
}

impl ProspectPatch {
    /// Patch marking a prospect as queued under an enrichment run.
    pub fn enrichment_queued(run_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            enrichment: Some(EnrichmentPatch {
                status: Some(STATUS_QUEUED.to_string()),
                queue_run_id: Some(run_id.to_string()),
                queue_timestamp: Some(now),
                updated_at: Some(now),
            }),
            outreach: None,
        }
    }

    /// Patch marking a prospect as ready for outreach.
    pub fn outreach_ready(now: DateTime<Utc>) -> Self {
        Self {
            enrichment: None,
            outreach: Some(OutreachPatch {
                ready: Some(true),
                ready_at: Some(now),
                updated_at: Some(now),
            }),
        }
    }

    /// Merge into a stored document. Only the patched leaf paths change.
    pub fn apply(&self, document: &mut Document) {
        if let Some(ref patch) = self.enrichment {
            update_object(document, "enrichment", |fields| {
                set_leaf(fields, "status", patch.status.clone().map(Value::String));
                set_leaf(
                    fields,
                    "queue_run_id",
                    patch.queue_run_id.clone().map(Value::String),
                );
                set_leaf(
                    fields,
                    "queue_timestamp",
                    patch.queue_timestamp.map(timestamp_value),
                );
                set_leaf(fields, "updated_at", patch.updated_at.map(timestamp_value));
            });
        }

        if let Some(ref patch) = self.outreach {
            update_object(document, "outreach", |fields| {
                set_leaf(fields, "ready", patch.ready.map(Value::Bool));
                set_leaf(fields, "ready_at", patch.ready_at.map(timestamp_value));
                set_leaf(fields, "updated_at", patch.updated_at.map(timestamp_value));
            });
        }
    }
}
