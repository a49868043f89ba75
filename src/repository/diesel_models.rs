//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Prospect row: the JSON document plus its sort key.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::prospects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProspectRow {
    pub id: String,
    pub name: String,
    pub data: String,
    pub updated_at: String,
}

/// New or replacement prospect row.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::prospects)]
pub struct NewProspectRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub data: &'a str,
    pub updated_at: &'a str,
}

/// Membership of a prospect in a list tag.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::prospect_lists)]
pub struct NewProspectList<'a> {
    pub prospect_id: &'a str,
    pub list_id: &'a str,
}

/// Enrichment run record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::enrichment_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EnrichmentRunRecord {
    pub id: String,
    pub created_at: String,
    pub status: String,
    pub prospect_count: i64,
    pub list_tag: Option<String>,
    pub metadata: Option<String>,
}

/// New enrichment run for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::enrichment_runs)]
pub struct NewEnrichmentRunRecord<'a> {
    pub id: &'a str,
    pub created_at: &'a str,
    pub status: &'a str,
    pub prospect_count: i64,
    pub list_tag: Option<&'a str>,
    pub metadata: Option<&'a str>,
}
