// Kept in sync by hand with `DbContext::init_schema`.

diesel::table! {
    enrichment_runs (id) {
        id -> Text,
        created_at -> Text,
        status -> Text,
        prospect_count -> BigInt,
        list_tag -> Nullable<Text>,
        metadata -> Nullable<Text>,
    }
}

diesel::table! {
    prospect_lists (prospect_id, list_id) {
        prospect_id -> Text,
        list_id -> Text,
    }
}

diesel::table! {
    prospects (id) {
        id -> Text,
        name -> Text,
        data -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(enrichment_runs, prospect_lists, prospects,);
