// table definitions matching the embedded migrations

diesel::table! {
    region (id) {
        id -> Text,
        display_name -> Text,
    }
}

diesel::table! {
    player (id) {
        id -> Uuid,
        name -> Text,
        aliases -> Array<Text>,
        regions -> Array<Text>,
        ratings -> Jsonb,
        merged -> Bool,
        merge_parent -> Nullable<Uuid>,
        merge_children -> Array<Uuid>,
    }
}

diesel::table! {
    tournament (id) {
        id -> Uuid,
        name -> Text,
        source_type -> Text,
        date -> Timestamptz,
        regions -> Array<Text>,
        raw -> Text,
        players -> Array<Uuid>,
        matches -> Jsonb,
        orig_ids -> Array<Uuid>,
    }
}

diesel::table! {
    pending_tournament (id) {
        id -> Uuid,
        name -> Text,
        source_type -> Text,
        date -> Timestamptz,
        regions -> Array<Text>,
        raw -> Text,
        aliases -> Array<Text>,
        alias_matches -> Jsonb,
        alias_mappings -> Jsonb,
    }
}

diesel::table! {
    ranking (id) {
        id -> Uuid,
        region -> Text,
        time -> Timestamptz,
        tournaments -> Array<Uuid>,
        entries -> Jsonb,
    }
}

diesel::table! {
    merge (id) {
        id -> Uuid,
        requester -> Uuid,
        source_player -> Uuid,
        target_player -> Uuid,
        time -> Timestamptz,
    }
}

diesel::table! {
    user (id) {
        id -> Uuid,
        username -> Text,
        salt -> Text,
        hashed_password -> Text,
        admin_regions -> Array<Text>,
        admin_level -> Nullable<Text>,
    }
}

diesel::table! {
    session (id) {
        id -> Text,
        user_id -> Uuid,
    }
}

diesel::allow_tables_to_appear_in_same_query!(session, user);
