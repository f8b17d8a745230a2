diesel::table! {
    linked_accounts (id) {
        id -> Uuid,
        user_id -> Uuid,
        platform -> Text,
        account_id -> Text,
        handle -> Text,
        access_token -> Text,
        refresh_token -> Nullable<Text>,
        token_type -> Text,
        expires_at -> Nullable<Timestamptz>,
        is_active -> Bool,
        is_verified -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        last_used_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    posts (id) {
        id -> Uuid,
        user_id -> Uuid,
        content -> Text,
        media_url -> Nullable<Text>,
        scheduled_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    post_shares (id) {
        id -> Uuid,
        post_id -> Uuid,
        linked_account_id -> Uuid,
        platform_post_id -> Nullable<Text>,
        platform_url -> Nullable<Text>,
        is_successful -> Bool,
        error -> Nullable<Text>,
        shared_at -> Timestamptz,
    }
}

diesel::table! {
    post_analytics (id) {
        id -> Uuid,
        post_share_id -> Uuid,
        likes -> Int4,
        comments -> Int4,
        shares -> Int4,
        views -> Int4,
        impressions -> Int4,
        clicks -> Int4,
        engagement_rate -> Float8,
        collected_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    account_analytics (id) {
        id -> Uuid,
        linked_account_id -> Uuid,
        followers -> Int4,
        following -> Int4,
        total_posts -> Int4,
        total_likes -> Int4,
        total_comments -> Int4,
        total_shares -> Int4,
        followers_delta -> Int4,
        collected_at -> Timestamptz,
    }
}

diesel::joinable!(post_shares -> posts (post_id));
diesel::joinable!(post_shares -> linked_accounts (linked_account_id));
diesel::joinable!(post_analytics -> post_shares (post_share_id));
diesel::joinable!(account_analytics -> linked_accounts (linked_account_id));

diesel::allow_tables_to_appear_in_same_query!(
    linked_accounts,
    posts,
    post_shares,
    post_analytics,
    account_analytics,
);
