use serde::Serialize;
use uuid::Uuid;

use crate::entities::linked_accounts::LinkedAccountEntity;
use crate::entities::post_shares::PostShareEntity;
use crate::entities::posts::PostEntity;
use crate::value_objects::enums::platforms::Platform;

/// Validated input for one fan-out request.
#[derive(Debug, Clone)]
pub struct ComposePostModel {
    pub content: String,
    pub media_url: Option<String>,
    pub platforms: Vec<Platform>,
}

/// Per-platform outcome of one fan-out. One entry per attempted platform;
/// platforms without a linked account end up in `skipped_platforms` instead.
#[derive(Debug, Clone, Serialize)]
pub struct ShareOutcome {
    pub platform: Platform,
    pub handle: String,
    pub is_successful: bool,
    pub platform_post_id: Option<String>,
    pub platform_url: Option<String>,
    pub error: Option<String>,
}

/// A share joined with the account it went to; used by history listings and
/// by the analytics pulls that need the account's token alongside the share.
#[derive(Debug, Clone)]
pub struct ShareWithAccount {
    pub share: PostShareEntity,
    pub account: LinkedAccountEntity,
}

#[derive(Debug, Clone)]
pub struct PostWithShares {
    pub post: PostEntity,
    pub shares: Vec<PostShareEntity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub post_id: Uuid,
    pub outcomes: Vec<ShareOutcome>,
    pub skipped_platforms: Vec<Platform>,
    /// True when at least one platform accepted the post.
    pub succeeded: bool,
}
