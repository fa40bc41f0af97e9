use serde::{Deserialize, Serialize};
use serde_json::Value;

// The content-source collaborator, specified at its interface only. Upstream
// records arrive with inconsistent field names, so the adapter fns here probe
// the known alternatives once at the boundary and the rest of the crate only
// ever sees the narrow types.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Listing {
    Recent,
    Trending,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PostRef {
    pub id: String,
    pub community: String,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CommentRef {
    pub id: String,
    pub author: String,
    pub body: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CommunityInfo {
    pub name: String,
    /// `None` when the source omitted or failed the count lookup. Never
    /// defaulted to zero: unknown and unpopular are different answers.
    pub members: Option<u64>,
    pub adult: bool,
}

fn probe_str(raw: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| raw.get(*n).and_then(Value::as_str))
        .map(str::to_string)
}

fn probe_u64(raw: &Value, names: &[&str]) -> Option<u64> {
    names.iter().find_map(|n| raw.get(*n).and_then(Value::as_u64))
}

fn probe_bool(raw: &Value, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|n| raw.get(*n).and_then(Value::as_bool))
}

impl PostRef {
    pub fn from_value(raw: &Value) -> PostRef {
        PostRef {
            id: probe_str(raw, &["id", "name", "post_id"]).unwrap_or_default(),
            community: probe_str(raw, &["subreddit", "community", "subreddit_name"])
                .unwrap_or_default(),
            title: probe_str(raw, &["title"]).unwrap_or_default(),
            body: probe_str(raw, &["selftext", "body", "text"]).unwrap_or_default(),
        }
    }
}

impl CommentRef {
    pub fn from_value(raw: &Value) -> CommentRef {
        CommentRef {
            id: probe_str(raw, &["id", "name", "comment_id"]).unwrap_or_default(),
            author: probe_str(raw, &["author", "author_name"]).unwrap_or_default(),
            body: probe_str(raw, &["body", "text"]).unwrap_or_default(),
        }
    }
}

impl CommunityInfo {
    pub fn from_value(name: &str, raw: &Value) -> CommunityInfo {
        CommunityInfo {
            name: name.to_string(),
            members: probe_u64(raw, &["subscribers", "subscriber_count", "members", "num_members"]),
            adult: probe_bool(raw, &["over18", "over_18", "nsfw", "is_nsfw"]).unwrap_or(false),
        }
    }
}

/// Read-only collaborator the puzzle builder samples from. Per-call failures
/// are opaque to the core; it either skips the candidate or surfaces a typed
/// build error.
#[allow(async_fn_in_trait)]
pub trait ContentSource {
    /// Posts across all communities, capped at `limit`.
    async fn global_posts(&self, listing: Listing, limit: usize) -> anyhow::Result<Vec<PostRef>>;

    /// Posts within one named community, capped at `limit`.
    async fn community_posts(
        &self,
        community: &str,
        listing: Listing,
        limit: usize,
    ) -> anyhow::Result<Vec<PostRef>>;

    /// Comments on a post, capped at `limit`.
    async fn post_comments(&self, post_id: &str, limit: usize) -> anyhow::Result<Vec<CommentRef>>;

    /// Metadata for a named community.
    async fn community_info(&self, name: &str) -> anyhow::Result<CommunityInfo>;

    /// Stable id of the requesting user, if the source knows one.
    async fn current_user(&self) -> anyhow::Result<Option<String>>;
}
