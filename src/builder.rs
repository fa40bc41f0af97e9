use std::collections::HashSet;

use thiserror::Error;

use crate::constants::*;
use crate::filters::{classify_community, comment_selectable, comment_usable, CommunityFit};
use crate::rng::{pick, seed, Sampler};
use crate::source::{CommentRef, CommunityInfo, ContentSource, Listing, PostRef};
use crate::types::{DailyPuzzle, DayKey, Mode};

// Puzzle construction. The result is a pure function of (day, mode) plus
// whatever the content source returns: per-candidate lookup failures are
// skipped, exhaustion is fatal and never retried here, because a retry against
// upstream state that changed mid-scan would break the daily contract.

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("global feed unavailable: {0}")]
    FeedUnavailable(anyhow::Error),
    #[error("no candidate communities in the global feed")]
    NoCandidates,
    #[error("no posts found in community {0}")]
    NoPosts(String),
    #[error("no usable comments on post {0}")]
    NoComments(String),
    #[error("content source error: {0}")]
    Source(anyhow::Error),
}

/// Build the puzzle for one (day, mode). The caller persists the result.
pub async fn build_puzzle<C: ContentSource>(
    source: &C,
    day: DayKey,
    mode: Mode,
) -> Result<DailyPuzzle, BuildError> {
    let posts = global_window(source).await?;
    let mut communities = dedupe_communities(&posts);
    if communities.is_empty() {
        return Err(BuildError::NoCandidates);
    }
    // Each mode scans the candidates in its own order, which keeps the three
    // tiers from converging on the same community.
    Sampler::new(seed(&format!("{day}|{mode}|scan"))).shuffle(&mut communities);

    let community = match qualify(source, &communities, day, mode).await {
        Some(name) => name,
        None => {
            // The scan was a washout; the daily contract still has to hold,
            // so fall back to a deterministic pick over the full list.
            log::warn!("[build] scan exhausted for {day}/{mode}, picking from full candidate list");
            communities[pick(communities.len(), seed(&format!("{day}|{mode}|any")))].clone()
        }
    };

    let post = pick_post(source, &community, day, mode).await?;
    let comment = pick_comment(source, &post, &community, day, mode).await?;

    log::info!(
        "[build] {day}/{mode} -> {community} post:{} comment:{}",
        post.id,
        comment.id
    );
    Ok(DailyPuzzle {
        day,
        mode,
        community,
        post_id: post.id,
        post_title: post.title,
        post_body: post.body,
        comment_id: comment.id,
        comment_body: comment.body,
    })
}

/// Recent posts across all communities, falling back to the trending listing
/// when the recent one fails or comes back empty.
async fn global_window<C: ContentSource>(source: &C) -> Result<Vec<PostRef>, BuildError> {
    match source.global_posts(Listing::Recent, GLOBAL_FEED_LIMIT).await {
        Ok(posts) if !posts.is_empty() => Ok(posts),
        Ok(_) => source
            .global_posts(Listing::Trending, GLOBAL_FEED_LIMIT)
            .await
            .map_err(BuildError::FeedUnavailable),
        Err(err) => {
            log::debug!("[build] recent listing failed, trying trending: {err}");
            source
                .global_posts(Listing::Trending, GLOBAL_FEED_LIMIT)
                .await
                .map_err(BuildError::FeedUnavailable)
        }
    }
}

/// Unique originating communities in first-seen order.
fn dedupe_communities(posts: &[PostRef]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for post in posts {
        if post.community.is_empty() {
            continue;
        }
        if seen.insert(post.community.clone()) {
            unique.push(post.community.clone());
        }
    }
    unique
}

/// Scan a bounded prefix of the shuffled candidates and choose a community
/// under the mode's gates. `None` means the whole scan came up empty.
async fn qualify<C: ContentSource>(
    source: &C,
    communities: &[String],
    day: DayKey,
    mode: Mode,
) -> Option<String> {
    let scan = &communities[..communities.len().min(COMMUNITY_SCAN_LIMIT)];

    if mode == Mode::Hard {
        // Hardest tier: the first safe candidate in scan order, no gates.
        for name in scan {
            match source.community_info(name).await {
                Ok(info) if classify_community(&info, mode) == CommunityFit::Qualified => {
                    return Some(name.clone());
                }
                Ok(_) => {}
                Err(err) => log::debug!("[build] skipping {name}: {err}"),
            }
        }
        return None;
    }

    let mut qualified: Vec<CommunityInfo> = Vec::new();
    let mut unknown_safe: Vec<CommunityInfo> = Vec::new();
    for name in scan {
        let info = match source.community_info(name).await {
            Ok(info) => info,
            Err(err) => {
                log::debug!("[build] skipping {name}: {err}");
                continue;
            }
        };
        match classify_community(&info, mode) {
            CommunityFit::Qualified => {
                qualified.push(info);
                if qualified.len() >= QUALIFY_CAP {
                    break;
                }
            }
            CommunityFit::UnknownSafe => {
                if unknown_safe.len() < QUALIFY_CAP {
                    unknown_safe.push(info);
                }
            }
            CommunityFit::Rejected => {}
        }
    }

    let mut pool = if qualified.is_empty() {
        unknown_safe
    } else {
        qualified
    };
    if pool.is_empty() {
        return None;
    }
    if mode == Mode::Easy && pool.len() > 1 {
        // Restrict the easy pick to the larger-membership half of the bucket
        // so the easy tier stays noticeably easy.
        pool.sort_by(|a, b| b.members.cmp(&a.members).then_with(|| a.name.cmp(&b.name)));
        pool.truncate(pool.len().div_ceil(2));
    }
    let index = pick(pool.len(), seed(&format!("{day}|{mode}|pick")));
    Some(pool[index].name.clone())
}

async fn pick_post<C: ContentSource>(
    source: &C,
    community: &str,
    day: DayKey,
    mode: Mode,
) -> Result<PostRef, BuildError> {
    let mut posts = source
        .community_posts(community, Listing::Recent, COMMUNITY_POSTS_LIMIT)
        .await
        .map_err(BuildError::Source)?;
    if posts.is_empty() {
        return Err(BuildError::NoPosts(community.to_string()));
    }
    let index = pick(posts.len(), seed(&format!("{day}|{mode}|{community}|post")));
    Ok(posts.swap_remove(index))
}

async fn pick_comment<C: ContentSource>(
    source: &C,
    post: &PostRef,
    community: &str,
    day: DayKey,
    mode: Mode,
) -> Result<CommentRef, BuildError> {
    let comments = source
        .post_comments(&post.id, COMMENT_FETCH_LIMIT)
        .await
        .map_err(BuildError::Source)?;
    let strict: Vec<&CommentRef> = comments
        .iter()
        .filter(|c| comment_selectable(c, community))
        .collect();
    let pool = if strict.is_empty() {
        // Every comment looked promotional or self-referential; loosen to
        // anything that still has text rather than failing the day.
        log::debug!("[build] no strictly usable comments on {}, loosening", post.id);
        comments
            .iter()
            .filter(|c| comment_usable(&c.body))
            .collect()
    } else {
        strict
    };
    if pool.is_empty() {
        return Err(BuildError::NoComments(post.id.clone()));
    }
    let index = pick(
        pool.len(),
        seed(&format!("{day}|{mode}|{community}|comment")),
    );
    Ok(pool[index].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::{comment, community, post, MockSource};
    use std::sync::atomic::Ordering;

    fn day() -> DayKey {
        DayKey::parse("2024-01-10").unwrap()
    }

    #[tokio::test]
    async fn repeated_builds_are_identical() {
        let source = MockSource::single("castiron", Some(1_000_000));
        let first = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        let second = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.community, "castiron");
        assert_eq!(first.day, day());
        assert_eq!(first.mode, Mode::Easy);
    }

    #[tokio::test]
    async fn known_counts_beat_unknown_counts_for_gated_tiers() {
        let mut source = MockSource::single("bigknown", Some(2_000_000));
        source
            .communities
            .insert("mystery".to_string(), community("mystery", None, false));
        source
            .recent
            .push(post("m-p1", "mystery", "Elsewhere", "Some text."));

        let puzzle = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        assert_eq!(puzzle.community, "bigknown");
    }

    #[tokio::test]
    async fn unknown_safe_bucket_is_used_when_nothing_qualifies() {
        let mut source = MockSource::default();
        source.add_community("harbor", None);
        source.add_community("lantern", None);

        let puzzle = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        // all counts unknown: the easy bias sorts by name and keeps the top
        // half, so the pick is stable
        assert_eq!(puzzle.community, "harbor");
    }

    #[tokio::test]
    async fn easy_tier_lands_on_at_least_the_middle_tier_population() {
        let mut source = MockSource::default();
        source.add_community("alpha", Some(2_000_000));
        source.add_community("beta", Some(1_000_000));
        source.add_community("gamma", Some(60_000));
        source.add_community("delta", Some(10_000));

        let easy = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        let medium = build_puzzle(&source, day(), Mode::Medium).await.unwrap();

        let members = |name: &str| source.communities[name].members.unwrap();
        assert!(members(&easy.community) >= members(&medium.community));
        // and the easy bias pins the pick to the largest qualifying community
        assert_eq!(easy.community, "alpha");
    }

    #[tokio::test]
    async fn hard_tier_skips_adult_communities() {
        let mut source = MockSource::default();
        source.add_community("afterdark", Some(900_000));
        source
            .communities
            .insert("afterdark".to_string(), community("afterdark", Some(900_000), true));
        source.add_community("teashop", Some(1_200));

        let puzzle = build_puzzle(&source, day(), Mode::Hard).await.unwrap();
        assert_eq!(puzzle.community, "teashop");
    }

    #[tokio::test]
    async fn recent_failure_falls_back_to_trending() {
        let mut source = MockSource::single("castiron", Some(1_000_000));
        source.trending = source.recent.clone();
        source.recent.clear();
        source.fail_recent = true;

        let puzzle = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        assert_eq!(puzzle.community, "castiron");
        assert_eq!(source.global_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_feed_is_candidate_exhaustion() {
        let source = MockSource::default();
        let err = build_puzzle(&source, day(), Mode::Easy).await.unwrap_err();
        assert!(matches!(err, BuildError::NoCandidates));
    }

    #[tokio::test]
    async fn missing_posts_for_the_chosen_community_is_fatal() {
        let mut source = MockSource::single("castiron", Some(1_000_000));
        source.per_community.clear();
        let err = build_puzzle(&source, day(), Mode::Easy).await.unwrap_err();
        assert!(matches!(err, BuildError::NoPosts(name) if name == "castiron"));
    }

    #[tokio::test]
    async fn comment_pool_loosens_before_failing() {
        let mut source = MockSource::single("castiron", Some(1_000_000));
        source.comments.insert(
            "castiron-p1".to_string(),
            vec![
                comment("c1", "u", "[deleted]"),
                comment("c2", "u", "[removed]"),
                comment("c3", "u", "only10char"),
            ],
        );
        let puzzle = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        // tombstones can never surface, even from the loose pool
        assert_eq!(puzzle.comment_id, "c3");
        assert_eq!(puzzle.comment_body, "only10char");
    }

    #[tokio::test]
    async fn tombstones_only_means_no_usable_comments() {
        let mut source = MockSource::single("castiron", Some(1_000_000));
        source.comments.insert(
            "castiron-p1".to_string(),
            vec![comment("c1", "u", "[deleted]"), comment("c2", "u", "")],
        );
        let err = build_puzzle(&source, day(), Mode::Easy).await.unwrap_err();
        assert!(matches!(err, BuildError::NoComments(id) if id == "castiron-p1"));
    }

    #[tokio::test]
    async fn strict_pool_excludes_giveaway_comments() {
        let mut source = MockSource::single("castiron", Some(1_000_000));
        source.comments.insert(
            "castiron-p1".to_string(),
            vec![
                comment("c1", "u", "Everyone on castiron already answered this question."),
                comment("c2", "u", "The skillet needs another round of seasoning before use."),
            ],
        );
        let puzzle = build_puzzle(&source, day(), Mode::Easy).await.unwrap();
        assert_eq!(puzzle.comment_id, "c2");
    }
}
