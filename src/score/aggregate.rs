use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use super::config::ScoreConfig;
use super::engine::{self, compute_match_score};
use crate::lcu::models::{GameInfo, GameSummary, KdaTriple, Summoner, SummonerId, UserScore};
use crate::lcu::LcuError;

/// Score handed out when a player's history is unavailable or empty.
pub const DEFAULT_SCORE: f64 = engine::BASE_SCORE;

/// How many most-recent matches are considered per player.
const MATCH_WINDOW: usize = 20;
/// Matches created within this trailing window count as the current session.
const RECENT_WINDOW_HOURS: i64 = 5;
const RECENT_WEIGHT: f64 = 0.8;
const OLDER_WEIGHT: f64 = 0.2;

const SUMMARY_FETCH_ATTEMPTS: u32 = 5;
const SUMMARY_FETCH_RETRY_DELAY: Duration = Duration::from_millis(10);
/// Requests/sec ceiling against the local client API, shared by every
/// in-flight summary fetch.
const SUMMARY_REQUESTS_PER_SEC: u32 = 50;

/// Read-side seam over the match-history endpoints, so aggregation is
/// testable without a running client.
#[async_trait]
pub trait MatchSource: Send + Sync {
    async fn summoner_by_id(&self, id: SummonerId) -> Result<Summoner, LcuError>;

    /// Most-recent-first window of the player's match list.
    async fn recent_matches(
        &self,
        id: SummonerId,
        begin: usize,
        count: usize,
    ) -> Result<Vec<GameInfo>, LcuError>;

    async fn match_summary(&self, game_id: i64) -> Result<GameSummary, LcuError>;
}

/// Fetches match history for players, scores each match, and folds the
/// per-match scores into a recency-weighted aggregate.
pub struct Aggregator {
    source: Arc<dyn MatchSource>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn MatchSource>) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(SUMMARY_REQUESTS_PER_SEC).expect("nonzero request ceiling"),
        );
        Self {
            source,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Aggregate score for one player. Never fails: any upstream failure
    /// degrades to the default score so callers can always deliver a full
    /// team summary.
    pub async fn compute_user_score(
        &self,
        summoner_id: SummonerId,
        cfg: &ScoreConfig,
        now: DateTime<Utc>,
    ) -> UserScore {
        let mut user_score = UserScore {
            summoner_id,
            summoner_name: String::new(),
            score: DEFAULT_SCORE,
            curr_kda: Vec::new(),
        };
        match self.source.summoner_by_id(summoner_id).await {
            Ok(summoner) => user_score.summoner_name = summoner.name(),
            Err(err) => {
                warn!(summoner_id, error = %err, "summoner lookup failed; using default score");
                return user_score;
            }
        }
        let games = match self.source.recent_matches(summoner_id, 0, MATCH_WINDOW).await {
            Ok(games) => games,
            Err(err) => {
                warn!(summoner_id, error = %err, "match list fetch failed; using default score");
                return user_score;
            }
        };

        let mut qualifying: Vec<GameInfo> = games
            .into_iter()
            .filter(|g| {
                cfg.allow_queue_ids.contains(&g.queue_id) && g.game_duration >= cfg.game_min_duration
            })
            .collect();
        // Display KDA stays most-recent-first.
        user_score.curr_kda = qualifying
            .iter()
            .filter_map(|g| g.participants.first())
            .map(|p| -> KdaTriple { [p.stats.kills, p.stats.deaths, p.stats.assists] })
            .collect();
        // Chronological (most-recent-last) for everything downstream.
        qualifying.reverse();

        let summaries = join_all(
            qualifying
                .iter()
                .map(|g| self.fetch_summary_with_retry(g.game_id)),
        )
        .await;

        let mut scored: Vec<(f64, DateTime<Utc>)> = Vec::with_capacity(summaries.len());
        for summary in summaries.into_iter().flatten() {
            match compute_match_score(summoner_id, &summary, cfg) {
                Ok(score) => {
                    debug!(
                        summoner_id,
                        game_id = summary.game_id,
                        score = score.value(),
                        reasons = %score.reason_summary(),
                        "scored match"
                    );
                    let created = summary.game_creation_date.unwrap_or(now);
                    scored.push((score.value(), created));
                }
                Err(err) => {
                    debug!(summoner_id, game_id = summary.game_id, error = %err, "match skipped");
                }
            }
        }

        user_score.score = weighted_score(&scored, now);
        user_score
    }

    /// Scores every player concurrently and returns the team ordered
    /// best-first. Per-player failures surface as default scores, never as
    /// missing entries.
    pub async fn compute_team_scores(
        &self,
        summoner_ids: &[SummonerId],
        cfg: &ScoreConfig,
    ) -> Vec<UserScore> {
        let now = Utc::now();
        let mut scores = join_all(
            summoner_ids
                .iter()
                .map(|id| self.compute_user_score(*id, cfg, now)),
        )
        .await;
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    async fn fetch_summary_with_retry(&self, game_id: i64) -> Option<GameSummary> {
        for attempt in 1..=SUMMARY_FETCH_ATTEMPTS {
            self.limiter.until_ready().await;
            match self.source.match_summary(game_id).await {
                Ok(summary) => return Some(summary),
                Err(err) if attempt < SUMMARY_FETCH_ATTEMPTS => {
                    debug!(game_id, attempt, error = %err, "summary fetch retry");
                    tokio::time::sleep(SUMMARY_FETCH_RETRY_DELAY).await;
                }
                Err(err) => {
                    warn!(game_id, error = %err, "summary fetch failed; match dropped");
                }
            }
        }
        None
    }
}

/// Recency-weighted mean: the current session (matches created within the
/// trailing window of `now`) carries 0.8, older matches 0.2. An empty bucket
/// falls back to the overall mean; no matches at all falls back to the
/// default score.
pub fn weighted_score(scored: &[(f64, DateTime<Utc>)], now: DateTime<Utc>) -> f64 {
    if scored.is_empty() {
        return DEFAULT_SCORE;
    }
    let window = chrono::Duration::hours(RECENT_WINDOW_HOURS);
    let (mut recent, mut older): (Vec<f64>, Vec<f64>) = (Vec::new(), Vec::new());
    for (score, created) in scored {
        if now < *created + window {
            recent.push(*score);
        } else {
            older.push(*score);
        }
    }
    let mean = |scores: &[f64]| scores.iter().sum::<f64>() / scores.len() as f64;
    let overall = mean(&scored.iter().map(|(s, _)| *s).collect::<Vec<_>>());
    let recent_avg = if recent.is_empty() { overall } else { mean(&recent) };
    let older_avg = if older.is_empty() { overall } else { mean(&older) };
    RECENT_WEIGHT * recent_avg + OLDER_WEIGHT * older_avg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(now: DateTime<Utc>, hours_ago: i64) -> DateTime<Utc> {
        now - chrono::Duration::hours(hours_ago)
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn mixes_recent_and_older_buckets_80_20() {
        let now = fixed_now();
        let scored = vec![(120.0, at(now, 1)), (90.0, at(now, 10))];
        assert!((weighted_score(&scored, now) - 114.0).abs() < 1e-12);
    }

    #[test]
    fn empty_recent_bucket_reduces_to_the_overall_mean() {
        let now = fixed_now();
        let scored = vec![(90.0, at(now, 10)), (110.0, at(now, 20))];
        assert!((weighted_score(&scored, now) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn empty_older_bucket_reduces_to_the_recent_mean() {
        let now = fixed_now();
        let scored = vec![(120.0, at(now, 1)), (100.0, at(now, 2))];
        assert!((weighted_score(&scored, now) - 110.0).abs() < 1e-12);
    }

    #[test]
    fn no_matches_fall_back_to_the_default_score() {
        assert_eq!(weighted_score(&[], fixed_now()), DEFAULT_SCORE);
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let now = fixed_now();
        // Created exactly five hours ago: `now < created + 5h` is false, so
        // the match is older.
        let scored = vec![(120.0, at(now, 5)), (100.0, at(now, 1))];
        assert!((weighted_score(&scored, now) - (0.8 * 100.0 + 0.2 * 120.0)).abs() < 1e-12);
    }
}
