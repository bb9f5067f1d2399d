use std::fmt::Write as _;

use strum_macros::Display;
use thiserror::Error;

use super::config::{RateTier, ScoreConfig};
use crate::lcu::models::{GameSummary, Participant, SummonerId};

/// Every match score starts here; factors adjust up or down from it.
pub const BASE_SCORE: f64 = 100.0;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("player {summoner_id} not present in match {game_id}")]
    PlayerNotInMatch { summoner_id: SummonerId, game_id: i64 },

    #[error("could not resolve team for player {summoner_id} in match {game_id}")]
    TeamNotResolved { summoner_id: SummonerId, game_id: i64 },
}

/// A scoring factor as it appears in the reason trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ScoreFactor {
    FirstBloodKill,
    FirstBloodAssist,
    PentaKill,
    QuadraKill,
    TripleKill,
    KillParticipationRank,
    GoldEarnedRank,
    DamageRank,
    DamagePerGoldRank,
    VisionScoreRank,
    CreepScore,
    KillShare,
    DamageShare,
    AssistShare,
    KdaAdjust,
}

/// Result of scoring one player in one match: the running total plus the
/// ordered list of every adjustment that produced it. Immutable once
/// computed; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    total: f64,
    reasons: Vec<(ScoreFactor, f64)>,
}

impl MatchScore {
    fn new(base: f64) -> Self {
        Self {
            total: base,
            reasons: Vec::with_capacity(8),
        }
    }

    fn add(&mut self, delta: f64, factor: ScoreFactor) {
        self.total += delta;
        self.reasons.push((factor, delta));
    }

    pub fn value(&self) -> f64 {
        self.total
    }

    pub fn reasons(&self) -> &[(ScoreFactor, f64)] {
        &self.reasons
    }

    /// Audit line for logs: `gold-earned-rank+10.00, kda-adjust-3.20`.
    pub fn reason_summary(&self) -> String {
        let mut out = String::new();
        for (factor, delta) in &self.reasons {
            if !out.is_empty() {
                out.push_str(", ");
            }
            let _ = write!(out, "{factor}{delta:+.2}");
        }
        out
    }
}

/// Scores one player's performance in one match against the given weight
/// table. Pure and deterministic: no I/O, inputs never mutated.
pub fn compute_match_score(
    summoner_id: SummonerId,
    summary: &GameSummary,
    cfg: &ScoreConfig,
) -> Result<MatchScore, ScoreError> {
    let participant_id = summary
        .participant_identities
        .iter()
        .find(|identity| identity.player.summoner_id == summoner_id)
        .map(|identity| identity.participant_id)
        .ok_or(ScoreError::PlayerNotInMatch {
            summoner_id,
            game_id: summary.game_id,
        })?;
    let me = summary
        .participants
        .iter()
        .find(|p| p.participant_id == participant_id)
        .ok_or(ScoreError::TeamNotResolved {
            summoner_id,
            game_id: summary.game_id,
        })?;
    let team: Vec<&Participant> = summary
        .participants
        .iter()
        .filter(|p| p.team_id == me.team_id)
        .collect();

    let mut team_kills = 0i64;
    let mut team_assists = 0i64;
    let mut team_hurt = 0i64;
    let mut team_gold = 0i64;
    for p in &team {
        team_kills += p.stats.kills as i64;
        team_assists += p.stats.assists as i64;
        team_hurt += p.stats.total_damage_dealt_to_champions as i64;
        team_gold += p.stats.gold_earned as i64;
    }
    let is_support = me.is_support();
    let stats = &me.stats;

    let mut score = MatchScore::new(BASE_SCORE);

    // First blood, kill over assist.
    if stats.first_blood_kill {
        score.add(cfg.first_blood[0], ScoreFactor::FirstBloodKill);
    } else if stats.first_blood_assist {
        score.add(cfg.first_blood[1], ScoreFactor::FirstBloodAssist);
    }

    // Highest multi-kill tier only.
    if stats.penta_kills > 0 {
        score.add(cfg.penta_kills[0], ScoreFactor::PentaKill);
    } else if stats.quadra_kills > 0 {
        score.add(cfg.quadra_kills[0], ScoreFactor::QuadraKill);
    } else if stats.triple_kills > 0 {
        score.add(cfg.triple_kills[0], ScoreFactor::TripleKill);
    }

    // Kill participation rank.
    if team_kills > 0 {
        let participation =
            |p: &Participant| (p.stats.kills + p.stats.assists) as f64 / team_kills as f64;
        match rank_among(&team, participation(me), participation) {
            1 => score.add(
                cfg.join_team_rate_rank[0],
                ScoreFactor::KillParticipationRank,
            ),
            2 => score.add(
                cfg.join_team_rate_rank[1],
                ScoreFactor::KillParticipationRank,
            ),
            4 => score.add(
                -cfg.join_team_rate_rank[2],
                ScoreFactor::KillParticipationRank,
            ),
            5 => score.add(
                -cfg.join_team_rate_rank[3],
                ScoreFactor::KillParticipationRank,
            ),
            _ => {}
        }
    }

    // Gold earned rank; supports are exempt from the bottom-rank penalties.
    if team_gold > 0 {
        let gold = |p: &Participant| p.stats.gold_earned as f64;
        match rank_among(&team, gold(me), gold) {
            1 => score.add(cfg.gold_earned_rank[0], ScoreFactor::GoldEarnedRank),
            2 => score.add(cfg.gold_earned_rank[1], ScoreFactor::GoldEarnedRank),
            4 if !is_support => score.add(-cfg.gold_earned_rank[2], ScoreFactor::GoldEarnedRank),
            5 if !is_support => score.add(-cfg.gold_earned_rank[3], ScoreFactor::GoldEarnedRank),
            _ => {}
        }
    }

    // Damage to champions rank.
    if team_hurt > 0 {
        let hurt = |p: &Participant| p.stats.total_damage_dealt_to_champions as f64;
        match rank_among(&team, hurt(me), hurt) {
            1 => score.add(cfg.hurt_rank[0], ScoreFactor::DamageRank),
            2 => score.add(cfg.hurt_rank[1], ScoreFactor::DamageRank),
            _ => {}
        }
    }

    // Gold-to-damage efficiency rank.
    if team_gold > 0 && team_hurt > 0 {
        let efficiency = |p: &Participant| {
            p.stats.total_damage_dealt_to_champions as f64 / p.stats.gold_earned as f64
        };
        match rank_among(&team, efficiency(me), efficiency) {
            1 => score.add(cfg.money_to_hurt_rate_rank[0], ScoreFactor::DamagePerGoldRank),
            2 => score.add(cfg.money_to_hurt_rate_rank[1], ScoreFactor::DamagePerGoldRank),
            _ => {}
        }
    }

    // Vision score rank.
    {
        let vision = |p: &Participant| p.stats.vision_score as f64;
        match rank_among(&team, vision(me), vision) {
            1 => score.add(cfg.vision_score_rank[0], ScoreFactor::VisionScoreRank),
            2 => score.add(cfg.vision_score_rank[1], ScoreFactor::VisionScoreRank),
            _ => {}
        }
    }

    // Creep score per minute, first qualifying tier.
    {
        let minutes = (summary.game_duration / 60).max(1);
        let cs_per_minute = stats.total_minions_killed as i64 / minutes;
        for tier in &cfg.minions_killed {
            if cs_per_minute >= tier[0] as i64 {
                score.add(tier[1], ScoreFactor::CreepScore);
                break;
            }
        }
    }

    // Share-of-team-total tiered bonuses. All three inner tables gate on the
    // player's kill count, matching the reference tables these were built
    // against.
    if team_kills > 0 {
        let rate = stats.kills as f64 * 100.0 / team_kills as f64;
        nested_rate_bonus(&mut score, &cfg.kill_rate, rate, stats.kills, ScoreFactor::KillShare);
    }
    if team_hurt > 0 {
        let rate = stats.total_damage_dealt_to_champions as f64 * 100.0 / team_hurt as f64;
        nested_rate_bonus(&mut score, &cfg.hurt_rate, rate, stats.kills, ScoreFactor::DamageShare);
    }
    if team_assists > 0 {
        let rate = stats.assists as f64 * 100.0 / team_assists as f64;
        nested_rate_bonus(
            &mut score,
            &cfg.assist_rate,
            rate,
            stats.kills,
            ScoreFactor::AssistShare,
        );
    }

    // Continuous KDA smoothing term, applied unconditionally.
    let participation = if team_kills > 0 {
        (stats.kills + stats.assists) as f64 / team_kills as f64
    } else {
        1.0
    };
    let deaths = stats.deaths.max(1) as f64;
    let kda_delta = ((stats.kills + stats.assists) as f64 / deaths - cfg.adjust_kda[0]
        + (stats.kills - stats.deaths) as f64 / cfg.adjust_kda[1])
        * participation;
    score.add(kda_delta, ScoreFactor::KdaAdjust);

    Ok(score)
}

/// 1-indexed rank by strict-greater comparison: ties do not advance rank.
fn rank_among<F>(team: &[&Participant], mine: f64, metric: F) -> usize
where
    F: Fn(&Participant) -> f64,
{
    1 + team.iter().filter(|p| metric(p) > mine).count()
}

/// First outer tier whose rate limit the share exceeds is final, whether or
/// not an inner kill floor matches inside it.
fn nested_rate_bonus(
    score: &mut MatchScore,
    table: &[RateTier],
    rate_pct: f64,
    kills: i32,
    factor: ScoreFactor,
) {
    for tier in table {
        if rate_pct > tier.rate_limit {
            for conf in &tier.score_conf {
                if kills as f64 > conf[0] {
                    score.add(conf[1], factor);
                    break;
                }
            }
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcu::models::{
        GameSummary, IdentityPlayer, Participant, ParticipantIdentity, ParticipantStats, Timeline,
    };
    use rstest::rstest;

    fn stats(kills: i32, deaths: i32, assists: i32) -> ParticipantStats {
        ParticipantStats {
            kills,
            deaths,
            assists,
            ..Default::default()
        }
    }

    fn participant(id: i32, team_id: i32, stats: ParticipantStats) -> Participant {
        Participant {
            participant_id: id,
            team_id,
            timeline: Timeline::default(),
            stats,
        }
    }

    fn identity(participant_id: i32, summoner_id: i64) -> ParticipantIdentity {
        ParticipantIdentity {
            participant_id,
            player: IdentityPlayer {
                summoner_id,
                summoner_name: format!("player-{summoner_id}"),
            },
        }
    }

    fn summary(participants: Vec<Participant>, identities: Vec<ParticipantIdentity>) -> GameSummary {
        GameSummary {
            game_id: 1,
            queue_id: 420,
            game_duration: 1800,
            game_creation_date: None,
            participants,
            participant_identities: identities,
        }
    }

    /// Five-player team where participant 1 (summoner 100) leads every stat.
    fn five_player_summary() -> GameSummary {
        let mut participants = vec![];
        let mut identities = vec![];
        for i in 1..=5 {
            let mut s = stats(6 - i, i, 10 - i);
            s.gold_earned = 15_000 - (i * 1000);
            s.total_damage_dealt_to_champions = 30_000 - (i * 2000);
            s.vision_score = 60 - (i * 5);
            s.total_minions_killed = 200 - (i * 20);
            participants.push(participant(i, 100, s));
            identities.push(identity(i, 100 + i as i64));
        }
        summary(participants, identities)
    }

    #[test]
    fn missing_player_is_a_hard_error() {
        let err = compute_match_score(999, &five_player_summary(), &ScoreConfig::default())
            .expect_err("player is absent");
        assert!(matches!(err, ScoreError::PlayerNotInMatch { .. }));
    }

    #[test]
    fn identical_inputs_give_identical_scores_and_trails() {
        let summary = five_player_summary();
        let cfg = ScoreConfig::default();
        let a = compute_match_score(101, &summary, &cfg).expect("score");
        let b = compute_match_score(101, &summary, &cfg).expect("score");
        assert_eq!(a.value(), b.value());
        assert_eq!(a.reasons(), b.reasons());
    }

    #[test]
    fn scoring_never_mutates_the_summary() {
        let summary = five_player_summary();
        let before = format!("{summary:?}");
        compute_match_score(101, &summary, &ScoreConfig::default()).expect("score");
        assert_eq!(before, format!("{summary:?}"));
    }

    #[test]
    fn sole_participant_with_zero_deaths_scores_finite() {
        let mut s = stats(10, 0, 5);
        s.gold_earned = 12_000;
        s.total_damage_dealt_to_champions = 20_000;
        let summary = summary(vec![participant(1, 100, s)], vec![identity(1, 7)]);

        let score = compute_match_score(7, &summary, &ScoreConfig::default()).expect("score");
        assert!(score.value().is_finite());
    }

    #[test]
    fn zero_team_totals_apply_no_rank_bonuses() {
        let summary = summary(
            (1..=5)
                .map(|i| participant(i, 100, ParticipantStats::default()))
                .collect(),
            (1..=5).map(|i| identity(i, 100 + i as i64)).collect(),
        );
        let score = compute_match_score(101, &summary, &ScoreConfig::default()).expect("score");

        let factors: Vec<ScoreFactor> = score.reasons().iter().map(|(f, _)| *f).collect();
        for absent in [
            ScoreFactor::KillParticipationRank,
            ScoreFactor::GoldEarnedRank,
            ScoreFactor::DamageRank,
            ScoreFactor::DamagePerGoldRank,
            ScoreFactor::KillShare,
            ScoreFactor::DamageShare,
            ScoreFactor::AssistShare,
        ] {
            assert!(!factors.contains(&absent), "{absent} should be skipped");
        }
        // Vision is unguarded: a five-way tie still ranks everyone first.
        assert!(factors.contains(&ScoreFactor::VisionScoreRank));
        assert!(score.value().is_finite());
    }

    #[test]
    fn top_gold_earns_the_first_rank_bonus_exactly_once() {
        let cfg = ScoreConfig::default();
        let score = compute_match_score(101, &five_player_summary(), &cfg).expect("score");
        let gold_deltas: Vec<f64> = score
            .reasons()
            .iter()
            .filter(|(f, _)| *f == ScoreFactor::GoldEarnedRank)
            .map(|(_, d)| *d)
            .collect();
        assert_eq!(gold_deltas, vec![cfg.gold_earned_rank[0]]);
    }

    #[test]
    fn bottom_gold_penalty_is_waived_for_supports() {
        let cfg = ScoreConfig::default();
        let base = five_player_summary();

        let penalty_of = |summary: &GameSummary| {
            compute_match_score(105, summary, &cfg)
                .expect("score")
                .reasons()
                .iter()
                .find(|(f, _)| *f == ScoreFactor::GoldEarnedRank)
                .map(|(_, d)| *d)
        };
        assert_eq!(penalty_of(&base), Some(-cfg.gold_earned_rank[3]));

        let mut supported = base.clone();
        supported.participants[4].timeline = Timeline {
            lane: "BOTTOM".into(),
            role: "DUO_SUPPORT".into(),
        };
        assert_eq!(penalty_of(&supported), None);
    }

    #[test]
    fn first_blood_kill_takes_precedence_over_assist() {
        let cfg = ScoreConfig::default();
        let mut s = stats(3, 1, 2);
        s.first_blood_kill = true;
        s.first_blood_assist = true;
        let summary = summary(vec![participant(1, 100, s)], vec![identity(1, 7)]);

        let score = compute_match_score(7, &summary, &cfg).expect("score");
        let factors: Vec<ScoreFactor> = score.reasons().iter().map(|(f, _)| *f).collect();
        assert!(factors.contains(&ScoreFactor::FirstBloodKill));
        assert!(!factors.contains(&ScoreFactor::FirstBloodAssist));
    }

    #[test]
    fn only_the_highest_multi_kill_tier_counts() {
        let cfg = ScoreConfig::default();
        let mut s = stats(12, 2, 1);
        s.penta_kills = 1;
        s.triple_kills = 2;
        let summary = summary(vec![participant(1, 100, s)], vec![identity(1, 7)]);

        let score = compute_match_score(7, &summary, &cfg).expect("score");
        let factors: Vec<ScoreFactor> = score.reasons().iter().map(|(f, _)| *f).collect();
        assert!(factors.contains(&ScoreFactor::PentaKill));
        assert!(!factors.contains(&ScoreFactor::QuadraKill));
        assert!(!factors.contains(&ScoreFactor::TripleKill));
    }

    #[rstest]
    #[case(&[1000.0, 2000.0, 3000.0, 4000.0], 5000.0, 1)]
    #[case(&[1000.0, 2000.0, 3000.0, 5000.0], 4000.0, 2)]
    #[case(&[5000.0, 4000.0, 3000.0, 2000.0], 1000.0, 5)]
    // Ties do not advance rank.
    #[case(&[3000.0, 3000.0, 3000.0, 3000.0], 3000.0, 1)]
    #[case(&[4000.0, 4000.0, 2000.0, 2000.0], 3000.0, 3)]
    fn rank_is_one_plus_strictly_greater_teammates(
        #[case] others: &[f64],
        #[case] mine: f64,
        #[case] expected: usize,
    ) {
        let mut participants = vec![{
            let mut s = ParticipantStats::default();
            s.gold_earned = mine as i32;
            participant(1, 100, s)
        }];
        for (i, gold) in others.iter().enumerate() {
            let mut s = ParticipantStats::default();
            s.gold_earned = *gold as i32;
            participants.push(participant(i as i32 + 2, 100, s));
        }
        let team: Vec<&Participant> = participants.iter().collect();
        let rank = rank_among(&team, mine, |p| p.stats.gold_earned as f64);
        assert_eq!(rank, expected);
    }

    #[test]
    fn kill_share_uses_the_first_matching_outer_tier_only() {
        let cfg = ScoreConfig::default();

        // 60% share with 16 kills: first tier, first kill floor.
        let mut score = MatchScore::new(BASE_SCORE);
        nested_rate_bonus(&mut score, &cfg.kill_rate, 60.0, 16, ScoreFactor::KillShare);
        assert_eq!(score.reasons(), &[(ScoreFactor::KillShare, 40.0)]);

        // 45% share with 12 kills: second tier, middle floor.
        let mut score = MatchScore::new(BASE_SCORE);
        nested_rate_bonus(&mut score, &cfg.kill_rate, 45.0, 12, ScoreFactor::KillShare);
        assert_eq!(score.reasons(), &[(ScoreFactor::KillShare, 10.0)]);

        // 60% share with too few kills: the outer tier is consumed and no
        // lower tier is consulted.
        let mut score = MatchScore::new(BASE_SCORE);
        nested_rate_bonus(&mut score, &cfg.kill_rate, 60.0, 4, ScoreFactor::KillShare);
        assert!(score.reasons().is_empty());
    }

    #[test]
    fn creep_score_tier_survives_a_sub_minute_match() {
        let cfg = ScoreConfig::default();
        let mut s = stats(1, 0, 0);
        s.total_minions_killed = 30;
        let mut summary = summary(vec![participant(1, 100, s)], vec![identity(1, 7)]);
        summary.game_duration = 30;

        // 30 cs over a clamped single minute clears the top tier.
        let score = compute_match_score(7, &summary, &cfg).expect("score");
        let cs: Vec<f64> = score
            .reasons()
            .iter()
            .filter(|(f, _)| *f == ScoreFactor::CreepScore)
            .map(|(_, d)| *d)
            .collect();
        assert_eq!(cs, vec![cfg.minions_killed[0][1]]);
    }

    #[test]
    fn kda_adjustment_reproduces_the_algebraic_form() {
        let cfg = ScoreConfig::default();
        // Two-player team: subject 4/2/6, teammate 6/3/1. Team kills = 10.
        let summary = summary(
            vec![
                participant(1, 100, stats(4, 2, 6)),
                participant(2, 100, stats(6, 3, 1)),
            ],
            vec![identity(1, 7), identity(2, 8)],
        );
        let score = compute_match_score(7, &summary, &cfg).expect("score");

        let participation = 10.0 / 10.0;
        let expected = ((4.0 + 6.0) / 2.0 - cfg.adjust_kda[0] + (4.0 - 2.0) / cfg.adjust_kda[1])
            * participation;
        let (_, actual) = score
            .reasons()
            .iter()
            .find(|(f, _)| *f == ScoreFactor::KdaAdjust)
            .expect("kda term is unconditional");
        assert!((actual - expected).abs() < 1e-12);
    }

    #[test]
    fn reason_summary_orders_factors_as_applied() {
        let mut score = MatchScore::new(BASE_SCORE);
        score.add(10.0, ScoreFactor::GoldEarnedRank);
        score.add(-3.2, ScoreFactor::KdaAdjust);
        assert_eq!(score.reason_summary(), "gold-earned-rank+10.00, kda-adjust-3.20");
        assert!((score.value() - 106.8).abs() < 1e-12);
    }
}
