use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summoner id as used across the client API.
pub type SummonerId = i64;

// Team ids on the match-history wire format
pub const TEAM_BLUE: i32 = 100;
pub const TEAM_RED: i32 = 200;

// Timeline position markers used for the support-role check
pub const LANE_BOTTOM: &str = "BOTTOM";
pub const ROLE_SUPPORT: &str = "DUO_SUPPORT";

// Chat conversation markers
pub const CONVERSATION_CHAMP_SELECT: &str = "championSelect";
pub const CONVERSATION_MSG_SYSTEM: &str = "system";
pub const JOINED_ROOM_MSG: &str = "joined_room";

// Champ-select action kinds
pub const ACTION_PICK: &str = "pick";
pub const ACTION_BAN: &str = "ban";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summoner {
    pub summoner_id: SummonerId,
    pub display_name: String,
    pub game_name: String,
    pub tag_line: String,
    pub puuid: String,
    pub summoner_level: i64,
}

impl Summoner {
    /// Preferred human-facing name: modern riot-id first, legacy name as
    /// fallback.
    pub fn name(&self) -> String {
        if !self.game_name.is_empty() {
            if self.tag_line.is_empty() {
                self.game_name.clone()
            } else {
                format!("{}#{}", self.game_name, self.tag_line)
            }
        } else {
            self.display_name.clone()
        }
    }
}

/// Response of the match-list endpoint. The interesting list is nested one
/// level deep on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchList {
    pub games: MatchListGames,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchListGames {
    pub games: Vec<GameInfo>,
}

/// One entry of a player's match list. Match-list entries carry exactly one
/// participant: the player the list was fetched for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameInfo {
    pub game_id: i64,
    pub queue_id: i64,
    /// Seconds.
    pub game_duration: i64,
    pub game_creation_date: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
}

/// Full per-match summary with every participant's stats.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSummary {
    pub game_id: i64,
    pub queue_id: i64,
    /// Seconds.
    pub game_duration: i64,
    pub game_creation_date: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
    pub participant_identities: Vec<ParticipantIdentity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantIdentity {
    pub participant_id: i32,
    pub player: IdentityPlayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityPlayer {
    pub summoner_id: SummonerId,
    pub summoner_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    pub participant_id: i32,
    pub team_id: i32,
    pub timeline: Timeline,
    pub stats: ParticipantStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timeline {
    pub lane: String,
    pub role: String,
}

/// Per-player, per-match record. Immutable once decoded; the score engine
/// never writes through it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantStats {
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub gold_earned: i32,
    pub total_damage_dealt_to_champions: i32,
    pub vision_score: i32,
    pub total_minions_killed: i32,
    pub first_blood_kill: bool,
    pub first_blood_assist: bool,
    pub penta_kills: i32,
    pub quadra_kills: i32,
    pub triple_kills: i32,
    pub win: bool,
}

impl Participant {
    pub fn is_support(&self) -> bool {
        self.timeline.lane == LANE_BOTTOM && self.timeline.role == ROLE_SUPPORT
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Conversation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationMsg {
    pub from_summoner_id: SummonerId,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Pending pick/ban slot inside a champ-select session update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampSelectAction {
    pub id: i64,
    pub actor_cell_id: i64,
    pub champion_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub completed: bool,
    pub is_in_progress: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampSelectCell {
    pub cell_id: i64,
    pub summoner_id: SummonerId,
    pub champion_id: i64,
    pub champion_pick_intent: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampSelectSession {
    pub local_player_cell_id: i64,
    /// Rounds of actions; each round is a list of per-cell actions.
    pub actions: Vec<Vec<ChampSelectAction>>,
    pub my_team: Vec<ChampSelectCell>,
}

impl ChampSelectSession {
    /// Champions teammates have locked or declared as pick intent.
    pub fn team_pick_intents(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.my_team.len() * 2);
        for cell in &self.my_team {
            if cell.cell_id == self.local_player_cell_id {
                continue;
            }
            if cell.champion_id > 0 {
                ids.push(cell.champion_id);
            }
            if cell.champion_pick_intent > 0 {
                ids.push(cell.champion_pick_intent);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameFlowSession {
    pub game_data: GameFlowGameData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameFlowGameData {
    pub team_one: Vec<GameFlowTeamPlayer>,
    pub team_two: Vec<GameFlowTeamPlayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameFlowTeamPlayer {
    pub summoner_id: SummonerId,
}

impl GameFlowSession {
    /// Splits the session's players into (allies, enemies) relative to
    /// `self_id`. Both lists come back empty when the player is in neither
    /// team or a teammate id is missing from the payload.
    pub fn split_teams(&self, self_id: SummonerId) -> (Vec<SummonerId>, Vec<SummonerId>) {
        let in_team_one = self
            .game_data
            .team_one
            .iter()
            .any(|p| p.summoner_id == self_id);
        let in_team_two = self
            .game_data
            .team_two
            .iter()
            .any(|p| p.summoner_id == self_id);
        if !in_team_one && !in_team_two {
            return (Vec::new(), Vec::new());
        }
        let collect = |team: &[GameFlowTeamPlayer]| -> Option<Vec<SummonerId>> {
            let ids: Vec<SummonerId> = team
                .iter()
                .map(|p| p.summoner_id)
                .filter(|id| *id > 0)
                .collect();
            if ids.len() == team.len() {
                Some(ids)
            } else {
                None
            }
        };
        let (Some(one), Some(two)) = (
            collect(&self.game_data.team_one),
            collect(&self.game_data.team_two),
        ) else {
            return (Vec::new(), Vec::new());
        };
        if in_team_one {
            (one, two)
        } else {
            (two, one)
        }
    }
}

/// Raw KDA triple used for human display: kills, deaths, assists.
pub type KdaTriple = [i32; 3];

/// Serialized back out through the HTTP façade.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScore {
    #[serde(rename = "summonerID")]
    pub summoner_id: SummonerId,
    pub summoner_name: String,
    pub score: f64,
    /// Most recent match first.
    #[serde(rename = "currKDA")]
    pub curr_kda: Vec<KdaTriple>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_teams_identifies_ally_and_enemy_sides() {
        let session = GameFlowSession {
            game_data: GameFlowGameData {
                team_one: vec![
                    GameFlowTeamPlayer { summoner_id: 1 },
                    GameFlowTeamPlayer { summoner_id: 2 },
                ],
                team_two: vec![
                    GameFlowTeamPlayer { summoner_id: 3 },
                    GameFlowTeamPlayer { summoner_id: 4 },
                ],
            },
        };

        let (allies, enemies) = session.split_teams(3);
        assert_eq!(allies, vec![3, 4]);
        assert_eq!(enemies, vec![1, 2]);
    }

    #[test]
    fn split_teams_rejects_unknown_player_and_masked_ids() {
        let session = GameFlowSession {
            game_data: GameFlowGameData {
                team_one: vec![GameFlowTeamPlayer { summoner_id: 1 }],
                team_two: vec![GameFlowTeamPlayer { summoner_id: 0 }],
            },
        };

        assert_eq!(session.split_teams(99), (Vec::new(), Vec::new()));
        // A masked (zero) id anywhere means the split is unusable.
        assert_eq!(session.split_teams(1), (Vec::new(), Vec::new()));
    }

    #[test]
    fn team_pick_intents_skip_the_local_cell() {
        let session = ChampSelectSession {
            local_player_cell_id: 0,
            actions: vec![],
            my_team: vec![
                ChampSelectCell {
                    cell_id: 0,
                    summoner_id: 1,
                    champion_id: 0,
                    champion_pick_intent: 64,
                },
                ChampSelectCell {
                    cell_id: 1,
                    summoner_id: 2,
                    champion_id: 103,
                    champion_pick_intent: 0,
                },
            ],
        };

        assert_eq!(session.team_pick_intents(), vec![103]);
    }

    #[test]
    fn game_summary_decodes_the_wire_casing() {
        let raw = serde_json::json!({
            "gameId": 7,
            "queueId": 420,
            "gameDuration": 1900,
            "gameCreationDate": "2026-08-01T10:00:00.000Z",
            "participants": [{
                "participantId": 1,
                "teamId": 100,
                "timeline": {"lane": "BOTTOM", "role": "DUO_SUPPORT"},
                "stats": {
                    "kills": 2,
                    "deaths": 1,
                    "assists": 20,
                    "goldEarned": 8000,
                    "totalDamageDealtToChampions": 9000,
                    "visionScore": 70,
                    "totalMinionsKilled": 30,
                    "firstBloodKill": false,
                    "firstBloodAssist": true,
                    "pentaKills": 0,
                    "quadraKills": 0,
                    "tripleKills": 0,
                    "win": true
                }
            }],
            "participantIdentities": [{
                "participantId": 1,
                "player": {"summonerId": 42, "summonerName": "ward bot"}
            }]
        });

        let summary: GameSummary = serde_json::from_value(raw).expect("decode");
        assert_eq!(summary.game_id, 7);
        let p = &summary.participants[0];
        assert!(p.is_support());
        assert!(p.stats.first_blood_assist);
        assert_eq!(summary.participant_identities[0].player.summoner_id, 42);
    }
}
