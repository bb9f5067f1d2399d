use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::discovery::LcuAuth;
use super::models::{
    ChampSelectSession, Conversation, ConversationMsg, GameFlowSession, GameInfo, GameSummary,
    MatchList, Summoner, SummonerId, ACTION_BAN, ACTION_PICK, CONVERSATION_CHAMP_SELECT,
};
use super::LcuError;
use crate::score::aggregate::MatchSource;

const AUTH_USER: &str = "riot";

/// Authenticated HTTPS client against the local game-client API.
///
/// Every call is a fallible RPC; callers decide whether to retry or degrade.
#[derive(Debug, Clone)]
pub struct LcuClient {
    http: reqwest::Client,
    base: String,
    auth: LcuAuth,
}

impl LcuClient {
    pub fn new(auth: LcuAuth) -> Result<Self, LcuError> {
        // The client API presents a self-signed certificate on 127.0.0.1.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            http,
            base: auth.http_base(),
            auth,
        })
    }

    pub fn auth(&self) -> &LcuAuth {
        &self.auth
    }

    async fn request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, LcuError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut req = self
            .http
            .request(method, format!("{}{}", self.base, path))
            .basic_auth(AUTH_USER, Some(&self.auth.token));
        if let Some(body) = body {
            req = req.json(body);
        }
        let text = req.send().await?.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get(&self, path: &str) -> Result<Value, LcuError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// Decodes a payload after checking for the API's inline error envelope.
    fn decode<T: DeserializeOwned>(value: Value) -> Result<T, LcuError> {
        if let Some(obj) = value.as_object() {
            let code = obj
                .get("errorCode")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !code.is_empty() {
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return Err(LcuError::Api {
                    code: code.to_string(),
                    message,
                });
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn current_summoner(&self) -> Result<Summoner, LcuError> {
        let summoner: Summoner = Self::decode(self.get("/lol-summoner/v1/current-summoner").await?)?;
        if summoner.summoner_id == 0 {
            return Err(LcuError::Invalid("current summoner unavailable".into()));
        }
        Ok(summoner)
    }

    pub async fn summoners_by_ids(&self, ids: &[SummonerId]) -> Result<Vec<Summoner>, LcuError> {
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let value = self
            .get(&format!("/lol-summoner/v2/summoners?ids=[{joined}]"))
            .await?;
        Self::decode(value)
    }

    pub async fn summoner_by_id(&self, id: SummonerId) -> Result<Summoner, LcuError> {
        let list = self.summoners_by_ids(&[id]).await?;
        list.into_iter()
            .next()
            .ok_or_else(|| LcuError::Invalid(format!("summoner {id} not found")))
    }

    pub async fn summoner_by_name(&self, name: &str) -> Result<Summoner, LcuError> {
        let value = self
            .http
            .get(format!("{}/lol-summoner/v1/summoners", self.base))
            .basic_auth(AUTH_USER, Some(&self.auth.token))
            .query(&[("name", name)])
            .send()
            .await?
            .json()
            .await?;
        Self::decode(value)
    }

    pub async fn list_matches(
        &self,
        id: SummonerId,
        begin: usize,
        count: usize,
    ) -> Result<MatchList, LcuError> {
        let value = self
            .get(&format!(
                "/lol-match-history/v3/matchlist/account/{id}?begIndex={begin}&endIndex={}",
                begin + count
            ))
            .await?;
        Self::decode(value)
    }

    pub async fn match_summary(&self, game_id: i64) -> Result<GameSummary, LcuError> {
        let value = self
            .get(&format!("/lol-match-history/v1/games/{game_id}"))
            .await?;
        Self::decode(value)
    }

    pub async fn conversations(&self) -> Result<Vec<Conversation>, LcuError> {
        Self::decode(self.get("/lol-chat/v1/conversations").await?)
    }

    /// The champ-select chat group, present only during champion select.
    pub async fn champ_select_conversation_id(&self) -> Result<String, LcuError> {
        let list = self.conversations().await?;
        list.into_iter()
            .find(|c| c.kind == CONVERSATION_CHAMP_SELECT)
            .map(|c| c.id)
            .ok_or_else(|| LcuError::Invalid("not currently in champion select".into()))
    }

    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationMsg>, LcuError> {
        let value = self
            .get(&format!(
                "/lol-chat/v1/conversations/{conversation_id}/messages"
            ))
            .await?;
        Self::decode(value)
    }

    pub async fn send_conversation_message(
        &self,
        conversation_id: &str,
        body: &str,
    ) -> Result<(), LcuError> {
        #[derive(Serialize)]
        struct ChatBody<'a> {
            body: &'a str,
            #[serde(rename = "type")]
            kind: &'a str,
        }
        self.request(
            Method::POST,
            &format!("/lol-chat/v1/conversations/{conversation_id}/messages"),
            Some(&ChatBody { body, kind: "chat" }),
        )
        .await?;
        Ok(())
    }

    pub async fn accept_ready_check(&self) -> Result<(), LcuError> {
        self.request(
            Method::POST,
            "/lol-matchmaking/v1/ready-check/accept",
            None::<&()>,
        )
        .await?;
        Ok(())
    }

    pub async fn champ_select_session(&self) -> Result<ChampSelectSession, LcuError> {
        Self::decode(self.get("/lol-champ-select/v1/session").await?)
    }

    pub async fn gameflow_session(&self) -> Result<GameFlowSession, LcuError> {
        Self::decode(self.get("/lol-gameflow/v1/session").await?)
    }

    async fn patch_champ_select_action(
        &self,
        action_id: i64,
        champion_id: i64,
        kind: Option<&str>,
        completed: Option<bool>,
    ) -> Result<(), LcuError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct PatchBody<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            completed: Option<bool>,
            #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
            kind: Option<&'a str>,
            champion_id: i64,
        }
        let value = self
            .request(
                Method::PATCH,
                &format!("/lol-champ-select/v1/session/actions/{action_id}"),
                Some(&PatchBody {
                    completed,
                    kind,
                    champion_id,
                }),
            )
            .await?;
        // A successful patch returns an empty body; anything else is the
        // error envelope.
        if value.is_null() {
            return Ok(());
        }
        Self::decode::<Value>(value).map(|_| ())
    }

    /// Declares pick intent without locking in.
    pub async fn pre_pick_champion(&self, champion_id: i64, action_id: i64) -> Result<(), LcuError> {
        self.patch_champ_select_action(action_id, champion_id, None, None)
            .await
    }

    pub async fn pick_champion(&self, champion_id: i64, action_id: i64) -> Result<(), LcuError> {
        self.patch_champ_select_action(action_id, champion_id, Some(ACTION_PICK), Some(true))
            .await
    }

    pub async fn ban_champion(&self, champion_id: i64, action_id: i64) -> Result<(), LcuError> {
        self.patch_champ_select_action(action_id, champion_id, Some(ACTION_BAN), Some(true))
            .await
    }
}

#[async_trait]
impl MatchSource for LcuClient {
    async fn summoner_by_id(&self, id: SummonerId) -> Result<Summoner, LcuError> {
        LcuClient::summoner_by_id(self, id).await
    }

    async fn recent_matches(
        &self,
        id: SummonerId,
        begin: usize,
        count: usize,
    ) -> Result<Vec<GameInfo>, LcuError> {
        Ok(self.list_matches(id, begin, count).await?.games.games)
    }

    async fn match_summary(&self, game_id: i64) -> Result<GameSummary, LcuError> {
        LcuClient::match_summary(self, game_id).await
    }
}
