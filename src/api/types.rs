use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::commands::RoomTask;
use crate::effects::Effect;

pub const CODE_OK: i32 = 0;
pub const CODE_UNRECOGNIZED: i32 = 1;
pub const CODE_BAD_REQUEST: i32 = 2;
pub const CODE_UNAUTHORIZED: i32 = 3;
pub const CODE_RATE_LIMITED: i32 = 4;

/// Raw body of `POST /cmd`.
#[derive(Deserialize, Debug)]
pub struct CmdRequest {
    pub cmd: String,
    #[serde(default)]
    pub target: Option<String>,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    LightOn(Effect),
    LightOff(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("malformed JSON body: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("invalid command fields: {0}")]
    InvalidFields(#[source] serde_json::Error),
    #[error("command '{0}' requires a target")]
    MissingTarget(String),
    #[error("command '{0}' requires a non-empty target")]
    EmptyTarget(String),
    #[error("unknown light target: {0}")]
    UnknownTarget(String),
    #[error("unrecognized command: {0}")]
    UnrecognizedCommand(String),
}

impl CommandError {
    pub fn code(&self) -> i32 {
        match self {
            CommandError::UnrecognizedCommand(_) => CODE_UNRECOGNIZED,
            _ => CODE_BAD_REQUEST,
        }
    }

    /// Unrecognized commands keep the 200 that fire-and-forget clients expect;
    /// the body's `code` tells them apart.
    pub fn status(&self) -> StatusCode {
        match self {
            CommandError::UnrecognizedCommand(_) => StatusCode::OK,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(CmdResponse::rejected(self.code(), self.to_string())),
        )
            .into_response()
    }
}

impl RoomCommand {
    pub fn parse(body: &[u8]) -> Result<Self, CommandError> {
        let req: CmdRequest = serde_json::from_slice(body).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => CommandError::InvalidFields(e),
            _ => CommandError::MalformedBody(e),
        })?;
        Self::try_from(req)
    }

    pub fn into_task(self) -> RoomTask {
        match self {
            RoomCommand::LightOn(Effect::Sun) => RoomTask::CreateSun,
            RoomCommand::LightOn(Effect::Disco) => RoomTask::CreateDisco,
            RoomCommand::LightOn(Effect::Welcome) => RoomTask::CreateWelcomePhase1,
            RoomCommand::LightOff(tag) => RoomTask::RemoveByTag(tag),
        }
    }
}

impl TryFrom<CmdRequest> for RoomCommand {
    type Error = CommandError;

    fn try_from(req: CmdRequest) -> Result<Self, Self::Error> {
        let CmdRequest { cmd, target } = req;
        match cmd.as_str() {
            "lighton" => {
                let target = target.ok_or_else(|| CommandError::MissingTarget(cmd.clone()))?;
                Effect::from_tag(&target)
                    .map(RoomCommand::LightOn)
                    .ok_or(CommandError::UnknownTarget(target))
            }
            "lightoff" => {
                let target = target.ok_or_else(|| CommandError::MissingTarget(cmd.clone()))?;
                if target.is_empty() {
                    return Err(CommandError::EmptyTarget(cmd));
                }
                Ok(RoomCommand::LightOff(target))
            }
            _ => Err(CommandError::UnrecognizedCommand(cmd)),
        }
    }
}

/// Body of every bridge response. A plain acknowledgment serializes as `{"code":0}`.
#[derive(Serialize, Debug)]
pub struct CmdResponse<T: Serialize> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> CmdResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_OK,
            data: Some(data),
            error: None,
        }
    }
}

impl CmdResponse<()> {
    pub fn accepted() -> Self {
        Self {
            code: CODE_OK,
            data: None,
            error: None,
        }
    }

    pub fn rejected(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// What `GET /state` reports about the room.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RoomState {
    pub tick: u64,
    pub pending_tasks: usize,
    pub active_tags: BTreeMap<String, usize>,
}
