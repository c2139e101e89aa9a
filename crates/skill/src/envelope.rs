use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

/// Inbound voice-platform request. Only the fields the router reads are typed;
/// the rest of the platform envelope is ignored on deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequest {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    pub request: RequestBody,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RequestBody {
    LaunchRequest(LaunchRequest),
    IntentRequest(IntentRequest),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    #[serde(default)]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    #[serde(default)]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub intent: Intent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, Slot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SkillRequest {
    pub fn launch(request_id: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_owned(),
            session: None,
            request: RequestBody::LaunchRequest(LaunchRequest {
                request_id: request_id.into(),
                locale: None,
            }),
        }
    }

    pub fn intent(request_id: impl Into<String>, intent_name: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_owned(),
            session: None,
            request: RequestBody::IntentRequest(IntentRequest {
                request_id: request_id.into(),
                locale: None,
                intent: Intent { name: intent_name.into(), slots: BTreeMap::new() },
            }),
        }
    }

    pub fn request_id(&self) -> &str {
        match &self.request {
            RequestBody::LaunchRequest(launch) => &launch.request_id,
            RequestBody::IntentRequest(intent) => &intent.request_id,
            RequestBody::Unsupported => "",
        }
    }

    pub fn intent_name(&self) -> Option<&str> {
        match &self.request {
            RequestBody::IntentRequest(intent) => Some(&intent.intent.name),
            _ => None,
        }
    }
}

/// Outbound envelope: `{"version", "response": {"outputSpeech", "shouldEndSession"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillResponse {
    pub version: String,
    pub response: ResponseBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub output_speech: OutputSpeech,
    pub should_end_session: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
}

impl SkillResponse {
    pub fn speech_text(&self) -> &str {
        match &self.response.output_speech {
            OutputSpeech::PlainText { text } => text,
        }
    }

    pub fn ends_session(&self) -> bool {
        self.response.should_end_session
    }
}
