use std::fmt;

use serde::{Deserialize, Serialize};

/// Live state of one river section as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemoteReading {
    pub river: String,
    pub section: String,
    pub state_text: String,
    pub state_value: String,
}

/// Provider response body: `{"data": {"river", "section", "state": {"text", "value"}}}`.
#[derive(Debug, Deserialize)]
pub struct RiverPayload {
    pub data: RiverData,
}

#[derive(Debug, Deserialize)]
pub struct RiverData {
    pub river: String,
    pub section: String,
    pub state: RiverState,
}

#[derive(Debug, Deserialize)]
pub struct RiverState {
    pub text: String,
    pub value: StateValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl RiverPayload {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

impl From<RiverPayload> for RemoteReading {
    fn from(payload: RiverPayload) -> Self {
        let RiverData { river, section, state } = payload.data;
        Self { river, section, state_text: state.text, state_value: state.value.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::{RemoteReading, RiverPayload};

    #[test]
    fn string_state_value_is_kept_verbatim() {
        let body = r#"{"data":{"river":"Dee","section":"Chester Weir","state":{"text":"good","value":"1.2"}}}"#;
        let reading = RemoteReading::from(RiverPayload::parse(body).expect("payload"));

        assert_eq!(
            reading,
            RemoteReading {
                river: "Dee".to_owned(),
                section: "Chester Weir".to_owned(),
                state_text: "good".to_owned(),
                state_value: "1.2".to_owned(),
            }
        );
    }

    #[test]
    fn numeric_state_value_is_rendered_as_text() {
        let body = r#"{"data":{"river":"Dee","section":"Chester Weir","state":{"text":"low","value":0.45}},"meta":{"source":"gauge"}}"#;
        let reading = RemoteReading::from(RiverPayload::parse(body).expect("payload"));

        assert_eq!(reading.state_value, "0.45");
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let body = r#"{"data":{"river":"Dee","state":{"text":"good","value":"1.2"}}}"#;
        let error = RiverPayload::parse(body).expect_err("section is required");

        assert!(error.to_string().contains("section"));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(RiverPayload::parse(r#"{"data":[]}"#).is_err());
        assert!(RiverPayload::parse("<html>maintenance</html>").is_err());
        assert!(RiverPayload::parse(
            r#"{"data":{"river":"Dee","section":"Weir","state":{"text":"good","value":null}}}"#
        )
        .is_err());
    }
}
