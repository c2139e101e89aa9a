use riverlevels_core::{LocaleResource, RemoteReading};

use crate::envelope::{OutputSpeech, ResponseBody, SkillResponse, PROTOCOL_VERSION};

pub const APOLOGY_MESSAGE: &str =
    "Sorry, I couldn't get the latest river levels right now. Please try again in a moment.";

/// Collects speech and session policy, then produces an immutable [`SkillResponse`].
/// The session stays open unless `end_session(true)` is called.
pub struct ResponseBuilder {
    speech: String,
    end_session: bool,
}

impl ResponseBuilder {
    pub fn new(speech: impl Into<String>) -> Self {
        Self { speech: speech.into(), end_session: false }
    }

    pub fn end_session(mut self, end_session: bool) -> Self {
        self.end_session = end_session;
        self
    }

    pub fn build(self) -> SkillResponse {
        SkillResponse {
            version: PROTOCOL_VERSION.to_owned(),
            response: ResponseBody {
                output_speech: OutputSpeech::PlainText { text: self.speech },
                should_end_session: self.end_session,
            },
        }
    }
}

pub fn build_stop(resource: &LocaleResource) -> SkillResponse {
    ResponseBuilder::new(resource.stop_message.clone()).end_session(true).build()
}

pub fn build_help(resource: &LocaleResource) -> SkillResponse {
    ResponseBuilder::new(resource.help_message.clone()).end_session(false).build()
}

pub fn build_reading(reading: &RemoteReading) -> SkillResponse {
    build_reading_with_session(reading, false)
}

pub fn build_reading_with_session(reading: &RemoteReading, end_session: bool) -> SkillResponse {
    ResponseBuilder::new(reading_sentence(reading)).end_session(end_session).build()
}

pub fn build_apology() -> SkillResponse {
    ResponseBuilder::new(APOLOGY_MESSAGE).end_session(false).build()
}

pub fn reading_sentence(reading: &RemoteReading) -> String {
    format!(
        "The river {}, {} is {}, {}",
        reading.river, reading.section, reading.state_text, reading.state_value
    )
}

#[cfg(test)]
mod tests {
    use riverlevels_core::{LocaleResource, RemoteReading};

    use super::{build_apology, build_help, build_reading, build_reading_with_session, build_stop};

    fn resource() -> LocaleResource {
        LocaleResource::new("en-GB", "River Levels", "Ask me about a river.", "Goodbye!")
    }

    fn dee_reading() -> RemoteReading {
        RemoteReading {
            river: "Dee".to_owned(),
            section: "Chester Weir".to_owned(),
            state_text: "good".to_owned(),
            state_value: "1.2".to_owned(),
        }
    }

    #[test]
    fn stop_uses_stop_message_and_ends_session() {
        let response = build_stop(&resource());

        assert_eq!(response.version, "1.0");
        assert_eq!(response.speech_text(), "Goodbye!");
        assert!(response.ends_session());
    }

    #[test]
    fn help_uses_help_message_and_keeps_session_open() {
        let response = build_help(&resource());

        assert_eq!(response.version, "1.0");
        assert_eq!(response.speech_text(), "Ask me about a river.");
        assert!(!response.ends_session());
    }

    #[test]
    fn reading_formats_sentence_exactly() {
        let response = build_reading(&dee_reading());

        assert_eq!(response.version, "1.0");
        assert_eq!(response.speech_text(), "The river Dee, Chester Weir is good, 1.2");
        assert!(!response.ends_session());
    }

    #[test]
    fn reading_session_flag_follows_policy() {
        assert!(build_reading_with_session(&dee_reading(), true).ends_session());
        assert!(!build_reading_with_session(&dee_reading(), false).ends_session());
    }

    #[test]
    fn apology_keeps_session_open() {
        let response = build_apology();

        assert!(!response.speech_text().is_empty());
        assert!(!response.ends_session());
    }
}
