use std::collections::HashMap;
use std::sync::Arc;

use riverlevels_core::config::SkillConfig;
use riverlevels_core::{FetchError, LocaleCatalog, LocaleResource};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::envelope::{RequestBody, SkillRequest, SkillResponse};
use crate::fetcher::RiverStateFetcher;
use crate::response::{build_apology, build_help, build_reading_with_session, build_stop};

pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";

/// Level intents declared by the interaction model, whether or not the
/// catalog currently knows the river.
const DECLARED_LEVEL_INTENTS: &[(&str, &str)] =
    &[("LevelDeeIntent", "Dee"), ("LevelNorthTyneIntent", "North Tyne")];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkillAction {
    Launch,
    Stop,
    Help,
    Reading { river: String },
    Fallback { intent: String },
    Unsupported,
}

impl SkillAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Stop => "stop",
            Self::Help => "help",
            Self::Reading { .. } => "reading",
            Self::Fallback { .. } => "fallback",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Intent name to river name. Exact, case-sensitive matching.
#[derive(Clone, Debug, Default)]
pub struct IntentTable {
    entries: HashMap<String, String>,
}

impl IntentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared level intents plus one `Level<Name>Intent` per catalog river.
    pub fn for_catalog(catalog: &LocaleCatalog) -> Self {
        let mut table = DECLARED_LEVEL_INTENTS
            .iter()
            .fold(Self::new(), |table, (intent, river)| table.with_entry(*intent, *river));
        for entity in catalog.active_locale().entities() {
            table = table.with_entry(entity.level_intent_name(), entity.name.clone());
        }
        table
    }

    pub fn with_entry(mut self, intent: impl Into<String>, river: impl Into<String>) -> Self {
        self.entries.insert(intent.into(), river.into());
        self
    }

    pub fn river_for(&self, intent: &str) -> Option<&str> {
        self.entries.get(intent).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn classify(&self, request: &RequestBody) -> SkillAction {
        let intent = match request {
            RequestBody::LaunchRequest(_) => return SkillAction::Launch,
            RequestBody::Unsupported => return SkillAction::Unsupported,
            RequestBody::IntentRequest(intent) => intent.intent.name.as_str(),
        };

        match intent {
            CANCEL_INTENT | STOP_INTENT => SkillAction::Stop,
            HELP_INTENT => SkillAction::Help,
            other => match self.river_for(other) {
                Some(river) => SkillAction::Reading { river: river.to_owned() },
                None => SkillAction::Fallback { intent: other.to_owned() },
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub end_session_after_reading: bool,
    pub apologize_on_remote_failure: bool,
}

impl From<&SkillConfig> for RoutingPolicy {
    fn from(config: &SkillConfig) -> Self {
        Self {
            end_session_after_reading: config.end_session_after_reading,
            apologize_on_remote_failure: config.apologize_on_remote_failure,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub struct IntentRouter<F> {
    catalog: Arc<LocaleCatalog>,
    intents: IntentTable,
    fetcher: F,
    policy: RoutingPolicy,
}

impl<F> IntentRouter<F>
where
    F: RiverStateFetcher,
{
    pub fn new(catalog: Arc<LocaleCatalog>, fetcher: F) -> Self {
        let intents = IntentTable::for_catalog(&catalog);
        Self { catalog, intents, fetcher, policy: RoutingPolicy::default() }
    }

    pub fn with_intents(mut self, intents: IntentTable) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<LocaleCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn intents(&self) -> &IntentTable {
        &self.intents
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    pub async fn route(
        &self,
        request: &SkillRequest,
        ctx: &RequestContext,
    ) -> Result<SkillResponse, RouteError> {
        debug!(
            event_name = "skill.request.received",
            correlation_id = %ctx.correlation_id,
            request = %serde_json::to_string(request).unwrap_or_default(),
            "skill request object"
        );

        let resource = self.catalog.active_locale();
        let action = self.intents.classify(&request.request);
        info!(
            event_name = "skill.request.classified",
            correlation_id = %ctx.correlation_id,
            request_id = request.request_id(),
            intent = request.intent_name().unwrap_or("none"),
            action = action.label(),
            "skill request classified"
        );

        let response = match action {
            SkillAction::Stop => build_stop(resource),
            SkillAction::Launch | SkillAction::Help | SkillAction::Unsupported => {
                build_help(resource)
            }
            SkillAction::Fallback { intent } => {
                info!(
                    event_name = "skill.request.unknown_intent",
                    correlation_id = %ctx.correlation_id,
                    intent = %intent,
                    "unknown intent answered with help"
                );
                build_help(resource)
            }
            SkillAction::Reading { river } => self.reading(&river, resource, ctx).await?,
        };

        debug!(
            event_name = "skill.response.built",
            correlation_id = %ctx.correlation_id,
            response = %serde_json::to_string(&response).unwrap_or_default(),
            "skill response object"
        );
        Ok(response)
    }

    async fn reading(
        &self,
        river: &str,
        resource: &LocaleResource,
        ctx: &RequestContext,
    ) -> Result<SkillResponse, RouteError> {
        let entity = self.catalog.lookup(river);
        if entity.is_unknown() {
            warn!(
                event_name = "skill.river.unresolved",
                correlation_id = %ctx.correlation_id,
                river = %river,
                "river is not in the catalog; answering with help"
            );
            return Ok(build_help(resource));
        }

        match self.fetcher.fetch(&entity).await {
            Ok(reading) => {
                Ok(build_reading_with_session(&reading, self.policy.end_session_after_reading))
            }
            Err(fetch_error) if self.policy.apologize_on_remote_failure => {
                warn!(
                    event_name = "skill.river.fetch_failed",
                    correlation_id = %ctx.correlation_id,
                    river = %entity.name,
                    error_kind = fetch_error.kind(),
                    error = %fetch_error,
                    "river fetch failed; answering with apology"
                );
                Ok(build_apology())
            }
            Err(fetch_error) => {
                error!(
                    event_name = "skill.river.fetch_failed",
                    correlation_id = %ctx.correlation_id,
                    river = %entity.name,
                    error_kind = fetch_error.kind(),
                    error = %fetch_error,
                    "river fetch failed"
                );
                Err(fetch_error.into())
            }
        }
    }
}
