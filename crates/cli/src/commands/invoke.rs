use std::sync::Arc;

use riverlevels_core::config::{AppConfig, LoadOptions};
use riverlevels_core::LocaleCatalog;
use riverlevels_skill::{
    HttpRiverStateFetcher, IntentRouter, RequestContext, RouteError, RoutingPolicy, SkillRequest,
};

use crate::commands::CommandResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Launch,
    Intent(String),
}

pub fn run(target: Target) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let router = IntentRouter::new(
        Arc::new(LocaleCatalog::from_config(&config)),
        HttpRiverStateFetcher::from_config(&config.provider),
    )
    .with_policy(RoutingPolicy::from(&config.skill));

    let request = match &target {
        Target::Launch => SkillRequest::launch("cli-invoke"),
        Target::Intent(name) => SkillRequest::intent("cli-invoke", name.clone()),
    };
    let ctx = RequestContext { correlation_id: "cli-invoke".to_owned() };

    match runtime.block_on(router.route(&request, &ctx)) {
        Ok(response) => CommandResult::success_with_payload(
            "invoke",
            response.speech_text().to_owned(),
            Some(response),
        ),
        Err(RouteError::Fetch(error)) => {
            CommandResult::failure("invoke", error.kind(), error.to_string(), 4)
        }
    }
}
