use std::sync::Arc;

use riverlevels_core::config::AppConfig;
use riverlevels_core::LocaleCatalog;
use riverlevels_skill::{HttpRiverStateFetcher, IntentRouter, RoutingPolicy};
use tracing::info;

pub type SkillRouter = IntentRouter<HttpRiverStateFetcher>;

pub struct Application {
    pub config: AppConfig,
    pub router: Arc<SkillRouter>,
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    let catalog = Arc::new(LocaleCatalog::from_config(&config));
    let fetcher = HttpRiverStateFetcher::from_config(&config.provider);
    let router = IntentRouter::new(catalog, fetcher).with_policy(RoutingPolicy::from(&config.skill));

    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        locale = %router.catalog().active_locale().locale,
        rivers = router.catalog().active_locale().entities().len(),
        level_intents = router.intents().len(),
        provider = %config.provider.base_url,
        "river catalog and intent table built"
    );

    Application { config, router: Arc::new(router) }
}
