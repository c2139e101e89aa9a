//! Locale catalog: help/stop text and the rivers the skill can report on.
//!
//! The catalog is built once at startup and never mutated. Lookups are exact
//! and case-sensitive; a miss yields the [`EntityResource::unknown`] sentinel
//! rather than an error.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::AppConfig;

pub const UNKNOWN_ENTITY_NAME: &str = "Unknown";
pub const DEFAULT_LOCALE: &str = "en-GB";

const DEE_EXTERNAL_ID: &str = "75148ca0-ee5e-4344-8534-db9a59ed4cd0";

/// Rivers every catalog starts with, as `(name, external id)`.
pub const BUILTIN_RIVERS: &[(&str, &str)] = &[("Dee", DEE_EXTERNAL_ID)];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityResource {
    pub name: String,
    external_id: Option<String>,
}

impl EntityResource {
    pub fn new(name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self { name: name.into(), external_id: Some(external_id.into()) }
    }

    pub fn unknown() -> Self {
        Self { name: UNKNOWN_ENTITY_NAME.to_owned(), external_id: None }
    }

    pub fn is_unknown(&self) -> bool {
        self.external_id.is_none()
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Intent name the interaction model declares for this river,
    /// e.g. `North Tyne` -> `LevelNorthTyneIntent`.
    pub fn level_intent_name(&self) -> String {
        level_intent_name(&self.name)
    }
}

pub fn level_intent_name(river_name: &str) -> String {
    let compact: String = river_name.split_whitespace().collect();
    format!("Level{compact}Intent")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocaleResource {
    pub locale: String,
    pub description: String,
    pub help_message: String,
    pub stop_message: String,
    entities: Vec<EntityResource>,
    index: HashMap<String, usize>,
}

impl LocaleResource {
    pub fn new(
        locale: impl Into<String>,
        description: impl Into<String>,
        help_message: impl Into<String>,
        stop_message: impl Into<String>,
    ) -> Self {
        Self {
            locale: locale.into(),
            description: description.into(),
            help_message: help_message.into(),
            stop_message: stop_message.into(),
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Appends a river, replacing an existing entry with the same name in place.
    pub fn with_entity(mut self, entity: EntityResource) -> Self {
        match self.index.get(&entity.name) {
            Some(&position) => self.entities[position] = entity,
            None => {
                self.index.insert(entity.name.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
        self
    }

    pub fn entities(&self) -> &[EntityResource] {
        &self.entities
    }

    pub fn lookup(&self, name: &str) -> EntityResource {
        self.index
            .get(name)
            .map(|&position| self.entities[position].clone())
            .unwrap_or_else(EntityResource::unknown)
    }
}

#[derive(Clone, Debug)]
pub struct LocaleCatalog {
    resources: Vec<LocaleResource>,
}

impl LocaleCatalog {
    pub fn new(primary: LocaleResource) -> Self {
        Self { resources: vec![primary] }
    }

    #[cfg(test)]
    pub fn with_locale(mut self, resource: LocaleResource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn builtin() -> Self {
        Self::new(builtin_locale())
    }

    /// Built-in catalog with configured text overrides and extra rivers applied.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut resource = builtin_locale();
        if let Some(help_message) = &config.skill.help_message {
            resource.help_message = help_message.clone();
        }
        if let Some(stop_message) = &config.skill.stop_message {
            resource.stop_message = stop_message.clone();
        }
        for river in &config.rivers {
            resource = resource.with_entity(EntityResource::new(&river.name, &river.external_id));
        }
        Self::new(resource)
    }

    /// The first registered locale; no negotiation against the request locale.
    pub fn active_locale(&self) -> &LocaleResource {
        &self.resources[0]
    }

    pub fn lookup(&self, name: &str) -> EntityResource {
        self.active_locale().lookup(name)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|resource| resource.locale.as_str())
    }
}

fn builtin_locale() -> LocaleResource {
    let resource = LocaleResource::new(
        DEFAULT_LOCALE,
        "River Levels",
        "You can ask for the level of a river, for example, what is the level of the Dee? \
         Or, you can say exit... What can I help you with?",
        "Goodbye!",
    );
    BUILTIN_RIVERS.iter().fold(resource, |resource, (name, external_id)| {
        resource.with_entity(EntityResource::new(*name, *external_id))
    })
}
