//! Effect definition table loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use status_core::combatant::{AbilityId, HotKey, PassiveId, Resource};
use status_core::{
    ApplyKind, ConstantEffect, EffectDefinition, EffectKind, EffectTiming, Eligibility,
    LimitKind, PeriodicEffect, Registry, RemovalRules, SyncField, UiKind, VisualLayers,
};

use crate::hooks::install_hooks;
use crate::loaders::{LoadResult, read_file};

/// Starting point of a definition before per-entry overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TemplateSpec {
    #[default]
    Base,
    ChannelToggle {
        ability: AbilityId,
        key: HotKey,
        resource: Resource,
        cost: f32,
        period_secs: f32,
    },
    TimedConstant {
        duration_secs: f32,
    },
    AutoPassive {
        passive: PassiveId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DurationSpec {
    Instant,
    Timed(f32),
    Toggle,
}

/// One entry of an effect table. Everything except `kind` is optional and
/// falls back to the template's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    #[serde(default)]
    pub template: TemplateSpec,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<u16>,
    #[serde(default)]
    pub duration: Option<DurationSpec>,
    #[serde(default)]
    pub timing: Option<EffectTiming>,
    #[serde(default)]
    pub period_secs: Option<f32>,
    #[serde(default)]
    pub limit: Option<LimitKind>,
    #[serde(default)]
    pub apply: Option<ApplyKind>,
    #[serde(default)]
    pub ui: Option<UiKind>,
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub merge_duration: Option<bool>,
    /// Stack limit. Setting it turns autostacking on: a merge into an existing
    /// instance adds a stack up to this limit.
    #[serde(default)]
    pub max_stacks: Option<u16>,
    #[serde(default)]
    pub synced: Option<bool>,
    #[serde(default)]
    pub eligibility: Option<Eligibility>,
    #[serde(default)]
    pub removal: Option<RemovalRules>,
    #[serde(default)]
    pub right_click_end: bool,
    #[serde(default)]
    pub visuals: Option<VisualLayers>,
    #[serde(default)]
    pub fields: Vec<SyncField>,
    #[serde(default)]
    pub constant: Option<ConstantEffect>,
    #[serde(default)]
    pub periodic: Option<PeriodicEffect>,
}

impl EffectSpec {
    pub fn into_definition(self) -> EffectDefinition {
        let kind = self.kind;
        let mut definition = match self.template {
            TemplateSpec::Base => EffectDefinition::new(kind),
            TemplateSpec::ChannelToggle {
                ability,
                key,
                resource,
                cost,
                period_secs,
            } => EffectDefinition::channel_toggle(kind, ability, key, resource, cost, period_secs),
            TemplateSpec::TimedConstant { duration_secs } => {
                EffectDefinition::timed_constant(kind, duration_secs)
            }
            TemplateSpec::AutoPassive { passive } => EffectDefinition::auto_passive(kind, passive),
        };

        if let Some(name) = self.name {
            definition.name = name;
        }
        definition.description = self.description;
        definition.icon = self.icon.or(definition.icon);

        definition = match self.duration {
            Some(DurationSpec::Instant) => definition.instant(),
            Some(DurationSpec::Timed(secs)) => definition.timed(secs),
            Some(DurationSpec::Toggle) => definition.toggle(),
            None => definition,
        };
        let timing = self.timing.unwrap_or(definition.timing);
        let period_secs = self.period_secs.unwrap_or(definition.period_secs);
        definition = definition.timing(timing, period_secs);

        if let Some(limit) = self.limit {
            definition.limit = limit;
        }
        if let Some(apply) = self.apply {
            definition.apply = apply;
        }
        if let Some(ui) = self.ui {
            definition.ui = ui;
        }
        definition.mergeable = self.mergeable.unwrap_or(definition.mergeable);
        definition.merge_duration = self.merge_duration.unwrap_or(definition.merge_duration);
        if let Some(max_stacks) = self.max_stacks {
            definition = definition.autostack(max_stacks);
        }
        definition.synced = self.synced.unwrap_or(definition.synced);
        if let Some(eligibility) = self.eligibility {
            definition.eligibility = eligibility;
        }
        if let Some(removal) = self.removal {
            definition.removal = removal;
        }
        definition.right_click_end |= self.right_click_end;
        if let Some(visuals) = self.visuals {
            definition.visuals = visuals;
        }
        if !self.fields.is_empty() {
            definition.fields = self.fields;
        }
        definition.constant = self.constant.or(definition.constant);
        definition.periodic = self.periodic.or(definition.periodic);
        definition
    }
}

/// Effect table structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectCatalog {
    pub effects: Vec<EffectSpec>,
}

/// Loader for effect definition tables from RON files.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Load an effect table from a RON file.
    ///
    /// Definitions are returned unvalidated; [`build_registry`] validates them.
    pub fn load(path: &Path) -> LoadResult<Vec<EffectDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<EffectDefinition>> {
        let catalog: EffectCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect table RON: {}", e))?;

        Ok(catalog
            .effects
            .into_iter()
            .map(EffectSpec::into_definition)
            .collect())
    }
}

/// Validates and registers every definition, then installs the shipped hooks.
pub fn build_registry(definitions: Vec<EffectDefinition>) -> LoadResult<Registry> {
    let mut registry = Registry::new();
    for definition in definitions {
        let kind = definition.kind;
        registry
            .register(definition)
            .map_err(|e| anyhow::anyhow!("Invalid effect definition {}: {}", kind, e))?;
    }
    let hooked = install_hooks(&mut registry)
        .map_err(|e| anyhow::anyhow!("Failed to install effect hooks: {}", e))?;
    tracing::debug!(effects = registry.len(), hooked, "effect registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use status_core::{DurationKind, RemovalTriggers};

    use super::*;

    const TABLE: &str = r#"
#![enable(implicit_some)]
(
    effects: [
        (
            kind: Rally,
            template: TimedConstant(duration_secs: 8.0),
            name: "Rally",
            fields: [Magnitude1],
            constant: StatBonus(stat: Attack, field: Magnitude1),
        ),
        (
            kind: Venom,
            duration: Timed(6.0),
            timing: Periodic,
            limit: One,
            apply: Best,
            max_stacks: 5,
            fields: [Magnitude1, Stacks],
            periodic: DamageOverTime(field: Magnitude1, scale_by_stacks: true),
        ),
    ],
)
"#;

    #[test]
    fn table_entries_override_templates() {
        let definitions = DefinitionLoader::parse(TABLE).unwrap();
        assert_eq!(definitions.len(), 2);

        let rally = &definitions[0];
        assert_eq!(rally.duration, DurationKind::Timed);
        assert_eq!(rally.duration_secs, 8.0);
        assert_eq!(rally.timing, EffectTiming::Constant);

        let venom = &definitions[1];
        assert!(venom.autostack);
        assert_eq!(venom.max_stacks, 5);
        assert_eq!(venom.limit, LimitKind::One);
        assert_eq!(venom.period_secs, 1.0);
        assert!(venom.validate().is_ok());
    }

    #[test]
    fn flag_sets_are_parenthesized_strings() {
        let table = r#"
#![enable(implicit_some)]
(
    effects: [
        (
            kind: HuntersMark,
            eligibility: ("TARGET_NPC | OWNER_PLAYER"),
            visuals: ("BACK | FRONT"),
            removal: (triggers: ("OWNER_DEATH"), target_forbids: Exhausted),
            fields: [Magnitude1],
        ),
    ],
)
"#;
        let definitions = DefinitionLoader::parse(table).unwrap();
        let mark = &definitions[0];
        assert_eq!(mark.eligibility, Eligibility::TARGET_NPC | Eligibility::OWNER_PLAYER);
        assert_eq!(mark.visuals, VisualLayers::BACK | VisualLayers::FRONT);
        assert_eq!(mark.removal.triggers, RemovalTriggers::OWNER_DEATH);
        assert_eq!(mark.removal.target_forbids, Some(EffectKind::Exhausted));

        let bare = table.replace(r#"("TARGET_NPC | OWNER_PLAYER")"#, r#""TARGET_NPC""#);
        assert!(DefinitionLoader::parse(&bare).is_err());
    }

    #[test]
    fn loads_from_file_and_builds_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let definitions = DefinitionLoader::load(file.path()).unwrap();
        let registry = build_registry(definitions).unwrap();
        assert!(registry.contains(EffectKind::Rally));
        assert!(registry.contains(EffectKind::Venom));
    }

    #[test]
    fn invalid_definition_names_the_kind() {
        let table = r#"
(
    effects: [
        (kind: Venom, max_stacks: Some(3), fields: [Magnitude1]),
    ],
)
"#;
        let definitions = DefinitionLoader::parse(table).unwrap();
        let err = build_registry(definitions).unwrap_err();
        assert!(err.to_string().contains("venom"), "{err}");
    }

    #[test]
    fn duplicate_kinds_are_refused() {
        let definitions = vec![
            EffectDefinition::new(EffectKind::Rally),
            EffectDefinition::new(EffectKind::Rally),
        ];
        assert!(build_registry(definitions).is_err());
    }
}
