//! Static, per-kind effect configuration.
//!
//! Every effect kind has exactly one immutable [`EffectDefinition`], registered
//! once at startup in the [`Registry`]. Definitions are plain data; per-kind
//! custom behavior lives behind [`EffectHooks`].

mod behavior;
mod hooks;
mod registry;

pub use behavior::{ConstantEffect, EffectOutcome, PeriodicEffect};
pub use hooks::{EffectHooks, NoHooks};
pub use registry::Registry;

use bitflags::bitflags;

use crate::combatant::{AbilityId, CombatantId, HotKey, PassiveId};
use crate::error::EffectError;

/// Enumerated effect identifier.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumCount,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectKind {
    /// Channelled block: raises defense while the block key is held.
    WarriorBlock,
    /// Short window after a block in which a hit is parried perfectly.
    WarriorBlockPerfect,
    Regeneration,
    Venom,
    Rally,
    /// Cooldown marker preventing Rally from being reapplied.
    Exhausted,
    Mend,
    Sanctuary,
    HuntersMark,
    Bloodlust,
}

/// Synced per-instance values, in canonical comparison order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumCount,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SyncField {
    Magnitude1,
    Magnitude2,
    Range,
    Stacks,
}

impl SyncField {
    /// Order in which [`crate::EffectInstance::is_better_than`] compares fields.
    pub const COMPARE_ORDER: [SyncField; 4] = [
        SyncField::Magnitude1,
        SyncField::Magnitude2,
        SyncField::Stacks,
        SyncField::Range,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DurationKind {
    /// Executes once on creation, then is removed.
    Instant,
    /// Expires after a fixed duration.
    Timed,
    /// Lasts until a removal precondition fires.
    Toggle,
}

/// Which behaviors run while an instance is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EffectTiming {
    None,
    Constant,
    Periodic,
    ConstantAndPeriodic,
}

impl EffectTiming {
    pub const fn has_constant(self) -> bool {
        matches!(self, Self::Constant | Self::ConstantAndPeriodic)
    }

    pub const fn has_periodic(self) -> bool {
        matches!(self, Self::Periodic | Self::ConstantAndPeriodic)
    }
}

/// Coexistence rule on a single target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum LimitKind {
    Many,
    OnePerOwner,
    One,
}

/// Which of the coexisting instances of a kind take effect each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ApplyKind {
    All,
    BestPerOwner,
    Best,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum UiKind {
    None,
    /// A single icon per kind while any instance is applied.
    One,
    /// One icon per applied instance.
    AllApplying,
}

bitflags! {
    /// Combatant categories a kind may target or be owned by.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Eligibility: u8 {
        const TARGET_PLAYER = 1 << 0;
        const TARGET_NPC    = 1 << 1;
        const OWNER_PLAYER  = 1 << 2;
        const OWNER_NPC     = 1 << 3;
    }
}

impl Eligibility {
    pub fn allows_target(self, target: CombatantId) -> bool {
        match target {
            CombatantId::Player(_) => self.contains(Self::TARGET_PLAYER),
            CombatantId::Npc(_) => self.contains(Self::TARGET_NPC),
        }
    }

    pub fn allows_owner(self, owner: CombatantId) -> bool {
        match owner {
            CombatantId::Player(_) => self.contains(Self::OWNER_PLAYER),
            CombatantId::Npc(_) => self.contains(Self::OWNER_NPC),
        }
    }
}

bitflags! {
    /// Lifecycle events of the owner or target that end an instance.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RemovalTriggers: u8 {
        const OWNER_LEAVES      = 1 << 0;
        const OWNER_DEATH       = 1 << 1;
        const TARGET_DEATH      = 1 << 2;
        const OWNER_IMMOBILIZED = 1 << 3;
        const OWNER_SILENCED    = 1 << 4;
    }
}

bitflags! {
    /// Render layers that must be rebuilt when an instance starts or stops applying.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VisualLayers: u8 {
        const BACK  = 1 << 0;
        const FRONT = 1 << 1;
    }
}

/// Removal preconditions checked every tick, in the order the removal state
/// machine evaluates them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RemovalRules {
    pub triggers: RemovalTriggers,
    pub target_requires: Option<EffectKind>,
    pub target_forbids: Option<EffectKind>,
    /// The following three are only checked where the owner is a local player.
    pub owner_requires_status: Option<EffectKind>,
    pub owner_requires_passive: Option<PassiveId>,
    pub owner_requires_ability: Option<AbilityId>,
    /// Local-only: removed once this key is released.
    pub release_key: Option<HotKey>,
}

impl Default for RemovalRules {
    fn default() -> Self {
        Self {
            triggers: RemovalTriggers::OWNER_LEAVES | RemovalTriggers::TARGET_DEATH,
            target_requires: None,
            target_forbids: None,
            owner_requires_status: None,
            owner_requires_passive: None,
            owner_requires_ability: None,
            release_key: None,
        }
    }
}

/// Immutable configuration of one effect kind.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectDefinition {
    pub kind: EffectKind,
    pub name: String,
    pub description: String,
    pub icon: Option<u16>,

    // Timing
    pub duration: DurationKind,
    /// Default duration of Timed instances.
    pub duration_secs: f32,
    pub timing: EffectTiming,
    pub period_secs: f32,

    // Coexistence
    pub limit: LimitKind,
    pub apply: ApplyKind,
    pub ui: UiKind,
    pub mergeable: bool,
    pub merge_duration: bool,
    pub autostack: bool,
    pub max_stacks: u16,

    // Sync & eligibility
    pub synced: bool,
    pub eligibility: Eligibility,
    pub removal: RemovalRules,
    pub channelling: bool,
    pub auto_passive: bool,
    pub right_click_end: bool,
    pub visuals: VisualLayers,

    /// Synced fields in declared (wire) order.
    pub fields: Vec<SyncField>,
    pub constant: Option<ConstantEffect>,
    pub periodic: Option<PeriodicEffect>,
}

impl EffectDefinition {
    /// A synced, timed, constant effect with every policy at its most
    /// permissive setting. Builder methods below narrow it down.
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            name: kind.to_string(),
            description: String::new(),
            icon: None,
            duration: DurationKind::Timed,
            duration_secs: 5.0,
            timing: EffectTiming::Constant,
            period_secs: 1.0,
            limit: LimitKind::Many,
            apply: ApplyKind::BestPerOwner,
            ui: UiKind::AllApplying,
            mergeable: true,
            merge_duration: true,
            autostack: false,
            max_stacks: 1,
            synced: true,
            eligibility: Eligibility::all(),
            removal: RemovalRules::default(),
            channelling: false,
            auto_passive: false,
            right_click_end: false,
            visuals: VisualLayers::empty(),
            fields: Vec::new(),
            constant: None,
            periodic: None,
        }
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Hold-to-channel toggle that costs `cost_per_period` of `resource` every
    /// `period_secs` and ends when the key is released or the ability is lost.
    pub fn channel_toggle(
        kind: EffectKind,
        ability: AbilityId,
        key: HotKey,
        resource: crate::combatant::Resource,
        cost_per_period: f32,
        period_secs: f32,
    ) -> Self {
        let mut definition = Self::new(kind)
            .toggle()
            .timing(EffectTiming::ConstantAndPeriodic, period_secs)
            .limit(LimitKind::One)
            .ui(UiKind::One)
            .periodic(PeriodicEffect::DrainOwnerResource {
                resource,
                amount: cost_per_period,
            });
        definition.channelling = true;
        definition.eligibility = Eligibility::TARGET_PLAYER | Eligibility::OWNER_PLAYER;
        definition.removal.owner_requires_ability = Some(ability);
        definition.removal.release_key = Some(key);
        definition
    }

    /// Synced timed effect with a constant behavior.
    pub fn timed_constant(kind: EffectKind, duration_secs: f32) -> Self {
        Self::new(kind)
            .timed(duration_secs)
            .timing(EffectTiming::Constant, 0.0)
    }

    /// Passive implemented as a self-targeted toggle that lives as long as
    /// the owner keeps `passive`.
    pub fn auto_passive(kind: EffectKind, passive: PassiveId) -> Self {
        let mut definition = Self::new(kind)
            .toggle()
            .limit(LimitKind::One)
            .apply(ApplyKind::Best)
            .ui(UiKind::One);
        definition.auto_passive = true;
        definition.mergeable = false;
        definition.eligibility = Eligibility::TARGET_PLAYER | Eligibility::OWNER_PLAYER;
        definition.removal.owner_requires_passive = Some(passive);
        definition
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn named(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    pub fn timed(mut self, duration_secs: f32) -> Self {
        self.duration = DurationKind::Timed;
        self.duration_secs = duration_secs;
        self
    }

    pub fn toggle(mut self) -> Self {
        self.duration = DurationKind::Toggle;
        self
    }

    pub fn instant(mut self) -> Self {
        self.duration = DurationKind::Instant;
        self
    }

    pub fn timing(mut self, timing: EffectTiming, period_secs: f32) -> Self {
        self.timing = timing;
        if timing.has_periodic() {
            self.period_secs = period_secs;
        }
        self
    }

    pub fn limit(mut self, limit: LimitKind) -> Self {
        self.limit = limit;
        self
    }

    pub fn apply(mut self, apply: ApplyKind) -> Self {
        self.apply = apply;
        self
    }

    pub fn ui(mut self, ui: UiKind) -> Self {
        self.ui = ui;
        self
    }

    pub fn merging(mut self, mergeable: bool, merge_duration: bool) -> Self {
        self.mergeable = mergeable;
        self.merge_duration = merge_duration;
        self
    }

    /// Each improving merge adds one stack, up to `max_stacks`.
    pub fn autostack(mut self, max_stacks: u16) -> Self {
        self.autostack = true;
        self.max_stacks = max_stacks;
        self
    }

    pub fn synced(mut self, synced: bool) -> Self {
        self.synced = synced;
        self
    }

    pub fn eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn removal(mut self, removal: RemovalRules) -> Self {
        self.removal = removal;
        self
    }

    pub fn fields(mut self, fields: &[SyncField]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    pub fn constant(mut self, effect: ConstantEffect) -> Self {
        self.constant = Some(effect);
        self
    }

    pub fn periodic(mut self, effect: PeriodicEffect) -> Self {
        self.periodic = Some(effect);
        self
    }

    pub fn visuals(mut self, visuals: VisualLayers) -> Self {
        self.visuals = visuals;
        self
    }

    pub fn icon(mut self, icon: u16) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn right_click_end(mut self) -> Self {
        self.right_click_end = true;
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn declares(&self, field: SyncField) -> bool {
        self.fields.contains(&field)
    }

    pub fn period(&self) -> core::time::Duration {
        crate::time::secs_to_duration(self.period_secs)
    }

    /// Checks internal consistency. Called by [`Registry::register`].
    pub fn validate(&self) -> Result<(), EffectError> {
        let invalid = |reason| {
            Err(EffectError::InvalidDefinition {
                kind: self.kind,
                reason,
            })
        };

        for (index, field) in self.fields.iter().enumerate() {
            if self.fields[..index].contains(field) {
                return invalid("synced field declared twice");
            }
        }
        if self.autostack && !self.declares(SyncField::Stacks) {
            return invalid("autostack requires the stacks field");
        }
        if self.autostack && self.max_stacks == 0 {
            return invalid("autostack requires a positive stack limit");
        }
        if self.duration == DurationKind::Timed
            && !(self.duration_secs.is_finite() && self.duration_secs > 0.0)
        {
            return invalid("timed effects need a positive duration");
        }
        if self.timing.has_periodic() && crate::time::secs_to_millis(self.period_secs) == 0 {
            return invalid("periodic effects need a positive interval");
        }
        if self.duration == DurationKind::Instant && (self.channelling || self.auto_passive) {
            return invalid("instant effects cannot be channelled or passive");
        }
        if self.auto_passive && self.duration != DurationKind::Toggle {
            return invalid("auto-passive effects must be toggles");
        }
        if self.eligibility.intersection(Eligibility::TARGET_PLAYER | Eligibility::TARGET_NPC).is_empty()
            || self.eligibility.intersection(Eligibility::OWNER_PLAYER | Eligibility::OWNER_NPC).is_empty()
        {
            return invalid("eligibility excludes every target or every owner");
        }
        if self.constant.is_some() && !self.timing.has_constant() {
            return invalid("constant behavior on a kind without constant timing");
        }
        if self.periodic.is_some() && !self.timing.has_periodic() {
            return invalid("periodic behavior on a kind without periodic timing");
        }

        let referenced = self
            .constant
            .as_ref()
            .and_then(ConstantEffect::field)
            .into_iter()
            .chain(self.periodic.as_ref().and_then(PeriodicEffect::field));
        for field in referenced {
            if !self.declares(field) {
                return Err(EffectError::UndeclaredField {
                    kind: self.kind,
                    field,
                });
            }
        }
        Ok(())
    }
}
