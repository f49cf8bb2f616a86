//! Data-driven effect content and loaders.
//!
//! This crate houses the built-in status effects and provides loaders for
//! RON/TOML data files:
//! - Effect definition tables (data-driven via RON)
//! - Engine configuration (data-driven via TOML)
//! - Per-kind hooks for effects whose behavior is not pure data
//!
//! Content is consumed once at startup to build the shared
//! [`status_core::Registry`]; it never appears in synced state.

pub mod hooks;

#[cfg(feature = "loaders")]
pub mod catalog;
#[cfg(feature = "loaders")]
pub mod loaders;

pub use hooks::{BloodlustHooks, HuntersMarkHooks, hooks_for, install_hooks};

#[cfg(feature = "loaders")]
pub use catalog::{builtin_definitions, builtin_registry};
#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, DefinitionLoader, DurationSpec, EffectCatalog, EffectSpec,
    TemplateSpec, build_registry,
};
