//! Error types for binding and configuration.
//!
//! Configuration mistakes (a view that cannot display, a command target that is
//! missing, a gate of the wrong type) fail loudly with a [`BindError`] at
//! registration or parse time. Missing view mappings and navigation edge cases are
//! not errors and never appear here.

use thiserror::Error;

use tableau_core::CoreError;

/// Errors raised while registering views, parsing view models or writing members.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// A view type was registered that cannot render anything.
    #[error("view type `{0}` is not displayable: it has neither a cell template nor a screen factory")]
    NotDisplayable(String),

    /// A member named by a directive does not exist on the type or its data context.
    #[error("`{type_name}` has no member `{member}`")]
    MissingMember {
        /// Type that was searched.
        type_name: String,
        /// Member that was looked up.
        member: String,
    },

    /// A command target exists but is not a method.
    #[error("member `{type_name}::{member}` is not invocable")]
    NotInvocable {
        /// Owning type.
        type_name: String,
        /// Offending member.
        member: String,
    },

    /// A load-more row is bound to a member without a background phase.
    #[error("load-more member `{type_name}::{member}` must be a background method")]
    NotBackground {
        /// Owning type.
        type_name: String,
        /// Offending member.
        member: String,
    },

    /// A can-execute gate or can-edit member is not boolean.
    #[error("gate `{type_name}::{member}` must be bool, found {found}")]
    GateNotBool {
        /// Owning type.
        type_name: String,
        /// Gate member.
        member: String,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// A list declares a selection mirror that cannot be found.
    #[error("selection target `{member}` not found on `{type_name}`")]
    MissingSelectionTarget {
        /// Type that was searched.
        type_name: String,
        /// Mirror member name.
        member: String,
    },

    /// A write was attempted through a read-only member.
    #[error("member `{type_name}::{member}` is read-only")]
    ReadOnly {
        /// Owning type.
        type_name: String,
        /// Member written.
        member: String,
    },

    /// A value of the wrong kind was written to a member.
    #[error("member `{type_name}::{member}` cannot hold a {found} value")]
    ValueMismatch {
        /// Owning type.
        type_name: String,
        /// Member written.
        member: String,
        /// Kind of the rejected value.
        found: &'static str,
    },

    /// A source id no longer refers to a live source.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Re-parenting a source would make it its own ancestor.
    #[error("source cycle: {0}")]
    CircularSource(String),

    /// Background plumbing failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result alias for binding operations.
pub type BindResult<T> = std::result::Result<T, BindError>;

/// Errors raised while loading a session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid session configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
