//! Battle reporter error types.

/// Errors returned when recording battle activity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// A required actor name was empty.
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),
}
