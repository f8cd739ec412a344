//! Errors raised by `epochset` itself.
//!
//! Everything fallible returns [`anyhow::Result`]; the variants below are the
//! conditions this crate detects on its own. Callers that need to branch on
//! them can `downcast_ref::<epochset::Error>()`. Errors coming out of a
//! transform step, windower or recording source are passed through as-is.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Filter cut-offs are missing, out of `(0, sfreq/2)`, or inverted.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Two pipeline steps were given the same name.
    #[error("duplicate pipeline step name `{0}`")]
    DuplicateStep(String),

    #[error("pipeline step names must not be empty")]
    EmptyStepName,

    /// Windower parameters that cannot produce any window.
    #[error("invalid windower: {0}")]
    InvalidWindower(String),

    /// An event code with no entry in the label mapping, under
    /// [`UnmappedEvent::Error`](crate::windower::UnmappedEvent::Error).
    #[error("event code {code} at sample {onset} has no entry in the label mapping")]
    UnmappedEvent { code: i32, onset: usize },

    #[error("a windower is required to build a labelled dataset")]
    MissingWindower,

    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A label-mapping key that does not parse as an integer event code.
    #[error("label mapping key `{0}` is not an integer event code")]
    InvalidLabelCode(String),

    /// Two label-mapping keys that parse to the same event code.
    #[error("event code {0} appears more than once in the label mapping")]
    DuplicateLabelCode(i32),
}
