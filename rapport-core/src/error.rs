use thiserror::Error;

/// Failures that can surface from the simulation core.
///
/// Rejections and evictions are NOT errors: they are ordinary admission
/// outcomes carried by [`crate::buffer::Admission`]. The taxonomy here is
/// deliberately narrow.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Degenerate parameters reached a constructor.
    #[error("Invalid simulation parameters: {0}")]
    Config(String),

    /// A structural invariant was broken mid-run. Not recoverable; the
    /// simulation state can no longer be trusted.
    #[error("Internal consistency fault: {0}")]
    InternalFault(String),
}
