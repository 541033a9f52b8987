use thiserror::Error;

/// Errors from the plumbing shared by every layer.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A request-scoped component was never registered for the handler.
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),
}
