//! Alert dispatch port trait.

use crate::domain::error::PipelineError;

/// One-shot text alert. Implementations with unset credentials succeed as a
/// no-op (with a warning); callers treat delivery failure as log-only.
pub trait AlertPort {
    fn send(&self, message: &str) -> Result<(), PipelineError>;
}
