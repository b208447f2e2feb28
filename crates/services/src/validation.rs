use domains::{DomainError, Result};

/// Rejects values whose character count falls outside `min..=max`.
pub(crate) fn require_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::BadRequest(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}
