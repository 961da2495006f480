use stockledger_core::{DomainError, DomainResult};

/// Trim `value` and require `1..=max` characters.
pub(crate) fn required(field: &str, value: &str, max: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    within(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Trim `value`; blank becomes `None`, otherwise at most `max` characters.
pub(crate) fn optional(field: &str, value: Option<&str>, max: usize) -> DomainResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            within(field, v, max)?;
            Ok(Some(v.to_string()))
        }
    }
}

fn within(field: &str, value: &str, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}
