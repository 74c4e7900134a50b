use partledger_core::{AppError, AppResult};
use url::Url;

/// Placeholder prefixes accepted in place of a URL for shipped resources.
pub const BUILTIN_PLACEHOLDERS: &[&str] = &["%FOOTPRINTS%", "%FOOTPRINTS_3D%", "%SYMBOLS%"];

/// Validates an attachment path that may be a URL or a builtin resource.
///
/// An empty value passes, the field is optional. A value whose first path
/// segment is one of `allowed_placeholders` passes without URL parsing.
/// Anything else must be an absolute http or https URL. Existence of the
/// referenced resource is never checked.
pub fn validate_url_or_builtin(value: &str, allowed_placeholders: &[&str]) -> AppResult<()> {
    if value.is_empty() {
        return Ok(());
    }

    let first_segment = value.split('/').next().unwrap_or_default();
    if allowed_placeholders.contains(&first_segment) {
        return Ok(());
    }

    let parsed = Url::parse(value)
        .map_err(|_| AppError::Validation(format!("'{value}' is not a valid URL")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "'{value}' must use the http or https scheme"
        )));
    }

    if parsed.host().is_none() {
        return Err(AppError::Validation(format!(
            "'{value}' is missing a host"
        )));
    }

    Ok(())
}
