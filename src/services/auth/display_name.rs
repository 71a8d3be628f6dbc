//! Fallback display name derived from an email address.

/// Returned for an empty email.
pub const UNKNOWN_NAME: &str = "NA";

/// Derive a short label from the local part of `email`.
///
/// - `john.doe@...` -> `JD` (first letter of every dot-separated segment)
/// - `ab@...` -> `AB`, `a@...` -> `A` (first two letters otherwise)
/// - `""` -> `NA`
pub fn derive_name(email: &str) -> String {
    if email.is_empty() {
        return UNKNOWN_NAME.to_string();
    }

    let local = email.split('@').next().unwrap_or_default();
    let segments: Vec<&str> = local.split('.').collect();

    if segments.len() >= 2 {
        segments
            .iter()
            .filter_map(|segment| segment.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    } else {
        local.chars().take(2).flat_map(char::to_uppercase).collect()
    }
}
