//! Handle derivation.

/// Derives a URL-safe handle from a title.
///
/// Lowercases and replaces spaces and `/` with `-`. The function is
/// idempotent: `derive_handle(&derive_handle(t)) == derive_handle(t)`.
pub fn derive_handle(title: &str) -> String {
    title
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == ' ' || c == '/' { '-' } else { c })
        .collect()
}
