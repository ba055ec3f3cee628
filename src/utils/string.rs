//! String utilities
//!
//! Contains helper functions for safe string manipulation and for keeping
//! secrets out of logs.

/// Number of trailing characters of a secret left visible by [`mask_secret`]
const VISIBLE_SECRET_CHARS: usize = 4;

/// Safely truncate a string at a character boundary
///
/// # Example
/// ```
/// use gemini_search_tool::utils::truncate_str;
///
/// let text = "Hello, 世界!";
/// assert_eq!(truncate_str(text, 8), "Hello, 世");
/// assert_eq!(truncate_str(text, 100), "Hello, 世界!");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Mask a secret for logging, keeping only its last few characters
///
/// Short secrets are masked entirely.
///
/// # Example
/// ```
/// use gemini_search_tool::utils::mask_secret;
///
/// assert_eq!(mask_secret("AIzaSyD-example-1234"), "****1234");
/// assert_eq!(mask_secret("abc"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= VISIBLE_SECRET_CHARS * 2 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - VISIBLE_SECRET_CHARS).collect();
    format!("****{}", tail)
}
