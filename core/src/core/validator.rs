use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::AuditError;

/// Loose `domain.tld[/path]` shape, scheme optional. ASCII classes only.
const URL_PATTERN: &str = r"^(https?://)?([0-9a-z.-]+)\.([a-z.]{2,6})([/0-9A-Za-z_ .-]*)*/?$";

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is a valid regex"))
}

/// Returns true when `input` has the gross shape of a website URL.
///
/// This is purely syntactic; it says nothing about reachability.
pub fn is_valid_url(input: &str) -> bool {
    url_pattern().is_match(input)
}

/// Validates `input` and prefixes `https://` when no scheme was given.
pub fn normalize_url(input: &str) -> Result<String, AuditError> {
    if !is_valid_url(input) {
        debug!("Rejected audit input {:?}", input);
        return Err(AuditError::InvalidUrl { input: input.to_string() });
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        Ok(input.to_string())
    } else {
        Ok(format!("https://{}", input))
    }
}
