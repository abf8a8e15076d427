// ── Domain name handling ──
//
// Every name entering the engine passes through `normalize` before any
// network call: trimmed, lowercased, trailing dot removed.

use crate::error::CoreError;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Normalize and validate a domain name.
///
/// Underscore-prefixed labels (`_dmarc`, `_domainkey`) are accepted.
pub fn normalize(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let name = trimmed.strip_suffix('.').unwrap_or(trimmed).to_ascii_lowercase();

    if name.is_empty() {
        return Err(CoreError::validation("domain is empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::validation(format!(
            "domain '{name}' exceeds {MAX_NAME_LEN} characters"
        )));
    }
    for label in name.split('.') {
        let valid = !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CoreError::validation(format!(
                "'{trimmed}' is not a valid domain name"
            )));
        }
    }
    Ok(name)
}

/// Lowercase + strip trailing dot, without validation. Used for comparing
/// names that came back from a provider or resolver.
pub fn canonical(name: &str) -> String {
    let trimmed = name.trim();
    trimmed
        .strip_suffix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// Qualify `host` under `zone`. `@` and names already inside the zone
/// are returned as-is.
pub fn qualify(host: &str, zone: &str) -> String {
    let host = canonical(host);
    let zone = canonical(zone);
    if host.is_empty() || host == "@" || host == zone {
        return zone;
    }
    if host.ends_with(&format!(".{zone}")) {
        return host;
    }
    format!("{host}.{zone}")
}

/// `_dmarc.<zone>`
pub fn dmarc_name(zone: &str) -> String {
    format!("_dmarc.{}", canonical(zone))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_and_lowercases() {
        assert_eq!(normalize("  Example.COM. ").unwrap(), "example.com");
    }

    #[test]
    fn normalize_accepts_underscore_labels() {
        assert_eq!(
            normalize("_dmarc.example.com").unwrap(),
            "_dmarc.example.com"
        );
    }

    #[test]
    fn normalize_rejects_garbage() {
        for bad in ["", "   ", ".", "exa mple.com", "a..b", "-lead.example", "x@y.com"] {
            assert!(normalize(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn qualify_relative_and_absolute_hosts() {
        assert_eq!(qualify("s1._domainkey", "example.com"), "s1._domainkey.example.com");
        assert_eq!(
            qualify("s1._domainkey.example.com.", "example.com"),
            "s1._domainkey.example.com"
        );
        assert_eq!(qualify("@", "Example.com"), "example.com");
    }
}
