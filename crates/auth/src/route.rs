//! Route protection pattern.
//!
//! A location is protected iff its path is exactly `/settings` or starts
//! with `/settings-`. The pattern is fixed; `/settingsx` is *not* protected.

use url::Url;

const SETTINGS_PATH: &str = "/settings";
const SETTINGS_PREFIX: &str = "/settings-";

/// Where unauthorized visitors of a protected route are sent.
pub const REDIRECT_TARGET: &str = "/";

/// Base that bare paths are resolved against; only its path survives.
const PATH_BASE: &str = "http://localhost/";

/// Extract the path component of a location.
///
/// Accepts either a bare path (`/settings?tab=1`) or a full URL
/// (`https://host/settings#x`). Query and fragment are dropped; a URL with
/// no path maps to `/`. A location is only read as a full URL when it starts
/// with a scheme, so `://` inside a path or query is ordinary text.
pub fn path_of(location: &str) -> String {
    let parsed = match Url::parse(location) {
        Ok(url) if !url.cannot_be_a_base() => Ok(url),
        _ => Url::parse(PATH_BASE).and_then(|base| base.join(location)),
    };

    match parsed {
        Ok(url) if url.path().is_empty() => REDIRECT_TARGET.to_string(),
        Ok(url) => url.path().to_string(),
        Err(_) => REDIRECT_TARGET.to_string(),
    }
}

pub fn is_protected(location: &str) -> bool {
    let path = path_of(location);
    path == SETTINGS_PATH || path.starts_with(SETTINGS_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn settings_routes_are_protected() {
        assert!(is_protected("/settings"));
        assert!(is_protected("/settings-x"));
        assert!(is_protected("/settings-anything"));
        assert!(is_protected("/settings-profile"));
    }

    #[test]
    fn other_routes_are_not_protected() {
        assert!(!is_protected("/"));
        assert!(!is_protected("/dashboard"));
        assert!(!is_protected("/about"));
        assert!(!is_protected("/settingsx"));
        assert!(!is_protected("/settings/"));
        assert!(!is_protected("/app/settings"));
        assert!(!is_protected(""));
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert!(is_protected("/settings?tab=security"));
        assert!(is_protected("/settings-profile#avatar"));
        assert!(!is_protected("/about?next=/settings"));
    }

    #[test]
    fn full_urls_are_reduced_to_their_path() {
        assert_eq!(path_of("https://example.com/settings?x=1"), "/settings");
        assert_eq!(path_of("https://example.com"), "/");
        assert_eq!(path_of("https://example.com?q=/settings"), "/");
        assert!(is_protected("http://localhost:8080/settings-billing"));
        assert!(!is_protected("https://settings-host.example.com/"));
    }

    #[test]
    fn scheme_separator_inside_path_or_query_is_not_a_url() {
        assert_eq!(path_of("/settings?next=https://x"), "/settings");
        assert!(is_protected("/settings?next=https://evil.example.com"));
        assert_eq!(path_of("/settings-a://b"), "/settings-a://b");
        assert!(is_protected("/settings-a://b"));
        assert!(!is_protected("/about#https://host/settings"));
    }

    proptest! {
        #[test]
        fn any_settings_dash_suffix_is_protected(suffix in "[a-z0-9/-]{0,24}") {
            let path = format!("/settings-{suffix}");
            prop_assert!(is_protected(&path));
        }

        #[test]
        fn paths_outside_settings_are_not_protected(seg in "[a-rt-z][a-z0-9-]{0,16}") {
            let path = format!("/{seg}");
            prop_assert!(!is_protected(&path));
        }
    }
}
