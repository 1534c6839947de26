//! URL canonicalisation and the name/category/code heuristics shared by the adapters.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::docs_parser::collapse_whitespace;
use crate::endpoint::EndpointDescriptor;

/// Feed codes appear in link text as e.g. `Match Events (MA3)`.
#[allow(clippy::unwrap_used)]
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([A-Z]{2,3}\d+)\)").unwrap());

/// Known double-prefix artifact in the documentation's own links.
const DOUBLE_PREFIX: &str = "opta-sdapiamp-";
const PAGE_PREFIX: &str = "opta-sdapi-";

/// Segment whose follower is used as the category when no known token is present.
const CATEGORY_ANCHOR: &str = "soccer";
const DEFAULT_CATEGORY: &str = "general";

/// Rewrites an href or sitemap location into a server-relative canonical path.
///
/// - absolute URLs under `base_url` lose the base prefix
/// - `../../` resolves to `doc_root`, `../` and `./` resolve to the server root
/// - bare relative paths get a leading `/`
/// - the `opta-sdapiamp-` artifact becomes `opta-sdapi-`
pub fn normalize_url(href: &str, base_url: &str, doc_root: &str) -> String {
    let href = href.trim();
    let url = if href.starts_with("http://") || href.starts_with("https://") {
        strip_base(href, base_url).unwrap_or_else(|| href.to_string())
    } else if let Some(rest) = href.strip_prefix("../../") {
        format!("{}/{}", doc_root.trim_end_matches('/'), rest)
    } else if let Some(rest) = href.strip_prefix("../") {
        format!("/{rest}")
    } else if let Some(rest) = href.strip_prefix("./") {
        format!("/{rest}")
    } else if !href.starts_with('/') {
        format!("/{href}")
    } else {
        href.to_string()
    };
    url.replace(DOUBLE_PREFIX, PAGE_PREFIX)
}

/// Path of `absolute` relative to `base_url`, which may itself carry a path.
fn strip_base(absolute: &str, base_url: &str) -> Option<String> {
    let parsed = Url::parse(absolute).ok()?;
    let base = Url::parse(base_url).ok()?;
    if parsed.origin() != base.origin() {
        return None;
    }
    let rest = parsed.path().strip_prefix(base.path().trim_end_matches('/'))?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let mut path = format!("/{}", rest.trim_start_matches('/'));
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}

fn path_only(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// True for server-relative `.htm`/`.html` pages under `doc_root`.
pub fn is_documentation_url(url: &str, doc_root: &str) -> bool {
    let path = path_only(url);
    url.starts_with('/')
        && path.contains(doc_root)
        && (path.ends_with(".htm") || path.ends_with(".html"))
}

/// Human readable name from the trailing path segment.
///
/// `/x/opta-sdapi-soccer-api-match-events.htm` becomes `Soccer Api Match Events`.
pub fn name_from_url(url: &str) -> String {
    let file = path_only(url).rsplit('/').next().unwrap_or_default();
    let stem = file
        .strip_suffix(".html")
        .or_else(|| file.strip_suffix(".htm"))
        .unwrap_or(file);
    stem.replace(DOUBLE_PREFIX, "")
        .replace(PAGE_PREFIX, "")
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Category from the directory segments of the path.
///
/// The first configured token present wins; failing that, the directory following
/// `soccer`; failing that, `general`.
pub fn category_from_url(url: &str, tokens: &[String]) -> String {
    let segments: Vec<&str> = path_only(url).split('/').filter(|s| !s.is_empty()).collect();
    let directories = match segments.split_last() {
        Some((_, dirs)) => dirs,
        None => return DEFAULT_CATEGORY.to_string(),
    };

    if let Some(token) = tokens
        .iter()
        .find(|token| directories.iter().any(|dir| dir.eq_ignore_ascii_case(token)))
    {
        return token.clone();
    }

    directories
        .iter()
        .position(|dir| dir.eq_ignore_ascii_case(CATEGORY_ANCHOR))
        .and_then(|i| directories.get(i + 1))
        .map(|dir| dir.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

pub fn code_from_text(text: &str) -> Option<String> {
    CODE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `text` without its `(CODE)` marker.
pub fn strip_code(text: &str) -> String {
    collapse_whitespace(&CODE_RE.replace_all(text, " "))
}

/// Builds a freshly discovered descriptor with the default description.
pub fn discovered(
    name: String,
    url: String,
    tokens: &[String],
    code: Option<String>,
) -> EndpointDescriptor {
    let category = category_from_url(&url, tokens);
    let description = format!("Documentation for {name}");
    EndpointDescriptor::new(name, url, category)
        .with_description(description)
        .with_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://docs.performgroup.com";
    const ROOT: &str = "/docs/rh/sdapi/";

    fn tokens() -> Vec<String> {
        crate::config::DocsConfig::default().category_tokens
    }

    #[test]
    fn test_normalize_relative_parents() {
        assert_eq!(
            normalize_url("../../Topics/soccer/opta-sdapi-match.htm", BASE, ROOT),
            "/docs/rh/sdapi/Topics/soccer/opta-sdapi-match.htm"
        );
        assert_eq!(normalize_url("../Topics/x.htm", BASE, ROOT), "/Topics/x.htm");
        assert_eq!(normalize_url("./x.htm", BASE, ROOT), "/x.htm");
        assert_eq!(normalize_url("x.htm", BASE, ROOT), "/x.htm");
        assert_eq!(normalize_url("/already/x.htm", BASE, ROOT), "/already/x.htm");
    }

    #[test]
    fn test_normalize_fixes_double_prefix() {
        assert_eq!(
            normalize_url("../../Topics/soccer/opta-sdapiamp-soccer-api-rankings.htm", BASE, ROOT),
            "/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-rankings.htm"
        );
    }

    #[test]
    fn test_normalize_absolute_urls() {
        assert_eq!(
            normalize_url("https://docs.performgroup.com/docs/rh/sdapi/a.htm", BASE, ROOT),
            "/docs/rh/sdapi/a.htm"
        );
        assert_eq!(
            normalize_url("https://elsewhere.example/docs/rh/sdapi/a.htm", BASE, ROOT),
            "https://elsewhere.example/docs/rh/sdapi/a.htm"
        );
    }

    #[test]
    fn test_normalize_absolute_url_under_base_path() {
        let base = "https://docs.performgroup.com/docs/rh/sdapi";
        assert_eq!(
            normalize_url("https://docs.performgroup.com/docs/rh/sdapi/Topics/a.htm?x=1", base, ROOT),
            "/Topics/a.htm?x=1"
        );
        // same origin, outside the base path
        assert_eq!(
            normalize_url("https://docs.performgroup.com/other/a.htm", base, ROOT),
            "https://docs.performgroup.com/other/a.htm"
        );
        assert_eq!(
            normalize_url("https://docs.performgroup.com/docs/rh/sdapiX/a.htm", base, ROOT),
            "https://docs.performgroup.com/docs/rh/sdapiX/a.htm"
        );
    }

    #[test]
    fn test_is_documentation_url() {
        assert!(is_documentation_url("/docs/rh/sdapi/Topics/a.htm", ROOT));
        assert!(is_documentation_url("/docs/rh/sdapi/Topics/a.html#top", ROOT));
        assert!(!is_documentation_url("/docs/rh/sdapi/Topics/a.pdf", ROOT));
        assert!(!is_documentation_url("/other/a.htm", ROOT));
        assert!(!is_documentation_url("https://elsewhere.example/docs/rh/sdapi/a.htm", ROOT));
    }

    #[test]
    fn test_name_from_url() {
        assert_eq!(
            name_from_url("/docs/rh/sdapi/Topics/soccer/opta-sdapi-soccer-api-possession-events.htm"),
            "Soccer Api Possession Events"
        );
        assert_eq!(name_from_url("/a/opta-sdapiamp-team-stats.html"), "Team Stats");
        assert_eq!(name_from_url("/"), "");
    }

    #[test]
    fn test_category_known_token() {
        assert_eq!(
            category_from_url("/docs/rh/sdapi/Topics/cricket/scores.htm", &tokens()),
            "cricket"
        );
        assert_eq!(
            category_from_url("/docs/rh/sdapi/Topics/soccer/feeds/x.htm", &tokens()),
            "soccer"
        );
    }

    #[test]
    fn test_category_after_anchor_and_default() {
        let no_tokens: Vec<String> = Vec::new();
        assert_eq!(category_from_url("/Topics/soccer/feeds/x.htm", &no_tokens), "feeds");
        // the file name is never a category
        assert_eq!(category_from_url("/Topics/soccer/x.htm", &no_tokens), "general");
        assert_eq!(category_from_url("/docs/rh/sdapi/x.htm", &tokens()), "general");
    }

    #[test]
    fn test_code_from_text() {
        assert_eq!(code_from_text("Match Events (MA3)"), Some("MA3".to_string()));
        assert_eq!(code_from_text("Possession (PE2) feed"), Some("PE2".to_string()));
        assert_eq!(code_from_text("Match Events"), None);
        assert_eq!(code_from_text("Lower (ma3)"), None);
    }

    #[test]
    fn test_strip_code() {
        assert_eq!(strip_code("Match Events (MA3)"), "Match Events");
        assert_eq!(strip_code("Possession (PE2) feed"), "Possession feed");
        assert_eq!(strip_code("Match Events"), "Match Events");
    }
}
