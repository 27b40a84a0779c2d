//! Asset URL resolution.
//!
//! Uploaded images are stored by the server as relative paths such as
//! `/uploads/logo.png`, served from the server root rather than from under the
//! API prefix. Externally hosted assets are stored as absolute URLs and pass
//! through untouched.

/// API-root marker stripped from the API base to get the asset base.
const API_SUFFIX: &str = "/api";

/// Compute the asset base from an API base: trailing slashes and a trailing
/// `/api` segment are removed.
///
/// `http://localhost:5000/api/` becomes `http://localhost:5000`.
pub fn asset_base(api_base: &str) -> &str {
    let trimmed = api_base.trim_end_matches('/');
    trimmed
        .strip_suffix(API_SUFFIX)
        .map(|base| base.trim_end_matches('/'))
        .unwrap_or(trimmed)
}

/// Returns true if `path` already names an absolute HTTP(S) URL.
pub fn is_absolute(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

/// Resolve a stored asset reference against the API base.
///
/// Returns `None` for a missing or blank path so callers can render a
/// placeholder. Absolute URLs are returned unchanged, which makes the
/// function idempotent. Relative paths are joined to the asset base with
/// exactly one separating slash, and runs of slashes inside the path collapse
/// to one.
pub fn resolve_asset_url(path: Option<&str>, api_base: &str) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if is_absolute(path) {
        return Some(path.to_string());
    }

    let mut url = String::with_capacity(api_base.len() + path.len() + 1);
    url.push_str(asset_base(api_base));
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(segment);
    }
    Some(url)
}
