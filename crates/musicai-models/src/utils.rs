//! Utility functions for result URL parsing.
//!
//! Shared by the result downloader and the batch orchestrator to derive
//! local file names from the URLs a finished job returns.

use url::Url;

/// True if `value` parses as an absolute `http`/`https` URL.
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Last path segment of a URL, percent-decoded. Query and fragment are ignored.
///
/// Returns `None` for unparseable URLs or URLs ending in `/`.
pub fn extract_name_from_url(file_url: &str) -> Option<String> {
    let url = Url::parse(file_url.trim()).ok()?;
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(last)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| last.to_string());
    Some(decoded)
}

/// Extension (without the dot) of the URL's file name, if it has one.
pub fn extract_file_extension_from_url(file_url: &str) -> Option<String> {
    let name = extract_name_from_url(file_url)?;
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_string()),
        _ => None,
    }
}

/// Make a server-provided name safe to use as a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
