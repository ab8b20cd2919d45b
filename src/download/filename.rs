//! Filename derivation for default output paths.
//!
//! Used by the CLI when no explicit output path is given: the destination
//! name comes from the URL's last path segment, percent-decoded and
//! sanitized, with a timestamp-based fallback for bare hosts.

use url::Url;

/// Derives a safe output filename from the URL path.
///
/// The last path segment is percent-decoded and sanitized; an empty path
/// falls back to `download_<timestamp>.bin`.
#[must_use]
pub fn fallback_filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last)
            .map_or_else(|_| last.to_string(), std::borrow::Cow::into_owned);
        let sanitized = sanitize_filename(&decoded);
        if !sanitized.trim_matches('_').is_empty() {
            return sanitized;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("download_{timestamp}.bin")
}

pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            // Also handle null and control characters
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    // Bare dot segments would escape the output directory.
    if matches!(sanitized.as_str(), "." | "..") {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    } else {
        sanitized
    }
}
