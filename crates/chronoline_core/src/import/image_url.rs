//! Image URL normalizer.
//!
//! Rewrites recognized media-host references (wiki file pages, CDN
//! thumbnail paths, bare filenames) into a canonical fetchable URL. Pure
//! string rewriting; nothing is fetched.

use once_cell::sync::Lazy;
use regex::Regex;

const FILE_PATH_BASE: &str = "https://commons.wikimedia.org/wiki/Special:FilePath/";

static WIKI_FILE_PAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:[a-z0-9-]+\.)*(?:wikipedia|wikimedia)\.org/wiki/(?:file|image):([^?#]+)")
        .expect("valid wiki file page regex")
});
static WIKI_THUMB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://upload\.wikimedia\.org/(.+?)/thumb/([0-9a-f])/([0-9a-f]{2})/([^/]+)/[^/]+$")
        .expect("valid wiki thumbnail regex")
});
static BARE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:file|image):)?([^/:?#]+\.(?:jpe?g|png|gif|svg|webp|tiff?))$")
        .expect("valid bare filename regex")
});

/// Returns the canonical image URL, or `None` for blank input.
///
/// Unrecognized URLs are returned trimmed but otherwise unchanged.
pub fn normalize_image_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let absolute = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else {
        trimmed.to_string()
    };

    if let Some(caps) = WIKI_THUMB_RE.captures(&absolute) {
        return Some(format!(
            "https://upload.wikimedia.org/{}/{}/{}/{}",
            &caps[1], &caps[2], &caps[3], &caps[4]
        ));
    }

    if let Some(caps) = WIKI_FILE_PAGE_RE.captures(&absolute) {
        return Some(file_path_url(&caps[1]));
    }

    if let Some(caps) = BARE_FILE_RE.captures(&absolute) {
        return Some(file_path_url(&caps[1]));
    }

    Some(absolute)
}

fn file_path_url(file_name: &str) -> String {
    format!("{FILE_PATH_BASE}{}", file_name.trim().replace(' ', "_"))
}
