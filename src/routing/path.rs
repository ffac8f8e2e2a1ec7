//! Request path handling.
//!
//! Splits a navigation target into path, query and fragment, normalizes the
//! path and strips the configured base path before matching.

use std::borrow::Cow;

use url::Url;

/// A navigation target broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Normalized path, always starting with `/`.
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Location {
    /// Parse a navigation target.
    ///
    /// Accepts plain paths (`/stats?tab=1#top`) and absolute deep links
    /// (`https://host/stats`). Only path, query and fragment are kept.
    pub fn parse(target: &str) -> Self {
        let target = target.trim();

        if target.starts_with("http://") || target.starts_with("https://") {
            if let Ok(url) = Url::parse(target) {
                return Self {
                    path: normalize_path(url.path()).into_owned(),
                    query: non_empty(url.query()),
                    fragment: non_empty(url.fragment()),
                };
            }
        }

        let (rest, fragment) = match target.split_once('#') {
            Some((rest, fragment)) => (rest, non_empty(Some(fragment))),
            None => (target, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, non_empty(Some(query))),
            None => (rest, None),
        };

        Self {
            path: normalize_path(path).into_owned(),
            query,
            fragment,
        }
    }

    /// Remove `base` from the front of the path.
    ///
    /// Returns `None` when the path lies outside the base.
    pub fn strip_base(mut self, base: &str) -> Option<Self> {
        let base = normalize_path(base);
        if base == "/" {
            return Some(self);
        }
        if self.path == base {
            self.path = "/".to_string();
            return Some(self);
        }
        let rest = self.path.strip_prefix(base.as_ref())?;
        if !rest.starts_with('/') {
            return None;
        }
        self.path = rest.to_string();
        Some(self)
    }

    /// Path with query and fragment re-attached.
    pub fn full_path(&self) -> String {
        let mut out = self.path.clone();
        if let Some(q) = &self.query {
            out.push('?');
            out.push_str(q);
        }
        if let Some(f) = &self.fragment {
            out.push('#');
            out.push_str(f);
        }
        out
    }
}

fn non_empty(part: Option<&str>) -> Option<String> {
    part.filter(|p| !p.is_empty()).map(str::to_string)
}

/// Checks whether a path is already canonical: leading `/`, no trailing `/`,
/// no empty or dot segments, no backslashes.
pub fn is_canonical(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    path.starts_with('/')
        && !path.ends_with('/')
        && !path.contains("//")
        && !path.contains('\\')
        && !path.split('/').any(|s| s == "." || s == "..")
}

/// Normalize a path. Canonical input is returned borrowed.
///
/// - Backslashes become slashes
/// - Repeated slashes collapse
/// - Trailing slash is dropped
/// - `.` segments are dropped, `..` removes the previous segment (never above `/`)
/// - Empty input becomes `/`
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_canonical(path) {
        return Cow::Borrowed(path);
    }

    let unified = path.replace('\\', "/");
    let mut kept: Vec<&str> = Vec::new();
    for seg in unified.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                kept.pop();
            }
            _ => kept.push(seg),
        }
    }
    let joined = kept.join("/");

    if joined.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", joined))
    }
}

/// Split a normalized path into its segments. `/` has none.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Percent-decode a parameter value, keeping the raw text if it is not valid UTF-8.
pub fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}
