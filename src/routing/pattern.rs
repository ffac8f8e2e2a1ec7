//! Route pattern parsing and matching.
//!
//! # Syntax
//! - Literal segment: `quiz`, `wrong-questions`
//! - Parameter: `:id` (matches any one non-empty segment)
//! - Catch-all, trailing only: `*`, `*rest`, `:name(.*)`, `:name(.*)*`
//!
//! # Design Decisions
//! - Patterns are relative to their parent; the empty child pattern matches
//!   the parent's own path
//! - Matching consumes a prefix of the request segments and reports how many
//!   were used, so the caller can recurse into children
//! - No regex: the only accepted parameter expression is `(.*)`

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::routing::path::decode_segment;

/// Parameter name used by anonymous catch-alls (`*`).
pub const DEFAULT_CATCH_ALL: &str = "pathMatch";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("top-level pattern must start with '/'")]
    MissingLeadingSlash,
    #[error("child pattern must be relative (no leading '/')")]
    AbsoluteChild,
    #[error("parameter segment '{0}' has no name")]
    EmptyParamName(String),
    #[error("parameter name '{0}' must be alphanumeric or '_'")]
    InvalidParamName(String),
    #[error("unsupported parameter expression in '{0}', only '(.*)' is accepted")]
    UnsupportedExpression(String),
    #[error("catch-all must be the last segment")]
    CatchAllNotLast,
    #[error("parameter '{0}' appears twice")]
    DuplicateParam(String),
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    fn classify(raw: &str) -> Result<Self, PatternError> {
        if let Some(name) = raw.strip_prefix('*') {
            let name = if name.is_empty() { DEFAULT_CATCH_ALL } else { name };
            check_name(raw, name)?;
            return Ok(Segment::CatchAll(name.to_string()));
        }

        if let Some(rest) = raw.strip_prefix(':') {
            return match rest.split_once('(') {
                None => {
                    check_name(raw, rest)?;
                    Ok(Segment::Param(rest.to_string()))
                }
                Some((name, expr)) => {
                    if expr != ".*)" && expr != ".*)*" {
                        return Err(PatternError::UnsupportedExpression(raw.to_string()));
                    }
                    check_name(raw, name)?;
                    Ok(Segment::CatchAll(name.to_string()))
                }
            };
        }

        Ok(Segment::Literal(raw.to_string()))
    }

    /// Precedence class: literals before parameters before catch-alls.
    fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => 0,
            Segment::Param(_) => 1,
            Segment::CatchAll(_) => 2,
        }
    }
}

fn check_name(raw: &str, name: &str) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyParamName(raw.to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidParamName(name.to_string()));
    }
    Ok(())
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(s) => write!(f, "{}", s),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::CatchAll(name) => write!(f, "*{}", name),
        }
    }
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Result of matching a pattern against the front of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    /// Number of request segments consumed.
    pub consumed: usize,
    /// Extracted parameters, percent-decoded.
    pub params: Vec<(String, String)>,
}

impl Pattern {
    /// Parse a pattern. `top_level` patterns must be absolute, children relative.
    pub fn parse(raw: &str, top_level: bool) -> Result<Self, PatternError> {
        let body = match (top_level, raw.strip_prefix('/')) {
            (true, Some(body)) => body,
            (true, None) => return Err(PatternError::MissingLeadingSlash),
            (false, Some(_)) => return Err(PatternError::AbsoluteChild),
            (false, None) => raw,
        };

        let segments = body
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::classify)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(pos) = segments.iter().position(|s| matches!(s, Segment::CatchAll(_))) {
            if pos + 1 != segments.len() {
                return Err(PatternError::CatchAllNotLast);
            }
        }

        let mut seen = Vec::new();
        for seg in &segments {
            if let Segment::Param(name) | Segment::CatchAll(name) = seg {
                if seen.contains(&name) {
                    return Err(PatternError::DuplicateParam(name.clone()));
                }
                seen.push(name);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches the empty path (`/` at top level, `""` as a child).
    pub fn is_index(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }

    /// Precedence class of the whole pattern (its least specific segment).
    pub fn rank(&self) -> u8 {
        self.segments.iter().map(Segment::rank).max().unwrap_or(0)
    }

    /// Match this pattern against the front of `path`.
    pub fn match_prefix(&self, path: &[&str], case_sensitive: bool) -> Option<PrefixMatch> {
        let mut params = Vec::new();

        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Literal(lit) => {
                    let got = path.get(i)?;
                    let equal = if case_sensitive {
                        got == lit
                    } else {
                        got.eq_ignore_ascii_case(lit)
                    };
                    if !equal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let got = path.get(i).filter(|s| !s.is_empty())?;
                    params.push((name.clone(), decode_segment(got)));
                }
                Segment::CatchAll(name) => {
                    let rest = path.get(i..).unwrap_or_default();
                    let value = rest
                        .iter()
                        .map(|s| decode_segment(s))
                        .collect::<Vec<_>>()
                        .join("/");
                    params.push((name.clone(), value));
                    return Some(PrefixMatch {
                        consumed: path.len(),
                        params,
                    });
                }
            }
        }

        Some(PrefixMatch {
            consumed: self.segments.len(),
            params,
        })
    }
}

/// Build a concrete path from absolute pattern segments.
///
/// Returns `None` if a parameter has no value. Catch-all values are inserted as-is.
pub fn render(segments: &[Segment], params: &BTreeMap<String, String>) -> Option<String> {
    let mut parts = Vec::with_capacity(segments.len());
    for seg in segments {
        match seg {
            Segment::Literal(lit) => parts.push(lit.clone()),
            Segment::Param(name) => {
                let value = params.get(name).filter(|v| !v.is_empty())?;
                parts.push(urlencoding::encode(value).into_owned());
            }
            Segment::CatchAll(name) => {
                let value = params.get(name)?;
                let value = value.trim_matches('/');
                if !value.is_empty() {
                    parts.push(value.to_string());
                }
            }
        }
    }
    Some(format!("/{}", parts.join("/")))
}
