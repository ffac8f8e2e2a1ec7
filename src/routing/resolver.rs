//! Path resolution against a compiled table.
//!
//! # Responsibilities
//! - Walk the table level by level, recursing into children
//! - Follow redirects (bounded hop count)
//! - Fall back to the top-level catch-all
//!
//! # Design Decisions
//! - Total: every input resolves to exactly one innermost route
//! - Precedence per level is literal → parameter → catch-all, then declaration order
//! - A group whose own path matched exactly is itself the match when none of
//!   its children accept the empty remainder

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::observability::metrics;
use crate::routing::path::{decode_segment, normalize_path, segments, Location};
use crate::routing::pattern::Segment;
use crate::routing::table::{RouteId, RouteRecord, RouteTable};
use crate::views::ViewRef;

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Matched,
    Redirected,
    Fallback,
}

impl ResolutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionOutcome::Matched => "matched",
            ResolutionOutcome::Redirected => "redirected",
            ResolutionOutcome::Fallback => "fallback",
        }
    }
}

/// Result of resolving a navigation target.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Final location after redirects.
    pub location: Location,
    /// Matched chain, outermost first. Never empty; the last entry is `route`.
    pub matched: Vec<Arc<RouteRecord>>,
    /// Innermost matched route.
    pub route: Arc<RouteRecord>,
    pub params: BTreeMap<String, String>,
    /// Original target when a redirect was followed.
    pub redirected_from: Option<String>,
    pub is_fallback: bool,
}

impl Resolution {
    pub fn name(&self) -> Option<&str> {
        self.route.name.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.location.path
    }

    /// Title of the innermost matched route that has one.
    pub fn title(&self) -> Option<&str> {
        self.matched.iter().rev().find_map(|r| r.title.as_deref())
    }

    /// Views to load for this resolution, outermost first.
    pub fn views(&self) -> impl Iterator<Item = &ViewRef> {
        self.matched.iter().filter_map(|r| r.view.as_ref())
    }

    pub fn outcome(&self) -> ResolutionOutcome {
        if self.is_fallback {
            ResolutionOutcome::Fallback
        } else if self.redirected_from.is_some() {
            ResolutionOutcome::Redirected
        } else {
            ResolutionOutcome::Matched
        }
    }
}

type LevelMatch = (Vec<RouteId>, Vec<(String, String)>);

impl RouteTable {
    /// Resolve a navigation target (path, path with query, or absolute URL).
    pub fn resolve(&self, target: &str) -> Resolution {
        let location = Location::parse(target);
        let resolution = match location.clone().strip_base(&self.options.base_path) {
            Some(inside) => self.resolve_location(inside, 0, None),
            None => self.resolve_fallback(location, None),
        };

        metrics::record_resolution(resolution.name().unwrap_or("unnamed"), resolution.outcome());
        tracing::debug!(
            target = %target,
            path = %resolution.location.path,
            route = resolution.name().unwrap_or("unnamed"),
            outcome = resolution.outcome().as_str(),
            "Path resolved"
        );

        resolution
    }

    fn resolve_location(
        &self,
        location: Location,
        hops: u32,
        redirected_from: Option<String>,
    ) -> Resolution {
        let segs = segments(&location.path);
        let (chain, params) = self
            .match_level(&self.roots, &segs)
            .unwrap_or_else(|| self.fallback_match(&location.path));

        let params: BTreeMap<String, String> = params.into_iter().collect();
        let leaf = match chain.last() {
            Some(&id) => self.record(id).clone(),
            None => self.fallback().clone(),
        };

        if leaf.redirect.is_none() {
            return self.finish(location, chain, params, redirected_from);
        }

        let origin = redirected_from.unwrap_or_else(|| location.full_path());

        if hops >= self.options.max_redirect_hops {
            tracing::warn!(
                path = %location.path,
                hops,
                "Redirect hop limit reached, resolving to fallback"
            );
            return self.resolve_fallback(location, Some(origin));
        }

        let Some(target) = self.redirect_target(&leaf, &params) else {
            tracing::warn!(
                path = %location.path,
                route = leaf.name.as_deref().unwrap_or("unnamed"),
                "Redirect target could not be built, resolving to fallback"
            );
            return self.resolve_fallback(location, Some(origin));
        };

        let mut next = Location::parse(&target);
        if next.query.is_none() {
            next.query = location.query.clone();
        }
        if next.fragment.is_none() {
            next.fragment = location.fragment.clone();
        }

        tracing::debug!(from = %location.path, to = %next.path, "Following redirect");
        self.resolve_location(next, hops + 1, Some(origin))
    }

    fn finish(
        &self,
        location: Location,
        chain: Vec<RouteId>,
        params: BTreeMap<String, String>,
        redirected_from: Option<String>,
    ) -> Resolution {
        let matched: Vec<Arc<RouteRecord>> =
            chain.iter().map(|&id| self.record(id).clone()).collect();
        let route = matched.last().cloned().unwrap_or_else(|| self.fallback().clone());
        let is_fallback = route.id == self.fallback;

        Resolution {
            location,
            matched,
            route,
            params,
            redirected_from,
            is_fallback,
        }
    }

    fn resolve_fallback(&self, location: Location, redirected_from: Option<String>) -> Resolution {
        let (chain, params) = self.fallback_match(&location.path);
        self.finish(location, chain, params.into_iter().collect(), redirected_from)
    }

    fn fallback_match(&self, path: &str) -> LevelMatch {
        let params = match self.fallback().pattern.segments().last() {
            Some(Segment::CatchAll(name)) => {
                let value = segments(path)
                    .into_iter()
                    .map(decode_segment)
                    .collect::<Vec<_>>()
                    .join("/");
                vec![(name.clone(), value)]
            }
            _ => Vec::new(),
        };
        (vec![self.fallback], params)
    }

    fn match_level(&self, level: &[RouteId], segs: &[&str]) -> Option<LevelMatch> {
        for &id in level {
            let record = self.record(id);
            let Some(m) = record.pattern.match_prefix(segs, self.options.case_sensitive) else {
                continue;
            };
            let rest = &segs[m.consumed..];

            if !record.children.is_empty() {
                if let Some((mut chain, child_params)) = self.match_level(&record.children, rest) {
                    chain.insert(0, id);
                    let mut params = m.params;
                    params.extend(child_params);
                    return Some((chain, params));
                }
            }

            if rest.is_empty() && record.is_routable() {
                return Some((vec![id], m.params));
            }
        }
        None
    }

    /// Innermost route for a path, without following redirects.
    pub fn match_path(&self, path: &str) -> Arc<RouteRecord> {
        let location = Location::parse(path);
        let normalized = normalize_path(&location.path);
        let segs = segments(&normalized);
        let (chain, _) = self
            .match_level(&self.roots, &segs)
            .unwrap_or_else(|| self.fallback_match(&normalized));
        chain
            .last()
            .map(|&id| self.record(id).clone())
            .unwrap_or_else(|| self.fallback().clone())
    }
}
