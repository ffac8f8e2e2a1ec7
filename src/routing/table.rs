//! Compiled route table.
//!
//! # Responsibilities
//! - Compile `RouteConfig` trees into flat, indexed records
//! - Order each level by match precedence
//! - Name index for named redirects and link building
//! - Reject redirect chains at build time
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Records are `Arc`'d so a resolution outlives a table swap
//! - Exactly one top-level catch-all, found at build time

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::config::schema::{NavigationConfig, RedirectConfig, RouteConfig};
use crate::config::validation::{join_display, validate_routes, ValidationError};
use crate::routing::pattern::{render, Pattern, Segment};
use crate::views::ViewRef;

/// Index of a record inside its table.
pub type RouteId = usize;

/// Matching options taken from the navigation config.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub base_path: String,
    pub case_sensitive: bool,
    pub max_redirect_hops: u32,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::from(&NavigationConfig::default())
    }
}

impl From<&NavigationConfig> for MatchOptions {
    fn from(nav: &NavigationConfig) -> Self {
        Self {
            base_path: nav.base_path.clone(),
            case_sensitive: nav.case_sensitive,
            max_redirect_hops: nav.max_redirect_hops,
        }
    }
}

/// A compiled route.
#[derive(Debug, Serialize)]
pub struct RouteRecord {
    #[serde(skip)]
    pub id: RouteId,
    pub name: Option<String>,
    /// Absolute display pattern, e.g. `/questions/:id`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub props: bool,
    pub depth: usize,
    #[serde(skip)]
    pub pattern: Pattern,
    #[serde(skip)]
    pub full_segments: Vec<Segment>,
    #[serde(skip)]
    pub parent: Option<RouteId>,
    /// Children in match order.
    #[serde(skip)]
    pub children: Vec<RouteId>,
}

impl RouteRecord {
    /// Whether a navigation may end on this record.
    pub fn is_routable(&self) -> bool {
        self.view.is_some() || self.redirect.is_some()
    }

    /// Names of the parameters this route's absolute pattern captures.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.full_segments.iter().filter_map(|seg| match seg {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// The immutable route table.
#[derive(Debug)]
pub struct RouteTable {
    /// Records in declaration order (depth-first).
    pub(crate) records: Vec<Arc<RouteRecord>>,
    /// Top-level records in match order.
    pub(crate) roots: Vec<RouteId>,
    by_name: HashMap<String, RouteId>,
    pub(crate) fallback: RouteId,
    pub(crate) options: MatchOptions,
}

impl RouteTable {
    /// Validate and compile a route tree.
    pub fn build(
        routes: &[RouteConfig],
        options: MatchOptions,
    ) -> Result<Self, Vec<ValidationError>> {
        let nav = NavigationConfig {
            case_sensitive: options.case_sensitive,
            ..NavigationConfig::default()
        };
        let errors = validate_routes(routes, &nav);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut builder = Builder::default();
        let roots = builder
            .compile_level(routes, None, "/", &[])
            .map_err(|e| vec![e])?;

        let fallback = roots
            .iter()
            .copied()
            .find(|&id| builder.records[id].pattern.is_catch_all())
            .ok_or_else(|| vec![ValidationError::MissingFallback])?;

        let by_name = builder
            .records
            .iter()
            .filter_map(|r| r.name.clone().map(|n| (n, r.id)))
            .collect();

        let table = Self {
            records: builder.records.into_iter().map(Arc::new).collect(),
            roots,
            by_name,
            fallback,
            options,
        };

        let chain_errors = table.redirect_chain_errors();
        if !chain_errors.is_empty() {
            return Err(chain_errors);
        }

        tracing::debug!(routes = table.records.len(), "Route table compiled");
        Ok(table)
    }

    /// The built-in study/quiz table with default options.
    pub fn builtin() -> Result<Self, Vec<ValidationError>> {
        Self::build(&crate::config::schema::default_routes(), MatchOptions::default())
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// All records in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteRecord>> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RouteRecord>> {
        self.by_name.get(name).map(|&id| &self.records[id])
    }

    pub(crate) fn record(&self, id: RouteId) -> &Arc<RouteRecord> {
        &self.records[id]
    }

    /// The top-level catch-all.
    pub fn fallback(&self) -> &Arc<RouteRecord> {
        &self.records[self.fallback]
    }

    /// Views marked eager, preloaded before the first navigation.
    pub fn eager_views(&self) -> impl Iterator<Item = &ViewRef> {
        self.records
            .iter()
            .filter_map(|r| r.view.as_ref())
            .filter(|v| v.eager)
    }

    /// Build the concrete path of a named route.
    ///
    /// Returns `None` for unknown names or missing parameters. The path is
    /// relative to the base path.
    pub fn href_for(&self, name: &str, params: &BTreeMap<String, String>) -> Option<String> {
        let record = self.get(name)?;
        render(&record.full_segments, params)
    }

    /// Concrete redirect target for `record` given the current parameters.
    pub(crate) fn redirect_target(
        &self,
        record: &RouteRecord,
        params: &BTreeMap<String, String>,
    ) -> Option<String> {
        match record.redirect.as_ref()? {
            RedirectConfig::Named { name } => self.href_for(name, params),
            RedirectConfig::Path(target) => substitute_params(target, params),
        }
    }

    fn redirect_chain_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for record in self.records.iter().filter(|r| r.redirect.is_some()) {
            // Sample values stand in for the real parameters.
            let sample: BTreeMap<String, String> = record
                .param_names()
                .map(|name| (name.to_string(), "1".to_string()))
                .collect();

            let target_label = match &record.redirect {
                Some(RedirectConfig::Named { name }) => name.clone(),
                Some(RedirectConfig::Path(p)) => p.clone(),
                None => continue,
            };

            let Some(target) = self.redirect_target(record, &sample) else {
                errors.push(ValidationError::UnresolvableRedirect {
                    path: record.path.clone(),
                    target: target_label,
                });
                continue;
            };

            let landed = self.match_path(&target);
            if landed.redirect.is_some() {
                errors.push(ValidationError::RedirectChain {
                    path: record.path.clone(),
                    target: target_label,
                });
            }
        }

        errors
    }
}

/// Replace `:name` segments of a redirect path with parameter values.
fn substitute_params(target: &str, params: &BTreeMap<String, String>) -> Option<String> {
    let (path, suffix) = match target.find(['?', '#']) {
        Some(pos) => target.split_at(pos),
        None => (target, ""),
    };

    let mut out = Vec::new();
    for seg in path.split('/') {
        match seg.strip_prefix(':') {
            Some(name) => out.push(urlencoding::encode(params.get(name)?).into_owned()),
            None => out.push(seg.to_string()),
        }
    }
    Some(format!("{}{}", out.join("/"), suffix))
}

#[derive(Default)]
struct Builder {
    records: Vec<RouteRecord>,
}

impl Builder {
    fn compile_level(
        &mut self,
        routes: &[RouteConfig],
        parent: Option<RouteId>,
        parent_display: &str,
        parent_segments: &[Segment],
    ) -> Result<Vec<RouteId>, ValidationError> {
        let top_level = parent.is_none();
        let depth = parent.map(|p| self.records[p].depth + 1).unwrap_or(0);
        let mut ids = Vec::with_capacity(routes.len());

        for config in routes {
            let display = join_display(parent_display, &config.path, top_level);
            let pattern = Pattern::parse(&config.path, top_level).map_err(|source| {
                ValidationError::InvalidPattern {
                    path: display.clone(),
                    source,
                }
            })?;

            let mut full_segments = parent_segments.to_vec();
            full_segments.extend(pattern.segments().iter().cloned());

            let id = self.records.len();
            self.records.push(RouteRecord {
                id,
                name: config.name.clone(),
                path: display.clone(),
                view: config.view.as_ref().map(|module| ViewRef {
                    module: module.clone(),
                    eager: config.eager,
                }),
                redirect: config.redirect.clone(),
                title: config.title.clone(),
                props: config.props,
                depth,
                pattern,
                full_segments: full_segments.clone(),
                parent,
                children: Vec::new(),
            });

            let children =
                self.compile_level(&config.children, Some(id), &display, &full_segments)?;
            self.records[id].children = children;
            ids.push(id);
        }

        // Stable: declaration order breaks ties within a precedence class.
        ids.sort_by_key(|&id| self.records[id].pattern.rank());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str, name: &str) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            name: Some(name.to_string()),
            view: Some(format!("views/{}.vue", name)),
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_table() {
        let table = RouteTable::builtin().unwrap();
        assert_eq!(table.len(), 26);
        assert_eq!(table.fallback().name.as_deref(), Some("NotFound"));

        let detail = table.get("QuestionDetail").unwrap();
        assert_eq!(detail.path, "/questions/:id");
        assert!(detail.props);
        assert_eq!(detail.depth, 1);

        let eager: Vec<_> = table.eager_views().map(|v| v.module.as_str()).collect();
        assert_eq!(eager, vec!["views/Home.vue"]);
    }

    #[test]
    fn test_children_sorted_by_precedence() {
        let table = RouteTable::builtin().unwrap();
        let manager = table.get("QuestionManager").unwrap();
        let names: Vec<_> = manager
            .children
            .iter()
            .map(|&id| table.record(id).name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names.last().map(String::as_str), Some("QuestionDetail"));

        let last_root = *table.roots.last().unwrap();
        assert_eq!(last_root, table.fallback);
    }

    #[test]
    fn test_href_for() {
        let table = RouteTable::builtin().unwrap();
        let mut params = BTreeMap::new();
        assert_eq!(table.href_for("StatsOverview", &params).as_deref(), Some("/stats/overview"));
        assert_eq!(table.href_for("QuestionList", &params).as_deref(), Some("/questions"));
        assert_eq!(table.href_for("QuestionDetail", &params), None);

        params.insert("id".to_string(), "7".to_string());
        assert_eq!(table.href_for("QuestionDetail", &params).as_deref(), Some("/questions/7"));
        assert_eq!(table.href_for("Nope", &params), None);
    }

    #[test]
    fn test_redirect_chain_rejected() {
        let routes = vec![
            RouteConfig {
                path: "/a".into(),
                redirect: Some(RedirectConfig::Path("/b".into())),
                ..Default::default()
            },
            RouteConfig {
                path: "/b".into(),
                redirect: Some(RedirectConfig::Path("/c".into())),
                ..Default::default()
            },
            page("/c", "C"),
            page("/*", "NotFound"),
        ];
        let errors = RouteTable::build(&routes, MatchOptions::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RedirectChain {
                path: "/a".into(),
                target: "/b".into()
            }]
        );
    }

    #[test]
    fn test_redirect_with_params_builds() {
        let routes = vec![
            RouteConfig {
                path: "/q/:id".into(),
                redirect: Some(RedirectConfig::Path("/questions/:id".into())),
                ..Default::default()
            },
            page("/questions/:id", "Detail"),
            page("/*", "NotFound"),
        ];
        assert!(RouteTable::build(&routes, MatchOptions::default()).is_ok());

        let routes = vec![
            RouteConfig {
                path: "/q".into(),
                redirect: Some(RedirectConfig::Named { name: "Detail".into() }),
                ..Default::default()
            },
            page("/questions/:id", "Detail"),
            page("/*", "NotFound"),
        ];
        let errors = RouteTable::build(&routes, MatchOptions::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvableRedirect {
                path: "/q".into(),
                target: "Detail".into()
            }]
        );
    }

    #[test]
    fn test_substitute_params() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), "a b".to_string());
        assert_eq!(
            substitute_params("/questions/:id?tab=notes", &params).as_deref(),
            Some("/questions/a%20b?tab=notes")
        );
        assert_eq!(substitute_params("/x/:missing", &params), None);
    }
}
