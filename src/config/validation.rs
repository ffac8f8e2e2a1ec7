//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Route table invariants: unique paths per level, unique names, one
//!   top-level fallback, every route leads somewhere
//! - Redirect integrity: named targets exist, no redirect chains
//! - Value ranges and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Component, Path};

use thiserror::Error;

use crate::config::schema::{NavigationConfig, RedirectConfig, RouteConfig, RouterConfig};
use crate::routing::pattern::{Pattern, PatternError, Segment};
use crate::routing::{MatchOptions, RouteTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route table is empty")]
    EmptyRouteTable,

    #[error("no top-level catch-all route, some paths would resolve to nothing")]
    MissingFallback,

    #[error("route '{path}': {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("duplicate path '{path}' under '{parent}'")]
    DuplicatePath { parent: String, path: String },

    #[error("more than one catch-all under '{parent}'")]
    DuplicateCatchAll { parent: String },

    #[error("duplicate route name '{0}'")]
    DuplicateName(String),

    #[error("route '{0}' has no view, redirect or children")]
    NoTarget(String),

    #[error("route '{path}' redirects to unknown route '{name}'")]
    UnknownRedirectName { path: String, name: String },

    #[error("route '{path}' redirect target '{target}' must be an absolute path")]
    RelativeRedirect { path: String, target: String },

    #[error("route '{path}' redirect target '{target}' cannot be built from its parameters")]
    UnresolvableRedirect { path: String, target: String },

    #[error("route '{path}' redirects to '{target}', which redirects again")]
    RedirectChain { path: String, target: String },

    #[error("view module '{0}' must be a relative path without '..'")]
    UnsafeViewModule(String),

    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: {reason}")]
    InvalidValue { field: &'static str, reason: &'static str },
}

/// Validate a whole configuration, including a trial build of the route table.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::InvalidValue {
            field: "listener.request_timeout_secs",
            reason: "must be greater than 0",
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let nav = &config.navigation;
    if !nav.base_path.starts_with('/') {
        errors.push(ValidationError::InvalidValue {
            field: "navigation.base_path",
            reason: "must start with '/'",
        });
    }
    if nav.max_redirect_hops == 0 {
        errors.push(ValidationError::InvalidValue {
            field: "navigation.max_redirect_hops",
            reason: "must be at least 1",
        });
    }
    if nav.load_timeout_ms == Some(0) {
        errors.push(ValidationError::InvalidValue {
            field: "navigation.load_timeout_ms",
            reason: "must be greater than 0",
        });
    }

    if let Err(route_errors) = RouteTable::build(&config.routes, MatchOptions::from(nav)) {
        errors.extend(route_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Structural checks on the route tree.
///
/// Redirect chains need a compiled table and are checked by [`RouteTable::build`].
pub fn validate_routes(routes: &[RouteConfig], nav: &NavigationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if routes.is_empty() {
        errors.push(ValidationError::EmptyRouteTable);
        return errors;
    }

    let mut names = HashSet::new();
    collect_names(routes, &mut names, &mut errors);

    check_level(routes, "/", true, nav, &names, &mut errors);

    let has_fallback = routes
        .iter()
        .filter_map(|r| Pattern::parse(&r.path, true).ok())
        .any(|p| p.is_catch_all());
    if !has_fallback {
        errors.push(ValidationError::MissingFallback);
    }

    errors
}

fn collect_names(
    routes: &[RouteConfig],
    names: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for route in routes {
        if let Some(name) = &route.name {
            if !names.insert(name.clone()) {
                errors.push(ValidationError::DuplicateName(name.clone()));
            }
        }
        collect_names(&route.children, names, errors);
    }
}

fn check_level(
    routes: &[RouteConfig],
    parent: &str,
    top_level: bool,
    nav: &NavigationConfig,
    names: &HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    let mut shapes = HashSet::new();
    let mut catch_alls = 0;

    for route in routes {
        let display = join_display(parent, &route.path, top_level);

        match Pattern::parse(&route.path, top_level) {
            Ok(pattern) => {
                if pattern.is_catch_all() {
                    catch_alls += 1;
                } else if !shapes.insert(shape(&pattern, nav.case_sensitive)) {
                    errors.push(ValidationError::DuplicatePath {
                        parent: parent.to_string(),
                        path: route.path.clone(),
                    });
                }
            }
            Err(source) => errors.push(ValidationError::InvalidPattern {
                path: display.clone(),
                source,
            }),
        }

        if route.view.is_none() && route.redirect.is_none() && route.children.is_empty() {
            errors.push(ValidationError::NoTarget(display.clone()));
        }

        if let Some(module) = &route.view {
            if !is_safe_module(module) {
                errors.push(ValidationError::UnsafeViewModule(module.clone()));
            }
        }

        match &route.redirect {
            Some(RedirectConfig::Named { name }) if !names.contains(name) => {
                errors.push(ValidationError::UnknownRedirectName {
                    path: display.clone(),
                    name: name.clone(),
                });
            }
            Some(RedirectConfig::Path(target)) if !target.starts_with('/') => {
                errors.push(ValidationError::RelativeRedirect {
                    path: display.clone(),
                    target: target.clone(),
                });
            }
            _ => {}
        }

        check_level(&route.children, &display, false, nav, names, errors);
    }

    if catch_alls > 1 {
        errors.push(ValidationError::DuplicateCatchAll {
            parent: parent.to_string(),
        });
    }
}

/// Key that identifies patterns matching the same set of paths.
fn shape(pattern: &Pattern, case_sensitive: bool) -> Vec<String> {
    pattern
        .segments()
        .iter()
        .map(|seg| match seg {
            Segment::Literal(lit) if case_sensitive => lit.clone(),
            Segment::Literal(lit) => lit.to_ascii_lowercase(),
            Segment::Param(_) => ":".to_string(),
            Segment::CatchAll(_) => "*".to_string(),
        })
        .collect()
}

/// Absolute display form of a route pattern, e.g. `/questions/:id`.
pub(crate) fn join_display(parent: &str, path: &str, top_level: bool) -> String {
    if top_level || path.starts_with('/') {
        return path.to_string();
    }
    if path.is_empty() {
        return parent.to_string();
    }
    if parent.ends_with('/') {
        format!("{}{}", parent, path)
    } else {
        format!("{}/{}", parent, path)
    }
}

fn is_safe_module(module: &str) -> bool {
    !module.is_empty()
        && Path::new(module)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_routes;

    fn route(path: &str, name: &str) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            name: Some(name.to_string()),
            view: Some(format!("views/{}.vue", name)),
            ..Default::default()
        }
    }

    fn fallback() -> RouteConfig {
        route("/:catchAll(.*)", "NotFound")
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&RouterConfig::default()), Ok(()));
    }

    #[test]
    fn test_empty_and_missing_fallback() {
        let nav = NavigationConfig::default();
        assert_eq!(validate_routes(&[], &nav), vec![ValidationError::EmptyRouteTable]);

        let errors = validate_routes(&[route("/", "Home")], &nav);
        assert_eq!(errors, vec![ValidationError::MissingFallback]);
    }

    #[test]
    fn test_duplicates_reported_together() {
        let nav = NavigationConfig::default();
        let routes = vec![
            route("/quiz", "Quiz"),
            route("/Quiz", "QuizAgain"),
            route("/review", "Quiz"),
            fallback(),
            route("/*", "Other"),
        ];
        let errors = validate_routes(&routes, &nav);
        assert!(errors.contains(&ValidationError::DuplicateName("Quiz".into())));
        assert!(errors.contains(&ValidationError::DuplicatePath {
            parent: "/".into(),
            path: "/Quiz".into()
        }));
        assert!(errors.contains(&ValidationError::DuplicateCatchAll { parent: "/".into() }));
    }

    #[test]
    fn test_param_siblings_conflict() {
        let nav = NavigationConfig::default();
        let mut group = route("/questions", "Questions");
        group.children = vec![route(":id", "ById"), route(":slug", "BySlug")];
        let errors = validate_routes(&[group, fallback()], &nav);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicatePath {
                parent: "/questions".into(),
                path: ":slug".into()
            }]
        );
    }

    #[test]
    fn test_redirect_targets() {
        let nav = NavigationConfig::default();
        let routes = vec![
            RouteConfig {
                path: "/stats".into(),
                redirect: Some(RedirectConfig::Named { name: "Missing".into() }),
                ..Default::default()
            },
            RouteConfig {
                path: "/old".into(),
                redirect: Some(RedirectConfig::Path("new".into())),
                ..Default::default()
            },
            fallback(),
        ];
        let errors = validate_routes(&routes, &nav);
        assert!(errors.contains(&ValidationError::UnknownRedirectName {
            path: "/stats".into(),
            name: "Missing".into()
        }));
        assert!(errors.contains(&ValidationError::RelativeRedirect {
            path: "/old".into(),
            target: "new".into()
        }));
    }

    #[test]
    fn test_route_without_target_and_unsafe_module() {
        let nav = NavigationConfig::default();
        let routes = vec![
            RouteConfig {
                path: "/empty".into(),
                ..Default::default()
            },
            RouteConfig {
                path: "/escape".into(),
                view: Some("../secrets.vue".into()),
                ..Default::default()
            },
            fallback(),
        ];
        let errors = validate_routes(&routes, &nav);
        assert!(errors.contains(&ValidationError::NoTarget("/empty".into())));
        assert!(errors.contains(&ValidationError::UnsafeViewModule("../secrets.vue".into())));
    }

    #[test]
    fn test_invalid_pattern_reports_full_path() {
        let nav = NavigationConfig::default();
        let mut group = route("/questions", "Questions");
        group.children = vec![route("/import", "Import")];
        let errors = validate_routes(&[group, fallback()], &nav);
        assert_eq!(
            errors,
            vec![ValidationError::InvalidPattern {
                path: "/import".into(),
                source: PatternError::AbsoluteChild
            }]
        );
    }

    #[test]
    fn test_config_level_values() {
        let mut config = RouterConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.navigation.max_redirect_hops = 0;
        config.navigation.base_path = "app".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_join_display() {
        assert_eq!(join_display("/", "/questions", true), "/questions");
        assert_eq!(join_display("/questions", ":id", false), "/questions/:id");
        assert_eq!(join_display("/questions", "", false), "/questions");
        assert_eq!(default_routes().len(), 11);
    }
}
