//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the study router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration for the navigation host.
    pub listener: ListenerConfig,

    /// Navigation behaviour (base path, titles, redirects, view loading).
    pub navigation: NavigationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions, top level first.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            navigation: NavigationConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: default_routes(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Navigation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Prefix the application is mounted under; stripped before matching.
    pub base_path: String,

    /// Document title used when no matched route carries one.
    pub default_title: String,

    /// Compare literal segments case-sensitively.
    pub case_sensitive: bool,

    /// Maximum redirect hops followed for a single navigation.
    pub max_redirect_hops: u32,

    /// Directory holding view bundles. Without it views load as empty manifests.
    pub views_dir: Option<String>,

    /// Upper bound for a single view load in milliseconds.
    pub load_timeout_ms: Option<u64>,

    /// Route name -> view history key, recorded after navigation.
    pub tracked_views: BTreeMap<String, String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        let mut tracked_views = BTreeMap::new();
        tracked_views.insert("QuizMode".to_string(), "quiz".to_string());
        tracked_views.insert("ReviewMode".to_string(), "review".to_string());

        Self {
            base_path: "/".to_string(),
            default_title: DEFAULT_TITLE.to_string(),
            case_sensitive: false,
            max_redirect_hops: 1,
            views_dir: None,
            load_timeout_ms: None,
            tracked_views,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A single route entry, possibly with nested children.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Path pattern. Top-level patterns start with `/`, child patterns are relative.
    pub path: String,

    /// Unique route name, used for named redirects and history tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// View module loaded when the route matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    /// Load the view at startup instead of on first navigation.
    #[serde(default)]
    pub eager: bool,

    /// Redirect applied when this route is the innermost match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectConfig>,

    /// Document title for this route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Pass route parameters to the view as props.
    #[serde(default)]
    pub props: bool,

    /// Nested routes matched against the remaining path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteConfig>,
}

/// Redirect target, either a literal path or a named route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RedirectConfig {
    Path(String),
    Named { name: String },
}

impl fmt::Display for RedirectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectConfig::Path(path) => f.write_str(path),
            RedirectConfig::Named { name } => f.write_str(name),
        }
    }
}

pub const DEFAULT_TITLE: &str = "Study Quiz";

fn page(path: &str, name: &str, view: &str, title: &str) -> RouteConfig {
    RouteConfig {
        path: path.to_string(),
        name: Some(name.to_string()),
        view: Some(view.to_string()),
        title: Some(format!("{} - {}", title, DEFAULT_TITLE)),
        ..Default::default()
    }
}

fn group(
    path: &str,
    name: &str,
    view: &str,
    title: &str,
    redirect_to: Option<&str>,
    children: Vec<RouteConfig>,
) -> RouteConfig {
    RouteConfig {
        redirect: redirect_to.map(|n| RedirectConfig::Named { name: n.to_string() }),
        children,
        ..page(path, name, view, title)
    }
}

/// The built-in study/quiz route table.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            eager: true,
            ..page("/", "Home", "views/Home.vue", "Home")
        },
        page("/quiz", "QuizMode", "views/QuizMode.vue", "Quiz"),
        page("/review", "ReviewMode", "views/ReviewMode.vue", "Review Mistakes"),
        page("/notes", "NoteList", "views/notes/NoteList.vue", "My Notes"),
        page("/bookmarks", "BookmarkList", "views/bookmarks/BookmarkList.vue", "Bookmarks"),
        page("/flashcards", "FlashcardMode", "views/FlashcardMode.vue", "Flashcards"),
        page("/drill", "DrillMode", "views/DrillMode.vue", "Smart Drill"),
        group(
            "/questions",
            "QuestionManager",
            "views/QuestionManager.vue",
            "Question Bank",
            None,
            vec![
                page("", "QuestionList", "views/questions/QuestionList.vue", "Questions"),
                page(
                    "import",
                    "QuestionImport",
                    "views/questions/QuestionImport.vue",
                    "Import Questions",
                ),
                page(
                    "backup",
                    "QuestionBackup",
                    "views/questions/QuestionBackup.vue",
                    "Question Backup",
                ),
                page(
                    "banks",
                    "QuestionBanks",
                    "views/questions/QuestionBanks.vue",
                    "Question Banks",
                ),
                RouteConfig {
                    props: true,
                    ..page(
                        ":id",
                        "QuestionDetail",
                        "views/questions/QuestionDetail.vue",
                        "Question Detail",
                    )
                },
            ],
        ),
        group(
            "/stats",
            "Statistics",
            "views/Statistics.vue",
            "Statistics",
            Some("StatsOverview"),
            vec![
                page("overview", "StatsOverview", "views/stats/StatsOverview.vue", "Overview"),
                page(
                    "wrong-questions",
                    "StatsWrongQuestions",
                    "views/stats/StatsWrongQuestions.vue",
                    "Wrong Questions",
                ),
                page("advisor", "StatsAdvisor", "views/stats/StatsAdvisor.vue", "Study Advisor"),
                page("trends", "StatsTrends", "views/stats/StatsTrends.vue", "Trends"),
                page("timeline", "StatsTimeline", "views/stats/StatsTimeline.vue", "Timeline"),
                page("progress", "StatsProgress", "views/stats/StatsProgress.vue", "Progress"),
            ],
        ),
        group(
            "/settings",
            "Settings",
            "views/Settings.vue",
            "Settings",
            Some("SettingsGeneral"),
            vec![
                page("general", "SettingsGeneral", "views/settings/SettingsGeneral.vue", "General"),
                page("api", "SettingsApi", "views/settings/SettingsApi.vue", "API"),
                page("font", "SettingsFont", "views/settings/SettingsFont.vue", "Font"),
                page(
                    "backup",
                    "SettingsBackup",
                    "views/settings/SettingsBackup.vue",
                    "Backup & Restore",
                ),
            ],
        ),
        page("/:catchAll(.*)", "NotFound", "views/NotFound.vue", "404 Not Found"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_builtin_table() {
        let config: RouterConfig =
            toml::from_str("[listener]\nbind_address = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.routes, default_routes());
        assert_eq!(config.navigation.max_redirect_hops, 1);
        assert_eq!(
            config.navigation.tracked_views.get("QuizMode").map(String::as_str),
            Some("quiz")
        );
    }

    #[test]
    fn test_redirect_forms() {
        let toml_src = r#"
            [[routes]]
            path = "/old"
            redirect = "/new"

            [[routes]]
            path = "/stats"
            redirect = { name = "StatsOverview" }
        "#;
        let config: RouterConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.routes[0].redirect, Some(RedirectConfig::Path("/new".into())));
        assert_eq!(
            config.routes[1].redirect,
            Some(RedirectConfig::Named { name: "StatsOverview".into() })
        );
    }

    #[test]
    fn test_log_format_parsing() {
        let config: RouterConfig =
            toml::from_str("[observability]\nlog_format = \"json\"\n").unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
