//! Worker configuration
//!
//! The configuration is constructor-injected by the hosting environment: the
//! precache list and version come from the build/deploy collaborator, and the
//! route table maps URL patterns to caching strategies. The core never loads
//! files or environment variables itself.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

use offcache_store::BucketId;

use crate::strategy::Strategy;

/// Maximum iterations allowed for pattern matching to prevent ReDoS
const MAX_MATCH_ITERATIONS: usize = 10000;

/// Worker configuration supplied by the hosting environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Bucket name for this worker's cache
    pub cache_name: String,
    /// Deployed version; buckets carrying any other version are pruned on
    /// activate
    pub version: String,
    /// Absolute URLs to pre-cache during install
    #[serde(default)]
    pub precache: Vec<String>,
    /// URL pattern to strategy routes
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    /// Strategy applied when no route matches
    #[serde(default)]
    pub default_strategy: Strategy,
    /// Whether the query string participates in the request key
    #[serde(default = "default_include_query")]
    pub include_query: bool,
    /// Network-first fetch timeout in milliseconds
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,
}

/// A single strategy route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Pattern to match request URLs. Patterns containing `://` match the
    /// full URL, others match the path. `*` matches within one path segment,
    /// `**` across segments; a pattern without wildcards is a prefix match.
    pub pattern: String,
    /// Strategy for matching requests
    pub strategy: Strategy,
    /// Per-route override of the network-first timeout
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Priority for route matching (lower = higher priority)
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_include_query() -> bool {
    true
}

fn default_network_timeout_ms() -> u64 {
    3000
}

fn default_priority() -> i32 {
    100
}

impl WorkerConfig {
    /// Bucket id for the current deployment
    pub fn bucket_id(&self) -> BucketId {
        BucketId::new(self.cache_name.clone(), self.version.clone())
    }
}

/// Pre-compiled route table for strategy selection
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    default_strategy: Strategy,
    default_timeout: Duration,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    strategy: Strategy,
    timeout: Duration,
    /// Whether the pattern matches the full URL rather than the path
    full_url: bool,
    parts: Vec<PatternPart>,
}

#[derive(Debug, Clone)]
enum PatternPart {
    /// Literal text that must match exactly
    Literal(String),
    /// Single path segment wildcard (*)
    SingleWildcard,
    /// Multi-segment wildcard (**)
    MultiWildcard,
}

impl RouteTable {
    /// Compile the route table from a worker configuration
    pub fn compile(config: &WorkerConfig) -> Self {
        let default_timeout = Duration::from_millis(config.network_timeout_ms);

        let mut indexed: Vec<(i32, CompiledRoute)> = config
            .routes
            .iter()
            .map(|route| {
                (
                    route.priority,
                    CompiledRoute {
                        strategy: route.strategy,
                        timeout: route
                            .timeout_ms
                            .map(Duration::from_millis)
                            .unwrap_or(default_timeout),
                        full_url: route.pattern.contains("://"),
                        parts: compile_pattern(&route.pattern),
                    },
                )
            })
            .collect();

        // Stable sort keeps declaration order among equal priorities
        indexed.sort_by_key(|(priority, _)| *priority);

        Self {
            routes: indexed.into_iter().map(|(_, route)| route).collect(),
            default_strategy: config.default_strategy,
            default_timeout,
        }
    }

    /// Select the strategy and network timeout for a request URL
    pub fn select(&self, url: &Url) -> (Strategy, Duration) {
        for route in &self.routes {
            let target = if route.full_url {
                url.as_str()
            } else {
                url.path()
            };
            if matches_pattern(&route.parts, target) {
                return (route.strategy, route.timeout);
            }
        }
        (self.default_strategy, self.default_timeout)
    }
}

/// Compile a glob-like pattern into parts
///
/// A pattern without any wildcard is treated as a prefix and gets an implicit
/// trailing `**`.
fn compile_pattern(pattern: &str) -> Vec<PatternPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '*' {
            if !current.is_empty() {
                parts.push(PatternPart::Literal(current.clone()));
                current.clear();
            }

            if i + 1 < chars.len() && chars[i + 1] == '*' {
                parts.push(PatternPart::MultiWildcard);
                i += 2;
            } else {
                parts.push(PatternPart::SingleWildcard);
                i += 1;
            }
        } else {
            current.push(ch);
            i += 1;
        }
    }

    if !current.is_empty() {
        parts.push(PatternPart::Literal(current));
    }

    if !pattern.contains('*') {
        parts.push(PatternPart::MultiWildcard);
    }

    parts
}

fn matches_pattern(parts: &[PatternPart], target: &str) -> bool {
    let mut iterations = 0;
    match_recursive(parts, target, 0, 0, &mut iterations)
}

fn match_recursive(
    parts: &[PatternPart],
    target: &str,
    part_idx: usize,
    target_pos: usize,
    iterations: &mut usize,
) -> bool {
    *iterations += 1;
    if *iterations > MAX_MATCH_ITERATIONS {
        warn!(
            "Pattern matching exceeded {} iterations, aborting",
            MAX_MATCH_ITERATIONS
        );
        return false;
    }

    if part_idx >= parts.len() {
        return target_pos >= target.len();
    }

    let remaining = &target[target_pos..];

    match &parts[part_idx] {
        PatternPart::Literal(lit) => {
            if remaining.starts_with(lit) {
                match_recursive(parts, target, part_idx + 1, target_pos + lit.len(), iterations)
            } else {
                false
            }
        }
        PatternPart::SingleWildcard => {
            // Match any span within the current segment, longest first, so a
            // literal suffix after '*' can land anywhere before the next '/'
            let segment_end = remaining.find('/').unwrap_or(remaining.len());
            for i in (0..=segment_end).rev() {
                if match_recursive(parts, target, part_idx + 1, target_pos + i, iterations) {
                    return true;
                }
            }
            false
        }
        PatternPart::MultiWildcard => {
            let remaining_parts = &parts[part_idx + 1..];

            if remaining_parts.is_empty() {
                // ** at end matches everything
                return true;
            }

            for i in 0..=remaining.len() {
                if match_recursive(parts, target, part_idx + 1, target_pos + i, iterations) {
                    return true;
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(pattern: &str, strategy: Strategy, priority: i32) -> RouteConfig {
        RouteConfig {
            pattern: pattern.to_string(),
            strategy,
            timeout_ms: None,
            priority,
        }
    }

    fn config(routes: Vec<RouteConfig>) -> WorkerConfig {
        WorkerConfig {
            cache_name: "assets".to_string(),
            version: "v1".to_string(),
            precache: vec![],
            routes,
            default_strategy: Strategy::CacheFirst,
            include_query: true,
            network_timeout_ms: 3000,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_path_pattern_with_single_wildcard() {
        let table = RouteTable::compile(&config(vec![route(
            "/static/*",
            Strategy::StaleWhileRevalidate,
            100,
        )]));

        let (strategy, _) = table.select(&url("https://example.com/static/app.css"));
        assert_eq!(strategy, Strategy::StaleWhileRevalidate);

        // Single wildcard does not cross segments; falls through to default
        let (strategy, _) = table.select(&url("https://example.com/static/css/app.css"));
        assert_eq!(strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_single_wildcard_with_literal_suffix() {
        let table = RouteTable::compile(&config(vec![route(
            "/static/*.css",
            Strategy::StaleWhileRevalidate,
            100,
        )]));

        let (strategy, _) = table.select(&url("https://example.com/static/app.css"));
        assert_eq!(strategy, Strategy::StaleWhileRevalidate);

        // The suffix must sit in the same segment
        let (strategy, _) = table.select(&url("https://example.com/static/css/app.css"));
        assert_eq!(strategy, Strategy::CacheFirst);

        // Other extensions fall through to the default
        let (strategy, _) = table.select(&url("https://example.com/static/app.js"));
        assert_eq!(strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_multi_wildcard_crosses_segments() {
        let table = RouteTable::compile(&config(vec![route(
            "/api/**",
            Strategy::NetworkFirst,
            100,
        )]));

        let (strategy, _) = table.select(&url("https://example.com/api/v1/leave/list"));
        assert_eq!(strategy, Strategy::NetworkFirst);

        let (strategy, _) = table.select(&url("https://example.com/static/app.css"));
        assert_eq!(strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_bare_pattern_is_a_prefix() {
        let table = RouteTable::compile(&config(vec![route(
            "/news",
            Strategy::StaleWhileRevalidate,
            100,
        )]));

        let (strategy, _) = table.select(&url("https://example.com/news/today"));
        assert_eq!(strategy, Strategy::StaleWhileRevalidate);
        let (strategy, _) = table.select(&url("https://example.com/news"));
        assert_eq!(strategy, Strategy::StaleWhileRevalidate);
        let (strategy, _) = table.select(&url("https://example.com/other"));
        assert_eq!(strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_full_url_pattern_matches_cross_origin() {
        let table = RouteTable::compile(&config(vec![route(
            "https://cdn.example.com/**",
            Strategy::CacheFirst,
            100,
        )]));

        let (strategy, _) = table.select(&url("https://cdn.example.com/lib/bootstrap.min.css"));
        assert_eq!(strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_priority_ordering() {
        let mut cfg = config(vec![
            route("/api/**", Strategy::NetworkFirst, 100),
            route("/api/feed", Strategy::StaleWhileRevalidate, 50),
        ]);
        cfg.default_strategy = Strategy::CacheFirst;
        let table = RouteTable::compile(&cfg);

        let (strategy, _) = table.select(&url("https://example.com/api/feed"));
        assert_eq!(strategy, Strategy::StaleWhileRevalidate);

        let (strategy, _) = table.select(&url("https://example.com/api/v1/other"));
        assert_eq!(strategy, Strategy::NetworkFirst);
    }

    #[test]
    fn test_route_timeout_override() {
        let mut cfg = config(vec![RouteConfig {
            pattern: "/api/**".to_string(),
            strategy: Strategy::NetworkFirst,
            timeout_ms: Some(500),
            priority: 100,
        }]);
        cfg.network_timeout_ms = 3000;
        let table = RouteTable::compile(&cfg);

        let (_, timeout) = table.select(&url("https://example.com/api/x"));
        assert_eq!(timeout, Duration::from_millis(500));

        let (_, timeout) = table.select(&url("https://example.com/other"));
        assert_eq!(timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let raw = r#"{
            "cache_name": "leave-system",
            "version": "v2",
            "precache": ["https://example.com/"],
            "routes": [
                { "pattern": "/api/**", "strategy": "network-first", "timeout_ms": 1000 }
            ]
        }"#;

        let cfg: WorkerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.cache_name, "leave-system");
        assert_eq!(cfg.default_strategy, Strategy::CacheFirst);
        assert!(cfg.include_query);
        assert_eq!(cfg.network_timeout_ms, 3000);
        assert_eq!(cfg.routes[0].priority, 100);
        assert_eq!(cfg.bucket_id().to_string(), "leave-system@v2");
    }
}
