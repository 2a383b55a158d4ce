//! Fetch-permission checking against per-origin exclusion policies
//!
//! Each distinct origin's robots.txt is fetched lazily at most once per
//! process and the parsed policy memoized for the process lifetime.
//! An unreachable or unparsable policy fails open: the origin is treated
//! as fully allowed rather than fully blocked.

use dashmap::DashMap;
use reqwest::Client;
use tracing::{debug, warn};

use crate::origin_of;

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    path: String,
}

#[derive(Debug, Clone)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Parsed exclusion policy for one origin
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    groups: Vec<Group>,
}

impl RobotsPolicy {
    /// Policy that permits everything (the fail-open policy)
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse a robots.txt body
    pub fn parse(body: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<Group> = None;
        let mut last_was_agent = false;

        for line in body.lines() {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if last_was_agent {
                        if let Some(group) = current.as_mut() {
                            group.agents.push(value.to_ascii_lowercase());
                        }
                    } else {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                        current = Some(Group {
                            agents: vec![value.to_ascii_lowercase()],
                            rules: Vec::new(),
                        });
                    }
                    last_was_agent = true;
                }
                "disallow" | "allow" => {
                    last_was_agent = false;
                    // An empty Disallow permits everything; skip the rule
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = current.as_mut() {
                        group.rules.push(Rule {
                            allow: field == "allow",
                            path: value.to_string(),
                        });
                    }
                }
                _ => {
                    last_was_agent = false;
                }
            }
        }
        if let Some(group) = current.take() {
            groups.push(group);
        }

        Self { groups }
    }

    fn rules_for<'a>(&'a self, user_agent: &str) -> Option<&'a [Rule]> {
        let agent_lower = user_agent.to_ascii_lowercase();

        // Most specific matching group first, wildcard group as fallback
        for group in &self.groups {
            if group
                .agents
                .iter()
                .any(|a| a != "*" && agent_lower.contains(a.as_str()))
            {
                return Some(&group.rules);
            }
        }
        for group in &self.groups {
            if group.agents.iter().any(|a| a == "*") {
                return Some(&group.rules);
            }
        }
        None
    }

    /// Whether this policy permits fetching `path` for `user_agent`.
    /// Longest-path-match precedence; Allow wins ties; no match permits.
    pub fn can_fetch(&self, path: &str, user_agent: &str) -> bool {
        let Some(rules) = self.rules_for(user_agent) else {
            return true;
        };

        let mut best_len = 0;
        let mut best_allow = true;
        for rule in rules {
            if path.starts_with(&rule.path) {
                let len = rule.path.len();
                if len > best_len || (len == best_len && rule.allow) {
                    best_len = len;
                    best_allow = rule.allow;
                }
            }
        }
        best_allow
    }
}

/// Per-origin exclusion-policy evaluator with memoized policies.
///
/// Shared across all adapter workers; concurrent first-touch of the same
/// origin may fetch the policy twice, last parse wins.
pub struct RobotsChecker {
    client: Client,
    policies: DashMap<String, RobotsPolicy>,
}

impl RobotsChecker {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policies: DashMap::new(),
        }
    }

    /// Whether `url` may be fetched by `user_agent` under the origin's
    /// exclusion policy. A denial is not an error condition.
    pub async fn can_fetch(&self, url: &str, user_agent: &str) -> bool {
        // Unparsable URL: let the actual fetch surface the error
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return true;
        };
        let origin = match origin_of(url) {
            Ok(origin) => origin,
            Err(_) => return true,
        };

        if !self.policies.contains_key(&origin) {
            let policy = self.load_policy(&origin).await;
            self.policies.insert(origin.clone(), policy);
        }

        // Path from the parsed URL, not string surgery: explicit default
        // ports and host casing must not change what gets evaluated.
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        self.policies
            .get(&origin)
            .map(|policy| policy.can_fetch(&path, user_agent))
            .unwrap_or(true)
    }

    async fn load_policy(&self, origin: &str) -> RobotsPolicy {
        let robots_url = format!("{}/robots.txt", origin);
        debug!("Fetching exclusion policy: {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => RobotsPolicy::parse(&body),
                Err(e) => {
                    warn!("Could not read robots.txt for {}: {} (failing open)", origin, e);
                    RobotsPolicy::allow_all()
                }
            },
            Ok(response) => {
                debug!(
                    "robots.txt for {} returned {} (failing open)",
                    origin,
                    response.status()
                );
                RobotsPolicy::allow_all()
            }
            Err(e) => {
                warn!("Could not fetch robots.txt for {}: {} (failing open)", origin, e);
                RobotsPolicy::allow_all()
            }
        }
    }

    /// Pre-seed a policy for an origin (tests)
    pub fn insert_policy(&self, origin: &str, policy: RobotsPolicy) {
        self.policies.insert(origin.to_string(), policy);
    }

    /// Number of memoized origin policies
    pub fn cached_origins(&self) -> usize {
        self.policies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "sigscout-bot/0.1 (procurement signal enrichment)";

    #[test]
    fn test_parse_disallow() {
        let policy = RobotsPolicy::parse(
            "User-agent: *\n\
             Disallow: /private/\n\
             Allow: /private/reports/\n",
        );

        assert!(policy.can_fetch("/warnings", AGENT));
        assert!(!policy.can_fetch("/private/data", AGENT));
        // longest match wins
        assert!(policy.can_fetch("/private/reports/2025", AGENT));
    }

    #[test]
    fn test_specific_agent_group_preferred() {
        let policy = RobotsPolicy::parse(
            "User-agent: sigscout-bot\n\
             Disallow: /\n\
             \n\
             User-agent: *\n\
             Disallow:\n",
        );

        assert!(!policy.can_fetch("/anything", AGENT));
        assert!(policy.can_fetch("/anything", "some-other-bot/2.0"));
    }

    #[test]
    fn test_empty_disallow_permits_all() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow:\n");
        assert!(policy.can_fetch("/", AGENT));
        assert!(policy.can_fetch("/deep/path", AGENT));
    }

    #[test]
    fn test_comments_and_unknown_fields_ignored() {
        let policy = RobotsPolicy::parse(
            "# maintained by ops\n\
             User-agent: *\n\
             Crawl-delay: 10\n\
             Disallow: /admin # no bots\n",
        );
        assert!(!policy.can_fetch("/admin/cache", AGENT));
        assert!(policy.can_fetch("/public", AGENT));
    }

    #[test]
    fn test_no_groups_permits_all() {
        let policy = RobotsPolicy::parse("");
        assert!(policy.can_fetch("/anything", AGENT));
    }

    #[tokio::test]
    async fn test_path_evaluation_survives_url_spelling() {
        let checker = RobotsChecker::new(Client::new());
        checker.insert_policy(
            "https://blocked.gov",
            RobotsPolicy::parse("User-agent: *\nDisallow: /private/\n"),
        );

        // explicit default port and host casing normalize to the same origin
        assert!(!checker.can_fetch("https://blocked.gov:443/private/data", AGENT).await);
        assert!(!checker.can_fetch("https://BLOCKED.gov/private/data", AGENT).await);
        assert!(checker.can_fetch("https://blocked.gov:443/public", AGENT).await);
        assert_eq!(checker.cached_origins(), 1);
    }

    #[tokio::test]
    async fn test_preseeded_policy_denies_without_network() {
        let checker = RobotsChecker::new(Client::new());
        checker.insert_policy(
            "https://blocked.gov",
            RobotsPolicy::parse("User-agent: *\nDisallow: /\n"),
        );

        assert!(!checker.can_fetch("https://blocked.gov/notices", AGENT).await);
        assert_eq!(checker.cached_origins(), 1);
    }
}
