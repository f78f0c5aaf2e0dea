//! Authorization policy engine.
//!
//! An ordered list of method + path-pattern rules, each either open to
//! everyone or demanding a specific authority. Rules are evaluated in
//! declared order, first match wins; a request matching no rule falls
//! through to the engine's configured default decision.

use crate::context::AuthContext;
use http::Method;

/// Path pattern: exact, or a literal prefix declared with a trailing
/// `/**` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path exactly.
    Exact(String),

    /// Matches the prefix itself and anything below it.
    Prefix(String),
}

impl PathPattern {
    /// Parse a pattern string; `/greeting/**` becomes a prefix match
    /// on `/greeting`, anything else is exact.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    /// Whether `path` matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => {
                path == prefix || path.starts_with(&format!("{prefix}/"))
            }
        }
    }
}

/// What a matching rule demands of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Permit regardless of authentication state.
    Any,

    /// Permit only authenticated callers holding this authority.
    Authority(String),
}

/// One ordered policy rule.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    method: Option<Method>,
    pattern: PathPattern,
    requirement: Requirement,
}

impl PolicyRule {
    /// Create a rule. `method: None` matches every method.
    #[must_use]
    pub fn new(method: Option<Method>, pattern: &str, requirement: Requirement) -> Self {
        Self {
            method,
            pattern: PathPattern::parse(pattern),
            requirement,
        }
    }

    fn applies_to(&self, method: &Method, path: &str) -> bool {
        let method_matches = match &self.method {
            Some(required) => required == method,
            None => true,
        };
        method_matches && self.pattern.matches(path)
    }
}

/// Authorization verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch the request.
    Permit,

    /// Reject the request.
    Deny,
}

/// What happens to requests matching no rule.
///
/// The shipped default is `Permit`, mirroring the observed behavior of
/// the system this replaces; operators who want a closed perimeter set
/// `Deny` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultDecision {
    /// Unmatched requests are permitted (open perimeter).
    Permit,

    /// Unmatched requests are denied (closed perimeter).
    Deny,
}

/// Ordered rule set with an explicit default.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: Vec<PolicyRule>,
    default_decision: DefaultDecision,
}

impl PolicyEngine {
    /// Create an engine with no rules and the given default.
    #[must_use]
    pub fn new(default_decision: DefaultDecision) -> Self {
        Self {
            rules: Vec::new(),
            default_decision,
        }
    }

    /// Append a rule; evaluation order is append order.
    #[must_use]
    pub fn rule(mut self, method: Option<Method>, pattern: &str, requirement: Requirement) -> Self {
        self.rules.push(PolicyRule::new(method, pattern, requirement));
        self
    }

    /// Decide whether the request may be dispatched.
    ///
    /// First rule whose method and pattern match wins. A rule requiring
    /// an authority permits only an authenticated context holding it.
    #[must_use]
    pub fn authorize(&self, method: &Method, path: &str, context: &AuthContext) -> Decision {
        for rule in &self.rules {
            if !rule.applies_to(method, path) {
                continue;
            }

            let decision = match &rule.requirement {
                Requirement::Any => Decision::Permit,
                Requirement::Authority(authority) => {
                    if context.has_authority(authority) {
                        Decision::Permit
                    } else {
                        Decision::Deny
                    }
                }
            };

            tracing::debug!(
                target: "auth.policy",
                method = %method,
                path = %path,
                requirement = ?rule.requirement,
                decision = ?decision,
                "Policy rule matched"
            );
            return decision;
        }

        tracing::debug!(
            target: "auth.policy",
            method = %method,
            path = %path,
            decision = ?self.default_decision,
            "No policy rule matched, applying default"
        );
        match self.default_decision {
            DefaultDecision::Permit => Decision::Permit,
            DefaultDecision::Deny => Decision::Deny,
        }
    }
}
