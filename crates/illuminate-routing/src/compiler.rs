//! Path-pattern compiler.
//!
//! Turns a URI template with `{name}` / `{name?}` placeholders (and an
//! optional domain template) into an anchored regex matcher plus an ordered
//! parameter-name list. Unconstrained parameters default to `[^/]+` in the
//! path and `[^.]+` in the domain; a per-parameter `where` constraint
//! overrides the character class. A `/{name?}` placeholder folds its
//! leading slash into the optional group so `users/{id?}` matches both
//! `users` and `users/5`.
//!
//! Compilation happens at most once per route (memoized by the route) and
//! every failure here is a registration-time defect, never a request-time
//! condition.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// A structural failure while compiling a route pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The same parameter name appears twice across domain + uri.
    #[error("duplicate parameter name `{0}` in route pattern")]
    DuplicateParameter(String),

    /// A `{` placeholder was never closed.
    #[error("unterminated parameter placeholder in `{0}`")]
    UnterminatedParameter(String),

    /// A placeholder name is empty or not an identifier.
    #[error("invalid parameter name `{0}`")]
    InvalidParameterName(String),

    /// A `where` constraint is not a valid regex.
    #[error("invalid constraint for parameter `{key}`")]
    InvalidConstraint {
        /// The constrained parameter.
        key: String,
        /// The underlying regex failure.
        #[source]
        source: regex::Error,
    },

    /// The assembled pattern failed to compile.
    #[error("invalid route pattern")]
    Regex(#[from] regex::Error),
}

/// A compiled route matcher.
#[derive(Debug)]
pub struct CompiledRoute {
    uri_regex: Regex,
    domain_regex: Option<Regex>,
    parameters: Vec<String>,
    domain_parameters: Vec<String>,
    uri_parameters: Vec<String>,
    optional: HashSet<String>,
    literal: Option<String>,
}

impl CompiledRoute {
    /// All parameter names in declared order, domain parameters first.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Parameter names declared by the uri template, in order.
    #[must_use]
    pub fn uri_parameters(&self) -> &[String] {
        &self.uri_parameters
    }

    /// Parameter names declared by the domain template, in order.
    #[must_use]
    pub fn domain_parameters(&self) -> &[String] {
        &self.domain_parameters
    }

    /// Whether a parameter was declared with the optional marker.
    #[must_use]
    pub fn is_optional(&self, name: &str) -> bool {
        self.optional.contains(name)
    }

    /// The literal path for parameter-free templates (fast-path key).
    #[must_use]
    pub fn literal_path(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Whether the trimmed request path matches the uri template.
    #[must_use]
    pub fn is_uri_match(&self, path: &str) -> bool {
        self.uri_regex.is_match(path)
    }

    /// Whether the request host matches the domain template.
    ///
    /// Routes without a domain match any host; a domain-bound route never
    /// matches a request with no host.
    #[must_use]
    pub fn is_domain_match(&self, host: Option<&str>) -> bool {
        match &self.domain_regex {
            None => true,
            Some(regex) => host.is_some_and(|h| regex.is_match(h)),
        }
    }

    /// Extract uri captures in declared order; `None` entries are
    /// unmatched optionals.
    #[must_use]
    pub fn uri_captures(&self, path: &str) -> Option<Vec<(String, Option<String>)>> {
        let caps = self.uri_regex.captures(path)?;
        Some(
            self.uri_parameters
                .iter()
                .map(|name| {
                    let value = caps.name(name).map(|m| m.as_str().to_string());
                    (name.clone(), value)
                })
                .collect(),
        )
    }

    /// Extract domain captures in declared order.
    #[must_use]
    pub fn domain_captures(&self, host: &str) -> Option<Vec<(String, Option<String>)>> {
        let regex = self.domain_regex.as_ref()?;
        let caps = regex.captures(host)?;
        Some(
            self.domain_parameters
                .iter()
                .map(|name| {
                    let value = caps.name(name).map(|m| m.as_str().to_string());
                    (name.clone(), value)
                })
                .collect(),
        )
    }
}

/// Compile a uri template (and optional domain template) into a matcher.
///
/// `uri` is expected in trimmed form (`users/{id}`, `/` for the root) as
/// stored on routes.
pub fn compile(
    uri: &str,
    domain: Option<&str>,
    wheres: &HashMap<String, String>,
) -> Result<CompiledRoute, PatternError> {
    let mut seen = HashSet::new();
    let mut optional = HashSet::new();

    let mut domain_parameters = Vec::new();
    let domain_regex = match domain {
        Some(template) => {
            let pattern = compile_template(
                template,
                wheres,
                "[^.]+",
                &mut domain_parameters,
                &mut optional,
                &mut seen,
            )?;
            Some(Regex::new(&pattern)?)
        }
        None => None,
    };

    let mut uri_parameters = Vec::new();
    let pattern = compile_template(
        uri,
        wheres,
        "[^/]+",
        &mut uri_parameters,
        &mut optional,
        &mut seen,
    )?;
    let uri_regex = Regex::new(&pattern)?;

    let literal = if uri.contains('{') {
        None
    } else {
        Some(uri.to_string())
    };

    let mut parameters = domain_parameters.clone();
    parameters.extend(uri_parameters.iter().cloned());

    Ok(CompiledRoute {
        uri_regex,
        domain_regex,
        parameters,
        domain_parameters,
        uri_parameters,
        optional,
        literal,
    })
}

/// Compile one template into an anchored regex string, collecting
/// parameter names in declared order.
fn compile_template(
    template: &str,
    wheres: &HashMap<String, String>,
    default_class: &str,
    names: &mut Vec<String>,
    optional: &mut HashSet<String>,
    seen: &mut HashSet<String>,
) -> Result<String, PatternError> {
    let mut pattern = String::from("^");
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            literal.push(ch);
            continue;
        }

        let mut name = String::new();
        let mut is_optional = false;
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    closed = true;
                    break;
                }
                '?' if chars.peek() == Some(&'}') => is_optional = true,
                other => name.push(other),
            }
        }
        if !closed {
            return Err(PatternError::UnterminatedParameter(template.to_string()));
        }
        if !is_valid_parameter_name(&name) {
            return Err(PatternError::InvalidParameterName(name));
        }
        if !seen.insert(name.clone()) {
            return Err(PatternError::DuplicateParameter(name));
        }

        let class = match wheres.get(&name) {
            Some(constraint) => {
                // Validate user constraints in isolation so a broken one
                // points at its parameter, not at the assembled pattern.
                Regex::new(&format!("^(?:{constraint})$")).map_err(|source| {
                    PatternError::InvalidConstraint {
                        key: name.clone(),
                        source,
                    }
                })?;
                constraint.as_str()
            }
            None => default_class,
        };

        if is_optional {
            optional.insert(name.clone());
            let folded_slash = literal.ends_with('/');
            if folded_slash {
                literal.pop();
            }
            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            if folded_slash {
                pattern.push_str(&format!("(?:/(?P<{name}>{class}))?"));
            } else {
                pattern.push_str(&format!("(?:(?P<{name}>{class}))?"));
            }
        } else {
            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            pattern.push_str(&format!("(?P<{name}>{class})"));
        }
        names.push(name);
    }

    pattern.push_str(&regex::escape(&literal));
    pattern.push('$');
    Ok(pattern)
}

fn is_valid_parameter_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_wheres() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_static_template_is_literal() {
        let compiled = compile("users/all", None, &no_wheres()).unwrap();
        assert_eq!(compiled.literal_path(), Some("users/all"));
        assert!(compiled.is_uri_match("users/all"));
        assert!(!compiled.is_uri_match("users/all/x"));
        assert!(compiled.parameters().is_empty());
    }

    #[test]
    fn test_required_parameter() {
        let compiled = compile("users/{id}", None, &no_wheres()).unwrap();
        assert_eq!(compiled.literal_path(), None);
        assert_eq!(compiled.parameters(), &["id".to_string()]);
        let caps = compiled.uri_captures("users/5").unwrap();
        assert_eq!(caps, vec![("id".to_string(), Some("5".to_string()))]);
        assert!(!compiled.is_uri_match("users"));
        assert!(!compiled.is_uri_match("users/5/extra"));
    }

    #[test]
    fn test_optional_parameter_folds_slash() {
        let compiled = compile("users/{id}/posts/{post_id?}", None, &no_wheres()).unwrap();
        assert!(compiled.is_optional("post_id"));
        assert!(!compiled.is_optional("id"));

        let caps = compiled.uri_captures("users/5/posts").unwrap();
        assert_eq!(caps[0], ("id".to_string(), Some("5".to_string())));
        assert_eq!(caps[1], ("post_id".to_string(), None));

        let caps = compiled.uri_captures("users/5/posts/9").unwrap();
        assert_eq!(caps[1], ("post_id".to_string(), Some("9".to_string())));
    }

    #[test]
    fn test_where_constraint_restricts_match() {
        let mut wheres = HashMap::new();
        wheres.insert("id".to_string(), "[0-9]+".to_string());
        let compiled = compile("users/{id}", None, &wheres).unwrap();
        assert!(compiled.is_uri_match("users/42"));
        assert!(!compiled.is_uri_match("users/abc"));
    }

    #[test]
    fn test_invalid_where_constraint() {
        let mut wheres = HashMap::new();
        wheres.insert("id".to_string(), "[0-9".to_string());
        let err = compile("users/{id}", None, &wheres).unwrap_err();
        assert!(matches!(err, PatternError::InvalidConstraint { key, .. } if key == "id"));
    }

    #[test]
    fn test_domain_parameters_come_first() {
        let compiled = compile(
            "users/{id}",
            Some("{account}.myapp.com"),
            &no_wheres(),
        )
        .unwrap();
        assert_eq!(
            compiled.parameters(),
            &["account".to_string(), "id".to_string()]
        );
        assert!(compiled.is_domain_match(Some("acme.myapp.com")));
        assert!(!compiled.is_domain_match(Some("acme.other.com")));
        assert!(!compiled.is_domain_match(None));

        let caps = compiled.domain_captures("acme.myapp.com").unwrap();
        assert_eq!(caps, vec![("account".to_string(), Some("acme".to_string()))]);
    }

    #[test]
    fn test_no_domain_matches_any_host() {
        let compiled = compile("users", None, &no_wheres()).unwrap();
        assert!(compiled.is_domain_match(None));
        assert!(compiled.is_domain_match(Some("anything.example")));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = compile("users/{id}/friends/{id}", None, &no_wheres()).unwrap_err();
        assert!(matches!(err, PatternError::DuplicateParameter(name) if name == "id"));
    }

    #[test]
    fn test_duplicate_across_domain_and_uri_rejected() {
        let err = compile("users/{id}", Some("{id}.myapp.com"), &no_wheres()).unwrap_err();
        assert!(matches!(err, PatternError::DuplicateParameter(name) if name == "id"));
    }

    #[test]
    fn test_unterminated_placeholder_rejected() {
        let err = compile("users/{id", None, &no_wheres()).unwrap_err();
        assert!(matches!(err, PatternError::UnterminatedParameter(_)));
    }

    #[test]
    fn test_invalid_parameter_name_rejected() {
        let err = compile("users/{1d}", None, &no_wheres()).unwrap_err();
        assert!(matches!(err, PatternError::InvalidParameterName(_)));
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let compiled = compile("v1.0/items", None, &no_wheres()).unwrap();
        assert!(compiled.is_uri_match("v1.0/items"));
        assert!(!compiled.is_uri_match("v1x0/items"));
    }

    #[test]
    fn test_root_template() {
        let compiled = compile("/", None, &no_wheres()).unwrap();
        assert!(compiled.is_uri_match("/"));
        assert!(!compiled.is_uri_match("users"));
    }
}
