//! Group attributes and the nesting stack.
//!
//! A group carries shared declarative attributes: uri prefix, controller
//! namespace, domain, name prefix, middleware list, and `where`
//! constraints. Entering a nested group merges the child into the current
//! frame (prefixes and namespaces concatenate, middleware appends, child
//! constraints win) so the stack only ever needs its top frame consulted
//! when a route registers.

use crate::route::Route;
use std::collections::HashMap;

/// Shared attributes applied to every route registered inside a group.
#[derive(Debug, Clone, Default)]
pub struct GroupAttributes {
    prefix: Option<String>,
    namespace: Option<String>,
    domain: Option<String>,
    name_prefix: Option<String>,
    middleware: Vec<String>,
    wheres: HashMap<String, String>,
}

impl GroupAttributes {
    /// An empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uri prefix prepended to every route in the group.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Namespace prepended to relative controller references.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Domain template applied to routes without one of their own.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Prefix concatenated onto route names.
    #[must_use]
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// A named middleware pipe shared by the group.
    #[must_use]
    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }

    /// A shared parameter constraint.
    #[must_use]
    pub fn where_(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.wheres.insert(key.into(), pattern.into());
        self
    }

    /// Merge a child group into its parent frame.
    #[must_use]
    pub(crate) fn merge_into(parent: &Self, child: Self) -> Self {
        let prefix = join_segments(parent.prefix.as_deref(), child.prefix.as_deref(), "/");
        let namespace =
            join_segments(parent.namespace.as_deref(), child.namespace.as_deref(), "\\");
        let name_prefix = match (&parent.name_prefix, &child.name_prefix) {
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let domain = child.domain.or_else(|| parent.domain.clone());

        let mut middleware = parent.middleware.clone();
        for name in child.middleware {
            if !middleware.contains(&name) {
                middleware.push(name);
            }
        }

        let mut wheres = parent.wheres.clone();
        wheres.extend(child.wheres);

        Self {
            prefix,
            namespace,
            domain,
            name_prefix,
            middleware,
            wheres,
        }
    }

    /// Stamp these attributes onto a route at registration.
    pub(crate) fn apply_to(&self, route: &mut Route) {
        if let Some(prefix) = &self.prefix {
            route.prefix_uri(prefix);
        }
        if let Some(namespace) = &self.namespace {
            route.prepend_namespace(namespace);
        }
        if let Some(name_prefix) = &self.name_prefix {
            route.prefix_name(name_prefix);
        }
        if !self.middleware.is_empty() {
            route.prepend_middleware(&self.middleware);
        }
        if !self.wheres.is_empty() {
            route.merge_wheres(&self.wheres);
        }
        if let Some(domain) = &self.domain {
            route.set_domain_if_unset(domain);
        }
    }
}

fn join_segments(parent: Option<&str>, child: Option<&str>, separator: &str) -> Option<String> {
    match (parent, child) {
        (Some(a), Some(b)) => {
            let a = a.trim_matches(|c: char| separator.contains(c));
            let b = b.trim_matches(|c: char| separator.contains(c));
            Some(format!("{a}{separator}{b}"))
        }
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    }
}

/// The active group nesting, pre-merged so only the top frame matters.
#[derive(Debug, Default)]
pub(crate) struct GroupStack {
    frames: Vec<GroupAttributes>,
}

impl GroupStack {
    pub(crate) fn push(&mut self, attributes: GroupAttributes) {
        let merged = match self.frames.last() {
            Some(parent) => GroupAttributes::merge_into(parent, attributes),
            None => attributes,
        };
        self.frames.push(merged);
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn current(&self) -> Option<&GroupAttributes> {
        self.frames.last()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Action;
    use illuminate_core::ResponseValue;

    fn ok_route(uri: &str) -> Route {
        Route::get(uri, Action::closure(|_req, _params| Ok(ResponseValue::Empty)))
    }

    #[test]
    fn test_nested_prefixes_concatenate() {
        let mut stack = GroupStack::default();
        stack.push(GroupAttributes::new().prefix("api"));
        stack.push(GroupAttributes::new().prefix("v1"));

        let mut route = ok_route("users");
        stack.current().unwrap().apply_to(&mut route);
        assert_eq!(route.uri(), "api/v1/users");
    }

    #[test]
    fn test_nested_namespaces_concatenate() {
        let mut stack = GroupStack::default();
        stack.push(GroupAttributes::new().namespace("App"));
        stack.push(GroupAttributes::new().namespace("Admin"));

        let mut route = Route::get("b", Action::controller("Ctrl@show"));
        stack.current().unwrap().apply_to(&mut route);
        assert_eq!(
            route.action().reference(),
            Some("App\\Admin\\Ctrl@show".to_string())
        );
    }

    #[test]
    fn test_name_prefixes_concatenate_verbatim() {
        let mut stack = GroupStack::default();
        stack.push(GroupAttributes::new().name_prefix("admin."));
        stack.push(GroupAttributes::new().name_prefix("users."));

        let mut route = ok_route("users").named("index");
        stack.current().unwrap().apply_to(&mut route);
        assert_eq!(route.name(), Some("admin.users.index"));
    }

    #[test]
    fn test_child_domain_overrides_parent() {
        let parent = GroupAttributes::new().domain("a.myapp.com");
        let child = GroupAttributes::new().domain("b.myapp.com");
        let merged = GroupAttributes::merge_into(&parent, child);

        let mut route = ok_route("dash");
        merged.apply_to(&mut route);
        assert_eq!(route.domain(), Some("b.myapp.com"));
    }

    #[test]
    fn test_route_domain_beats_group_domain() {
        let attrs = GroupAttributes::new().domain("group.myapp.com");
        let mut route = ok_route("dash").on_domain("route.myapp.com");
        attrs.apply_to(&mut route);
        assert_eq!(route.domain(), Some("route.myapp.com"));
    }

    #[test]
    fn test_middleware_parent_before_child_before_route() {
        let mut stack = GroupStack::default();
        stack.push(GroupAttributes::new().middleware("outer"));
        stack.push(GroupAttributes::new().middleware("inner"));

        let mut route = ok_route("users").with_middleware("own");
        stack.current().unwrap().apply_to(&mut route);
        assert_eq!(route.middleware(), &["outer", "inner", "own"]);
    }

    #[test]
    fn test_child_wheres_win() {
        let parent = GroupAttributes::new().where_("id", "[0-9]+");
        let child = GroupAttributes::new().where_("id", "[a-f0-9]+");
        let merged = GroupAttributes::merge_into(&parent, child);

        let mut route = ok_route("items/{id}");
        merged.apply_to(&mut route);
        assert_eq!(route.wheres().get("id").map(String::as_str), Some("[a-f0-9]+"));
    }

    #[test]
    fn test_route_wheres_beat_group_wheres() {
        let attrs = GroupAttributes::new().where_("id", "[0-9]+");
        let mut route = ok_route("items/{id}").where_("id", "[a-z]+");
        attrs.apply_to(&mut route);
        assert_eq!(route.wheres().get("id").map(String::as_str), Some("[a-z]+"));
    }

    #[test]
    fn test_stack_pop_restores_parent_frame() {
        let mut stack = GroupStack::default();
        stack.push(GroupAttributes::new().prefix("api"));
        stack.push(GroupAttributes::new().prefix("v1"));
        stack.pop();

        let mut route = ok_route("users");
        stack.current().unwrap().apply_to(&mut route);
        assert_eq!(route.uri(), "api/users");

        stack.pop();
        assert!(stack.is_empty());
    }
}
