//! Resourceful route registration.
//!
//! Expands a resource name and controller into the seven conventional
//! CRUD routes. Dotted names declare nesting: every segment but the last
//! contributes a literal segment plus its own wildcard, so
//! `photos.comments` yields uris under `photos/{photo}/comments`.
//! Wildcards are the singularized segment with dashes turned into
//! underscores.

use crate::route::{Action, Route};
use illuminate_core::Method;
use std::collections::HashMap;

const RESOURCE_METHODS: [&str; 7] = [
    "index", "create", "store", "show", "edit", "update", "destroy",
];

/// Options narrowing or renaming the generated routes.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    only: Option<Vec<String>>,
    except: Vec<String>,
    names: HashMap<String, String>,
}

impl ResourceOptions {
    /// All seven routes with conventional names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the listed actions.
    #[must_use]
    pub fn only(mut self, actions: &[&str]) -> Self {
        self.only = Some(actions.iter().map(ToString::to_string).collect());
        self
    }

    /// Drop the listed actions.
    #[must_use]
    pub fn except(mut self, actions: &[&str]) -> Self {
        self.except
            .extend(actions.iter().map(ToString::to_string));
        self
    }

    /// Override the route name for one action.
    #[must_use]
    pub fn name(mut self, action: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(action.into(), name.into());
        self
    }

    fn includes(&self, action: &str) -> bool {
        if let Some(only) = &self.only {
            if !only.iter().any(|a| a == action) {
                return false;
            }
        }
        !self.except.iter().any(|a| a == action)
    }

    fn route_name(&self, resource: &str, action: &str) -> String {
        self.names
            .get(action)
            .cloned()
            .unwrap_or_else(|| format!("{resource}.{action}"))
    }
}

/// Expand a resource declaration into its routes, in conventional order.
pub(crate) fn routes_for(
    name: &str,
    controller: &str,
    options: &ResourceOptions,
) -> Vec<Route> {
    let base = base_uri(name);
    let wildcard = resource_wildcard(name.rsplit('.').next().unwrap_or(name));
    let member = format!("{base}/{{{wildcard}}}");

    RESOURCE_METHODS
        .iter()
        .filter(|action| options.includes(action))
        .map(|action| {
            let (methods, uri) = match *action {
                "index" => (vec![Method::Get], base.clone()),
                "create" => (vec![Method::Get], format!("{base}/create")),
                "store" => (vec![Method::Post], base.clone()),
                "show" => (vec![Method::Get], member.clone()),
                "edit" => (vec![Method::Get], format!("{member}/edit")),
                "update" => (vec![Method::Put, Method::Patch], member.clone()),
                _ => (vec![Method::Delete], member.clone()),
            };
            Route::new(methods, &uri, Action::to(controller, *action))
                .named(options.route_name(name, action))
        })
        .collect()
}

/// The shared uri base: nested segments each carry their own wildcard.
fn base_uri(name: &str) -> String {
    let segments: Vec<&str> = name.split('.').collect();
    let mut uri = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            uri.push('/');
        }
        uri.push_str(segment);
        if index < segments.len() - 1 {
            uri.push_str(&format!("/{{{}}}", resource_wildcard(segment)));
        }
    }
    uri
}

fn resource_wildcard(segment: &str) -> String {
    singularize(segment).replace('-', "_")
}

/// English singularization covering the forms resource names take.
fn singularize(word: &str) -> String {
    const IRREGULAR: [(&str, &str); 8] = [
        ("people", "person"),
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
    ];
    for (plural, singular) in IRREGULAR {
        if word == plural {
            return singular.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    // "-ouses" words (houses, spouses, warehouses) keep their final "e".
    if word.ends_with("ouses") {
        return word[..word.len() - 1].to_string();
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix("es") {
            if word.ends_with(suffix) {
                return stem.to_string();
            }
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() && !stem.ends_with('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}
