//! Controller actions and their dispatcher.
//!
//! A controller is a container-resolved trait object invoked by action
//! name. `call_action` is the interception seam: the default forwards to
//! `invoke`, and an implementation can override it to wrap every action
//! (the missing-action fallback lives there too). Controllers may also
//! declare their own middleware, optionally scoped to a subset of
//! actions.

use crate::params::{ParamValue, Parameters};
use illuminate_core::{Container, HttpError, Request, ResponseValue, resolve_as};
use std::sync::Arc;

/// Everything an action invocation receives.
pub struct ActionContext<'a> {
    /// The request being dispatched.
    pub request: &'a mut Request,
    /// The container, for resolving collaborators by type.
    pub container: &'a Container,
    /// Bound route parameters in declaration order, nulls removed.
    pub args: Vec<ParamValue>,
}

/// A middleware declaration made by a controller.
#[derive(Debug, Clone)]
pub struct ControllerMiddleware {
    /// The named pipe reference, `name` or `name:arg1,arg2`.
    pub name: String,
    /// Restrict to these actions; empty means all.
    pub only: Vec<String>,
    /// Exempt these actions.
    pub except: Vec<String>,
}

impl ControllerMiddleware {
    /// Declare a pipe for all actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            only: Vec::new(),
            except: Vec::new(),
        }
    }

    /// Restrict to the listed actions.
    #[must_use]
    pub fn only(mut self, actions: &[&str]) -> Self {
        self.only = actions.iter().map(ToString::to_string).collect();
        self
    }

    /// Exempt the listed actions.
    #[must_use]
    pub fn except(mut self, actions: &[&str]) -> Self {
        self.except = actions.iter().map(ToString::to_string).collect();
        self
    }

    /// Whether this declaration covers an action.
    #[must_use]
    pub fn applies_to(&self, action: &str) -> bool {
        if !self.only.is_empty() && !self.only.iter().any(|a| a == action) {
            return false;
        }
        !self.except.iter().any(|a| a == action)
    }
}

/// A routable controller.
pub trait Controller: Send + Sync {
    /// Run one action by name.
    ///
    /// # Errors
    ///
    /// An unknown action name should be a [`HttpError::NotFound`].
    fn invoke(&self, action: &str, ctx: ActionContext<'_>) -> Result<ResponseValue, HttpError>;

    /// Interception seam wrapping every action call.
    ///
    /// # Errors
    ///
    /// Whatever the wrapped action raises.
    fn call_action(
        &self,
        action: &str,
        ctx: ActionContext<'_>,
    ) -> Result<ResponseValue, HttpError> {
        self.invoke(action, ctx)
    }

    /// Middleware this controller asks for.
    fn middleware(&self) -> Vec<ControllerMiddleware> {
        Vec::new()
    }
}

/// Resolves controllers from the container and runs their actions.
#[derive(Clone)]
pub struct ControllerDispatcher {
    container: Arc<Container>,
}

impl ControllerDispatcher {
    /// A dispatcher resolving from `container`.
    #[must_use]
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }

    /// Resolve a controller binding.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Controller>> {
        resolve_as(self.container.as_ref(), name)
    }

    /// Run `name@action` against a request.
    ///
    /// # Errors
    ///
    /// `HandlerFault` when the controller is not bound; otherwise
    /// whatever the action raises.
    pub fn dispatch(
        &self,
        name: &str,
        action: &str,
        request: &mut Request,
        params: &Parameters,
    ) -> Result<ResponseValue, HttpError> {
        let controller = self
            .resolve(name)
            .ok_or_else(|| HttpError::fault(format!("controller `{name}` is not bound")))?;
        tracing::debug!(controller = name, action, "dispatching controller action");
        let ctx = ActionContext {
            request,
            container: self.container.as_ref(),
            args: params.positional(),
        };
        controller.call_action(action, ctx)
    }

    /// The controller-declared pipes that cover an action.
    #[must_use]
    pub fn middleware_for(&self, name: &str, action: &str) -> Vec<String> {
        self.resolve(name)
            .map(|controller| {
                controller
                    .middleware()
                    .into_iter()
                    .filter(|m| m.applies_to(action))
                    .map(|m| m.name)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ControllerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDispatcher").finish_non_exhaustive()
    }
}
