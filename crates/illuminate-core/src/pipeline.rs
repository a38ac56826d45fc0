//! Generic onion pipeline.
//!
//! A [`Pipeline`] pushes a payload through an ordered list of pipes and
//! into a terminal destination. Each pipe receives the payload and a
//! continuation; a pipe that never invokes its continuation short-circuits
//! the chain, and code a pipe runs after its continuation call executes on
//! the way back out (classic onion composition).
//!
//! Pipe order is reversed internally while composing so that the first
//! registered pipe is outermost: pipes run in registration order going in,
//! the destination runs once, then control unwinds in reverse.
//!
//! This generic construct performs no error translation; whatever a pipe
//! or the destination returns travels back unchanged. The HTTP-specialized
//! variant with per-stage fault capture lives in the routing crate.
//!
//! # Example
//!
//! ```
//! use illuminate_core::pipeline::Pipeline;
//!
//! let out = Pipeline::send(10)
//!     .pipe(|n: i32, next| next(n + 1))
//!     .pipe(|n: i32, next| next(n * 2))
//!     .then(|n| n);
//! assert_eq!(out, 22);
//! ```

use std::sync::Arc;

/// The continuation handed to each pipe.
pub type Next<'a, P, R> = Box<dyn FnOnce(P) -> R + 'a>;

/// A shareable pipe function.
pub type PipeFn<P, R> = Arc<dyn Fn(P, Next<'_, P, R>) -> R + Send + Sync>;

/// An ordered pipeline carrying a payload of type `P` toward a result `R`.
pub struct Pipeline<P, R> {
    passable: P,
    pipes: Vec<PipeFn<P, R>>,
}

impl<P, R> Pipeline<P, R> {
    /// Start a pipeline with the payload to send through it.
    #[must_use]
    pub fn send(passable: P) -> Self {
        Self {
            passable,
            pipes: Vec::new(),
        }
    }

    /// Set the pipes the payload travels through, in execution order.
    #[must_use]
    pub fn through(mut self, pipes: impl IntoIterator<Item = PipeFn<P, R>>) -> Self {
        self.pipes.extend(pipes);
        self
    }

    /// Append a single pipe.
    #[must_use]
    pub fn pipe<F>(mut self, pipe: F) -> Self
    where
        F: Fn(P, Next<'_, P, R>) -> R + Send + Sync + 'static,
    {
        self.pipes.push(Arc::new(pipe));
        self
    }

    /// Run the payload through the pipes into the final destination.
    pub fn then<'a, F>(self, destination: F) -> R
    where
        F: FnOnce(P) -> R + 'a,
        P: 'a,
        R: 'a,
    {
        let mut chain: Next<'a, P, R> = Box::new(destination);
        for pipe in self.pipes.into_iter().rev() {
            let inner = chain;
            chain = Box::new(move |payload| pipe(payload, inner));
        }
        chain(self.passable)
    }
}

impl<P, R> std::fmt::Debug for Pipeline<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("pipes", &self.pipes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipes_run_in_registration_order() {
        let out = Pipeline::send(String::new())
            .pipe(|mut s: String, next| {
                s.push('a');
                next(s)
            })
            .pipe(|mut s: String, next| {
                s.push('b');
                next(s)
            })
            .then(|mut s| {
                s.push('!');
                s
            });
        assert_eq!(out, "ab!");
    }

    #[test]
    fn test_unwind_runs_in_reverse_order() {
        // Each pipe appends on the way in and on the way out; the first
        // pipe's post-code must run last.
        let out = Pipeline::send(String::new())
            .pipe(|mut s: String, next| {
                s.push('1');
                let mut s: String = next(s);
                s.push('4');
                s
            })
            .pipe(|mut s: String, next| {
                s.push('2');
                let mut s = next(s);
                s.push('3');
                s
            })
            .then(|s| s);
        assert_eq!(out, "1234");
    }

    #[test]
    fn test_short_circuit_skips_destination_and_post_code() {
        let out = Pipeline::send(0_i32)
            .pipe(|_n: i32, _next| -1)
            .pipe(|n: i32, next| next(n + 100))
            .then(|_n| 42);
        assert_eq!(out, -1);
    }

    #[test]
    fn test_empty_pipeline_calls_destination_directly() {
        let out: i32 = Pipeline::send(5).then(|n: i32| n * 3);
        assert_eq!(out, 15);
    }

    #[test]
    fn test_error_result_propagates_unchanged() {
        // No translation happens for non-request payloads; an Err from any
        // stage travels back exactly as raised.
        let out: Result<i32, String> = Pipeline::send(1)
            .pipe(|_n: i32, _next| Err("blown fuse".to_string()))
            .then(|n| Ok(n));
        assert_eq!(out, Err("blown fuse".to_string()));
    }

    #[test]
    fn test_destination_error_propagates_unchanged() {
        let out: Result<i32, String> = Pipeline::send(1)
            .pipe(|n: i32, next| next(n))
            .then(|_n| Err("terminal".to_string()));
        assert_eq!(out, Err("terminal".to_string()));
    }
}
