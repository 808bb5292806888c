//! Test-only harness for asserting how many times a target actually
//! rebuilt. Not part of the engine's production API; enabled via the
//! `test-support` feature so integration tests in `tests/` (which only see
//! the crate's public surface) can reach it too.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::{
    handler::{Builder, Handler, HandlerError},
    stamp::{Stamp, Target},
};

/// Wraps a [`Handler`], counting how many times `rebuild_impl` actually ran,
/// per target. Install it in a chain exactly where the handler it wraps
/// would otherwise go.
#[derive(Debug)]
pub struct CountingHandler<H> {
    inner: H,
    counts: RefCell<HashMap<Target, usize>>,
}

impl<H> CountingHandler<H> {
    pub fn new(inner: H) -> Self {
        CountingHandler {
            inner,
            counts: RefCell::new(HashMap::new()),
        }
    }

    /// How many times `target` was actually rebuilt through this handler.
    /// Zero for a target that was never rebuilt (including one this handler
    /// never recognized).
    pub fn rebuild_count(&self, target: &str) -> usize {
        self.counts.borrow().get(target).copied().unwrap_or(0)
    }
}

impl<H: Handler> Handler for CountingHandler<H> {
    fn can_handle(&self, target: &str) -> bool {
        self.inner.can_handle(target)
    }

    fn stamp(&self, target: &str) -> Stamp {
        self.inner.stamp(target)
    }

    fn stamps_match(&self, a: &str, b: &str) -> bool {
        self.inner.stamps_match(a, b)
    }

    fn rebuild_impl(&self, target: &str, builder: &mut Builder<'_>) -> Result<(), HandlerError> {
        let result = self.inner.rebuild_impl(target, builder);
        if result.is_ok() {
            *self.counts.borrow_mut().entry(target.to_owned()).or_insert(0) += 1;
        }
        result
    }
}
