//! Ordered fallback-chain resolution of a single logical field.
//!
//! Upstream resources expose the same value under different shapes depending
//! on API version, requested includes and account type. A [`FieldResolver`]
//! holds the candidate strategies for one field in priority order and settles
//! on the first one that yields a value. A strategy that finds nothing or
//! fails is skipped; when all are exhausted the field resolves to `None`.
//!
//! Strategies are lazy: later strategies are never invoked once an earlier
//! one has produced a value, so fallbacks that cost a network call are only
//! paid for when needed.

use anyhow::Result;
use serde_json::Value;

use crate::utils::text::string_at;

type Strategy<'a, T> = Box<dyn FnOnce() -> Result<Option<T>> + 'a>;

pub struct FieldResolver<'a, T> {
    field: &'static str,
    strategies: Vec<(&'static str, Strategy<'a, T>)>,
}

impl<'a, T> FieldResolver<'a, T> {
    #[must_use]
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy; strategies run in the order they were added.
    #[must_use]
    pub fn strategy(
        mut self,
        name: &'static str,
        strategy: impl FnOnce() -> Result<Option<T>> + 'a,
    ) -> Self {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    pub fn resolve(self) -> Option<T> {
        let Self { field, strategies } = self;
        for (name, strategy) in strategies {
            match strategy() {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {
                    tracing::trace!(field, strategy = name, "strategy yielded no value");
                }
                Err(error) => {
                    tracing::debug!(field, strategy = name, %error, "strategy failed");
                }
            }
        }
        None
    }
}

/// Resolves the first non-empty string among `pointers`, tried in order.
#[must_use]
pub fn first_string_at(
    object: &Value,
    field: &'static str,
    pointers: &[&'static str],
) -> Option<String> {
    pointers
        .iter()
        .fold(FieldResolver::new(field), |resolver, &pointer| {
            resolver.strategy(pointer, move || Ok(string_at(object, pointer)))
        })
        .resolve()
}
