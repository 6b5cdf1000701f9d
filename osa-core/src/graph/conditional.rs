//! Conditional edges: pick the next node id from a routing function over the
//! post-node state, optionally remapped through a path map.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// `(state) -> routing key`.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub path: ConditionalRouterFn<S>,
    pub path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the routing key into a next node id (or `END`), applying the
    /// path map if one was given.
    pub fn resolve(&self, state: &S) -> String {
        let key = (self.path)(state);
        match &self.path_map {
            Some(map) => map.get(&key).cloned().unwrap_or(key),
            None => key,
        }
    }
}

pub enum NextEntry<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    Unconditional(String),
    Conditional(ConditionalRouter<S>),
}
