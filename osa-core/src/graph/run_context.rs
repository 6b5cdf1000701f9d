//! Run-scoped context handed to `Node::run_with_context`: the session this
//! run belongs to, the bus to emit progress events on, and the previous
//! state (for nodes that care about what changed).

use std::fmt::Debug;

use crate::bus::Bus;

pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub session_id: String,
    pub bus: Option<Bus>,
    pub previous: Option<S>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            bus: None,
            previous: None,
        }
    }

    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_previous(mut self, previous: S) -> Self {
        self.previous = Some(previous);
        self
    }
}

impl<S> Clone for RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            bus: self.bus.clone(),
            previous: self.previous.clone(),
        }
    }
}

impl<S> Debug for RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("session_id", &self.session_id)
            .field("bus", &self.bus.is_some())
            .field("previous", &self.previous)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_previous_and_bus() {
        let ctx: RunContext<String> = RunContext::new("s1")
            .with_bus(Bus::new())
            .with_previous("prev".to_string());
        assert_eq!(ctx.session_id, "s1");
        assert!(ctx.bus.is_some());
        assert_eq!(ctx.previous, Some("prev".to_string()));
    }
}
