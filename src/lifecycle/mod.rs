//! Lifecycle management for rover components

use std::fmt;

use tracing::info;

use crate::error::{Error, Result};

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;

    /// Final shutdown from any state
    fn on_shutdown(&mut self) -> Result<()>;

    fn state(&self) -> State;
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Unconfigured => "unconfigured",
            State::Inactive => "inactive",
            State::Active => "active",
            State::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Base implementation for lifecycle nodes
#[derive(Debug, Clone)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    /// Move from `from` to `to`, rejecting the request from any other state
    pub fn transition(&mut self, from: State, to: State) -> Result<()> {
        if self.state != from {
            return Err(Error::Lifecycle(format!(
                "{}: cannot go {} -> {} while {}",
                self.name, from, to, self.state
            )));
        }
        info!("{}: {} -> {}", self.name, from, to);
        self.state = to;
        Ok(())
    }

    /// Enter `Finalized` from any state
    pub fn finalize(&mut self) {
        info!("{}: {} -> {}", self.name, self.state, State::Finalized);
        self.state = State::Finalized;
    }
}
