//! Resource state and the convergence decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};

/// Closed set of resource states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Unknown,
    Present,
    Absent,
    Running,
    Stopped,
}

impl StateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StateKind::Unknown => "unknown",
            StateKind::Present => "present",
            StateKind::Absent => "absent",
            StateKind::Running => "running",
            StateKind::Stopped => "stopped",
        }
    }

    /// States reached through Create.
    fn is_up(self) -> bool {
        matches!(self, StateKind::Running | StateKind::Present)
    }

    /// States reached through Delete.
    fn is_down(self) -> bool {
        matches!(self, StateKind::Stopped | StateKind::Absent)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Observed state right before acting.
    pub current: StateKind,
    /// Declared target.
    pub want: StateKind,
    /// Converge attributes orthogonal to current/want (e.g. enabled at boot).
    pub update: bool,
}

impl State {
    /// Fresh evaluation result: nothing observed yet.
    pub fn new(want: StateKind) -> Self {
        Self {
            current: StateKind::Unknown,
            want,
            update: false,
        }
    }
}

/// Operation selected by [`plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
    Update,
    Noop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Update => "update",
            Action::Noop => "noop",
        })
    }
}

/// Pick the single operation that moves a resource toward its target.
///
/// `Unknown` never matches anything, including an `Unknown` target.
pub fn plan(state: &State) -> Result<Action> {
    let State {
        current,
        want,
        update,
    } = *state;

    if current == StateKind::Unknown || want == StateKind::Unknown {
        return Err(ResourceError::UnknownState { want });
    }

    if current == want {
        return Ok(if update { Action::Update } else { Action::Noop });
    }

    if current.is_down() && want.is_up() {
        Ok(Action::Create)
    } else if current.is_up() && want.is_down() {
        Ok(Action::Delete)
    } else {
        Err(ResourceError::UnsupportedTransition { current, want })
    }
}
