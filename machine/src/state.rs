use std::fmt::Display;

/// Lifecycle state of a guest machine. The external tool's state
/// vocabulary is open-ended, so anything beyond the two states we act on
/// is carried through verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    /// No state reported yet.
    Unknown,
    Running,
    Stopped,
    /// Any other state string the external tool reports.
    Other(String),
}

impl MachineState {
    pub fn from_external(state: Option<&str>) -> Self {
        match state {
            None => MachineState::Unknown,
            Some("running") => MachineState::Running,
            Some("stopped") => MachineState::Stopped,
            Some(other) => MachineState::Other(other.to_owned()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, MachineState::Running)
    }
}

impl Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineState::Unknown => write!(f, "unknown"),
            MachineState::Running => write!(f, "running"),
            MachineState::Stopped => write!(f, "stopped"),
            MachineState::Other(state) => write!(f, "{state}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_states() {
        assert_eq!(
            MachineState::from_external(Some("running")),
            MachineState::Running
        );
        assert_eq!(
            MachineState::from_external(Some("stopped")),
            MachineState::Stopped
        );
        assert_eq!(MachineState::from_external(None), MachineState::Unknown);
    }

    #[test]
    fn external_states_pass_through_verbatim() {
        let state = MachineState::from_external(Some("saving"));
        assert_eq!(state, MachineState::Other("saving".to_owned()));
        assert_eq!(state.to_string(), "saving");
    }
}
