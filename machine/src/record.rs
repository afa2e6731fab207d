use orbman_distro::{ActionCommands, ActionKind, Registry, RegistryError};
use orbman_orb::RawMachine;
use tracing::warn;

use crate::MachineState;

/// This tool's view of one guest machine: identity, state, and the four
/// lifecycle commands resolved once from the distro profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineRecord {
    pub name: String,
    pub distro: Option<String>,
    pub version: Option<String>,
    pub arch: Option<String>,
    pub state: MachineState,
    /// Opaque handle from the external tool.
    pub id: Option<String>,
    pub commands: ActionCommands,
}

impl MachineRecord {
    pub fn command(&self, kind: ActionKind) -> Option<&str> {
        self.commands.get(kind)
    }
}

/// Flatten one external record into a [`MachineRecord`], reading fields
/// from whichever shape the tool produced. A distro without a profile is
/// not an error: the record simply carries no lifecycle commands.
pub fn normalize(raw: RawMachine, registry: &Registry) -> MachineRecord {
    let distro = raw.distro().map(str::to_owned);
    let version = raw.version().map(str::to_owned);
    let arch = raw.arch().map(str::to_owned);

    let commands = match distro.as_deref() {
        Some(distro) => match registry.commands(distro) {
            Ok(commands) => commands,
            Err(RegistryError::UnknownDistribution { .. }) => {
                warn!(
                    machine = %raw.name,
                    distro,
                    "no profile for distro, lifecycle commands unavailable"
                );
                ActionCommands::default()
            }
        },
        None => {
            warn!(machine = %raw.name, "record reports no distro");
            ActionCommands::default()
        }
    };

    MachineRecord {
        state: MachineState::from_external(raw.state.as_deref()),
        name: raw.name,
        distro,
        version,
        arch,
        id: raw.id,
        commands,
    }
}

/// Normalize a whole listing, preserving input order. Sorting is the
/// directory's business, not this function's.
pub fn normalize_many(
    raw: impl IntoIterator<Item = RawMachine>,
    registry: &Registry,
) -> Vec<MachineRecord> {
    raw.into_iter().map(|raw| normalize(raw, registry)).collect()
}
