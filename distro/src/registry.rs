use indexmap::IndexMap;
use thiserror::Error;

use crate::{ActionKind, ActionRecipe, DistroProfile, PackageManager};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown distribution: {distro}")]
    UnknownDistribution { distro: String },
}

/// The four lifecycle commands for one distribution, resolved up front so
/// a machine record can carry them without going back to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionCommands {
    pub upgrade: Option<String>,
    pub initialise: Option<String>,
    pub install: Option<String>,
    pub configure: Option<String>,
}

impl ActionCommands {
    pub fn get(&self, kind: ActionKind) -> Option<&str> {
        match kind {
            ActionKind::Upgrade => self.upgrade.as_deref(),
            ActionKind::Initialise => self.initialise.as_deref(),
            ActionKind::Install => self.install.as_deref(),
            ActionKind::Configure => self.configure.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ActionKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }
}

/// Immutable table of distro profiles, keyed by id. Built once by an
/// explicit constructor and passed to whoever needs it; there is no
/// ambient global registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    profiles: IndexMap<String, DistroProfile>,
}

impl Registry {
    pub fn new(profiles: impl IntoIterator<Item = DistroProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.id().to_owned(), profile))
            .collect();
        Self { profiles }
    }

    /// The profiles shipped with this tool, recovered from the per-distro
    /// initialiser definitions.
    pub fn builtin() -> Self {
        Self::new([ubuntu(), debian(), centos()])
    }

    pub fn profile(&self, distro: &str) -> Result<&DistroProfile, RegistryError> {
        self.profiles
            .get(distro)
            .ok_or_else(|| RegistryError::UnknownDistribution {
                distro: distro.to_owned(),
            })
    }

    /// `Err` when the distro has no profile at all, `Ok(None)` when the
    /// profile exists but the action is undefined for it.
    pub fn resolve(&self, distro: &str, kind: ActionKind) -> Result<Option<String>, RegistryError> {
        Ok(self.profile(distro)?.command(kind))
    }

    pub fn commands(&self, distro: &str) -> Result<ActionCommands, RegistryError> {
        let profile = self.profile(distro)?;
        Ok(ActionCommands {
            upgrade: profile.command(ActionKind::Upgrade),
            initialise: profile.command(ActionKind::Initialise),
            install: profile.command(ActionKind::Install),
            configure: profile.command(ActionKind::Configure),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DistroProfile> {
        self.profiles.values()
    }
}

const ESSENTIALS: [&str; 4] = ["git", "wget", "curl", "nano"];

fn package_list(names: impl IntoIterator<Item = &'static str>) -> ActionRecipe {
    ActionRecipe::Packages(names.into_iter().map(str::to_owned).collect())
}

fn ubuntu() -> DistroProfile {
    DistroProfile::new("ubuntu", PackageManager::APT, true, true)
        .with_action(ActionKind::Upgrade, ActionRecipe::Upgrade)
        .with_action(ActionKind::Initialise, package_list(ESSENTIALS))
        .with_action(
            ActionKind::Install,
            package_list([
                "docker-ce",
                "docker-ce-cli",
                "containerd.io",
                "docker-buildx-plugin",
                "docker-compose-plugin",
            ]),
        )
        .with_action(
            ActionKind::Configure,
            ActionRecipe::Script("sudo apt autoremove -y && sudo apt autoclean".to_owned()),
        )
}

fn debian() -> DistroProfile {
    DistroProfile::new("debian", PackageManager::APT, true, true)
        .with_action(ActionKind::Upgrade, ActionRecipe::Upgrade)
        .with_action(ActionKind::Initialise, package_list(ESSENTIALS))
}

// The centos definitions never grew upgrade, install, or configure
// commands, so only initialise is defined for it.
fn centos() -> DistroProfile {
    DistroProfile::new("centos", PackageManager::YUM, true, true)
        .with_action(ActionKind::Initialise, package_list(ESSENTIALS))
}
