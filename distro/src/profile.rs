use std::collections::BTreeMap;

use crate::{ActionKind, ActionRecipe};

/// How to drive one family of package managers. The verbs differ between
/// families: apt refreshes with `update` and upgrades with `upgrade`,
/// while yum refreshes with `check-update` and upgrades with `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageManager {
    program: &'static str,
    update_verb: &'static str,
    upgrade_verb: &'static str,
    install_verb: &'static str,
    assume_yes_flag: &'static str,
}

impl PackageManager {
    pub const APT: PackageManager = PackageManager {
        program: "apt",
        update_verb: "update",
        upgrade_verb: "upgrade",
        install_verb: "install",
        assume_yes_flag: "-y",
    };

    pub const YUM: PackageManager = PackageManager {
        program: "yum",
        update_verb: "check-update",
        upgrade_verb: "update",
        install_verb: "install",
        assume_yes_flag: "-y",
    };

    fn prefix(&self, elevate: bool) -> String {
        if elevate {
            format!("sudo {}", self.program)
        } else {
            self.program.to_owned()
        }
    }

    /// `<prefix> <update> && <prefix> <upgrade> [-y]`
    pub fn upgrade_command(&self, elevate: bool, assume_yes: bool) -> String {
        let prefix = self.prefix(elevate);
        let mut command = format!(
            "{prefix} {update} && {prefix} {upgrade}",
            update = self.update_verb,
            upgrade = self.upgrade_verb,
        );
        if assume_yes {
            command.push(' ');
            command.push_str(self.assume_yes_flag);
        }
        command
    }

    /// `<prefix> <install> [-y] <package>...`, or `None` when there is
    /// nothing to install.
    pub fn install_command(
        &self,
        elevate: bool,
        assume_yes: bool,
        packages: &[String],
    ) -> Option<String> {
        if packages.is_empty() {
            return None;
        }
        let mut command = format!("{} {}", self.prefix(elevate), self.install_verb);
        if assume_yes {
            command.push(' ');
            command.push_str(self.assume_yes_flag);
        }
        for package in packages {
            command.push(' ');
            command.push_str(package);
        }
        Some(command)
    }
}

/// Static description of how to build shell commands for one guest
/// operating-system family. Absence of an [`ActionKind`] in `actions`
/// means the action is undefined for this distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroProfile {
    id: String,
    package_manager: PackageManager,
    elevate: bool,
    assume_yes: bool,
    actions: BTreeMap<ActionKind, ActionRecipe>,
}

impl DistroProfile {
    pub fn new(
        id: impl Into<String>,
        package_manager: PackageManager,
        elevate: bool,
        assume_yes: bool,
    ) -> Self {
        Self {
            id: id.into(),
            package_manager,
            elevate,
            assume_yes,
            actions: BTreeMap::new(),
        }
    }

    pub fn with_action(mut self, kind: ActionKind, recipe: ActionRecipe) -> Self {
        self.actions.insert(kind, recipe);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Render the shell command for one action, or `None` when the action
    /// is undefined for this distribution.
    pub fn command(&self, kind: ActionKind) -> Option<String> {
        match self.actions.get(&kind)? {
            ActionRecipe::Upgrade => Some(
                self.package_manager
                    .upgrade_command(self.elevate, self.assume_yes),
            ),
            ActionRecipe::Packages(packages) => {
                self.package_manager
                    .install_command(self.elevate, self.assume_yes, packages)
            }
            ActionRecipe::Script(script) => Some(script.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages(names: &[&str]) -> ActionRecipe {
        ActionRecipe::Packages(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn install_renders_every_package_once() {
        let profile = DistroProfile::new("ubuntu", PackageManager::APT, true, true)
            .with_action(ActionKind::Install, packages(&["git", "curl"]));
        assert_eq!(
            profile.command(ActionKind::Install).unwrap(),
            "sudo apt install -y git curl"
        );
    }

    #[test]
    fn install_without_elevation_or_consent() {
        let profile = DistroProfile::new("ubuntu", PackageManager::APT, false, false)
            .with_action(ActionKind::Install, packages(&["git"]));
        assert_eq!(profile.command(ActionKind::Install).unwrap(), "apt install git");
    }

    #[test]
    fn empty_package_list_is_undefined_not_empty() {
        let profile = DistroProfile::new("ubuntu", PackageManager::APT, true, true)
            .with_action(ActionKind::Install, packages(&[]));
        assert_eq!(profile.command(ActionKind::Install), None);
    }

    #[test]
    fn upgrade_chains_index_refresh_first() {
        let profile = DistroProfile::new("ubuntu", PackageManager::APT, true, true)
            .with_action(ActionKind::Upgrade, ActionRecipe::Upgrade);
        assert_eq!(
            profile.command(ActionKind::Upgrade).unwrap(),
            "sudo apt update && sudo apt upgrade -y"
        );
    }

    #[test]
    fn yum_uses_its_own_verbs() {
        let profile = DistroProfile::new("centos", PackageManager::YUM, true, true)
            .with_action(ActionKind::Upgrade, ActionRecipe::Upgrade);
        assert_eq!(
            profile.command(ActionKind::Upgrade).unwrap(),
            "sudo yum check-update && sudo yum update -y"
        );
    }

    #[test]
    fn missing_action_is_undefined() {
        let profile = DistroProfile::new("ubuntu", PackageManager::APT, true, true);
        assert_eq!(profile.command(ActionKind::Configure), None);
    }

    #[test]
    fn configure_is_verbatim_script() {
        let profile = DistroProfile::new("ubuntu", PackageManager::APT, true, true).with_action(
            ActionKind::Configure,
            ActionRecipe::Script("sudo apt autoremove -y && sudo apt autoclean".to_owned()),
        );
        assert_eq!(
            profile.command(ActionKind::Configure).unwrap(),
            "sudo apt autoremove -y && sudo apt autoclean"
        );
    }
}
