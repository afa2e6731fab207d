use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A canned post-creation operation on a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Upgrade,
    Initialise,
    Install,
    Configure,
}

impl ActionKind {
    /// All kinds, in the order they are offered after `create`.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Upgrade,
        ActionKind::Initialise,
        ActionKind::Install,
        ActionKind::Configure,
    ];
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Upgrade => write!(f, "upgrade"),
            ActionKind::Initialise => write!(f, "initialise"),
            ActionKind::Install => write!(f, "install"),
            ActionKind::Configure => write!(f, "configure"),
        }
    }
}

/// How a profile fulfils one [`ActionKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRecipe {
    /// Refresh the package index, then upgrade everything. The two steps
    /// are chained with `&&` so a failed refresh aborts the upgrade.
    Upgrade,
    /// Install the listed packages. An empty list renders to no command
    /// at all, never to an empty string.
    Packages(Vec<String>),
    /// Free-form shell text, run verbatim.
    Script(String),
}
