use indexmap::IndexMap;

/// The fixed table of distributions the external tool can create, with
/// the versions it accepts for each. A catalog entry does not imply a
/// profile in the [`Registry`](crate::Registry): a distro can be
/// creatable without having any lifecycle commands.
#[derive(Debug, Clone)]
pub struct Catalog {
    distros: IndexMap<&'static str, &'static [&'static str]>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let distros: [(&'static str, &'static [&'static str]); 16] = [
            ("alma", &["8", "9"]),
            ("alpine", &["3.16", "3.17", "3.18", "3.19"]),
            ("arch", &[]),
            ("centos", &["8", "9"]),
            ("debian", &["buster", "bullseye", "bookworm"]),
            ("devuan", &["beowulf", "chimaera", "daedalus"]),
            ("fedora", &["38", "39"]),
            ("gentoo", &[]),
            ("kali", &[]),
            ("nixos", &["23.11"]),
            ("openeuler", &["20.03", "22.03", "23.09"]),
            ("opensuse", &["15.4", "15.5"]),
            ("oracle", &["8", "9"]),
            ("rocky", &["8", "9"]),
            ("ubuntu", &["bionic", "focal", "jammy", "lunar", "mantic"]),
            ("void", &[]),
        ];
        Self {
            distros: distros.into_iter().collect(),
        }
    }

    pub fn contains(&self, distro: &str) -> bool {
        self.distros.contains_key(distro)
    }

    /// Versions creatable for a distro; empty for versionless distros,
    /// `None` for distros outside the catalog.
    pub fn versions(&self, distro: &str) -> Option<&'static [&'static str]> {
        self.distros.get(distro).copied()
    }

    /// The last listed version, the one `create` offers by default.
    /// `None` for versionless or unknown distros.
    pub fn default_version(&self, distro: &str) -> Option<&'static str> {
        self.versions(distro)?.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static [&'static str])> + '_ {
        self.distros.iter().map(|(id, versions)| (*id, *versions))
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.distros.keys().copied()
    }
}
