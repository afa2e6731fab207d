use serde::Deserialize;

/// One machine record as the external tool reports it. Two shapes exist
/// in the wild: older versions emit flat `distro`/`version`/`arch`
/// fields, newer ones nest them under an `image` object and put user
/// settings under `config`. Every field beyond `name` is optional so a
/// record from either shape deserializes without error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMachine {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    distro: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    arch: Option<String>,
    #[serde(default)]
    image: Option<RawImage>,
    #[serde(default)]
    pub config: Option<RawConfig>,
    #[serde(default)]
    pub builtin: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub distro: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub default_username: Option<String>,
    #[serde(default)]
    pub isolated: Option<bool>,
}

impl RawMachine {
    /// Flat field first, then the nested image object.
    pub fn distro(&self) -> Option<&str> {
        self.distro
            .as_deref()
            .or_else(|| self.image.as_ref().and_then(|image| image.distro.as_deref()))
    }

    pub fn version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.image.as_ref().and_then(|image| image.version.as_deref()))
    }

    pub fn arch(&self) -> Option<&str> {
        self.arch
            .as_deref()
            .or_else(|| self.image.as_ref().and_then(|image| image.arch.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_shape() {
        let raw: RawMachine = serde_json::from_value(json!({
            "name": "dev",
            "distro": "ubuntu",
            "version": "jammy",
            "arch": "arm64",
            "state": "running",
            "id": "m-1"
        }))
        .unwrap();
        assert_eq!(raw.distro(), Some("ubuntu"));
        assert_eq!(raw.version(), Some("jammy"));
        assert_eq!(raw.arch(), Some("arm64"));
    }

    #[test]
    fn nested_shape() {
        let raw: RawMachine = serde_json::from_value(json!({
            "name": "dev",
            "image": {
                "distro": "ubuntu",
                "version": "jammy",
                "arch": "arm64",
                "variant": "default"
            },
            "config": { "default_username": "dev", "isolated": false },
            "builtin": false,
            "state": "running",
            "id": "m-1"
        }))
        .unwrap();
        assert_eq!(raw.distro(), Some("ubuntu"));
        assert_eq!(raw.version(), Some("jammy"));
        assert_eq!(raw.arch(), Some("arm64"));
    }

    #[test]
    fn missing_optionals_resolve_to_none() {
        let raw: RawMachine = serde_json::from_value(json!({ "name": "bare" })).unwrap();
        assert_eq!(raw.distro(), None);
        assert_eq!(raw.version(), None);
        assert_eq!(raw.arch(), None);
        assert_eq!(raw.state, None);
        assert_eq!(raw.id, None);
    }

    #[test]
    fn versionless_nested_image() {
        let raw: RawMachine = serde_json::from_value(json!({
            "name": "arch-box",
            "image": { "distro": "arch", "arch": "amd64" },
            "state": "stopped",
            "id": "m-2"
        }))
        .unwrap();
        assert_eq!(raw.distro(), Some("arch"));
        assert_eq!(raw.version(), None);
    }
}
