// src/resolve/manifest.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// The parts of a `package.json` that matter for dependency resolution.
///
/// Unknown fields are ignored, so real-world manifests parse as long as the
/// fields below have the expected shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Names this package depends on, runtime dependencies first.
    pub fn dependency_names(&self, include_dev: bool) -> impl Iterator<Item = &str> {
        let dev = include_dev.then_some(&self.dev_dependencies);
        self.dependencies
            .keys()
            .chain(dev.into_iter().flat_map(|deps| deps.keys()))
            .map(String::as_str)
    }
}
