use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The strategy that turns an application's source into a runnable image.
///
/// Adding a variant forces every `match` over buildpacks (defaults, Dockerfile
/// generation) to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildpackKind {
    /// Long-running Node.js process started with a start command.
    Node,
    /// Files served by nginx, optionally produced by a build command first.
    Static,
}

impl BuildpackKind {
    pub const ALL: [BuildpackKind; 2] = [BuildpackKind::Node, BuildpackKind::Static];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildpackKind::Node => "node",
            BuildpackKind::Static => "static",
        }
    }

    /// Port the container listens on when the application does not set one.
    pub fn default_port(&self) -> u16 {
        match self {
            BuildpackKind::Node => 3000,
            BuildpackKind::Static => 80,
        }
    }

    /// Install command applied when unset.
    ///
    /// The static buildpack only installs dependencies when it has something
    /// to build.
    pub fn default_install_command(&self, has_build_command: bool) -> Option<&'static str> {
        match self {
            BuildpackKind::Node => Some("yarn install"),
            BuildpackKind::Static if has_build_command => Some("yarn install"),
            BuildpackKind::Static => None,
        }
    }

    /// Start command applied when unset. nginx needs none.
    pub fn default_start_command(&self) -> Option<&'static str> {
        match self {
            BuildpackKind::Node => Some("yarn start"),
            BuildpackKind::Static => None,
        }
    }
}

impl fmt::Display for BuildpackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildpackKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node" | "nodejs" => Ok(BuildpackKind::Node),
            "static" => Ok(BuildpackKind::Static),
            other => Err(crate::Error::UnknownBuildpack(other.to_owned())),
        }
    }
}
