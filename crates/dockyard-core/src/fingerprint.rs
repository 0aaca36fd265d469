//! Configuration fingerprinting.
//!
//! The fingerprint is a SHA-256 over a canonical JSON rendering of the
//! build-affecting settings. Keys are emitted in sorted order and unset or
//! blank commands are rendered as `null`, so two settings that mean the same
//! thing always hash the same.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::application::BuildSettings;

/// Hex-encoded SHA-256 of the canonical build settings (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Fingerprint {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Compute the fingerprint of the given settings.
///
/// Callers apply buildpack defaults first (see
/// [`BuildSettings::with_defaults`]); defaults are part of what gets hashed.
pub fn fingerprint(settings: &BuildSettings) -> Fingerprint {
    let digest = Sha256::digest(canonical_json(settings).as_bytes());
    Fingerprint(hex::encode(digest))
}

/// Whether a stored fingerprint calls for a rebuild.
///
/// No stored fingerprint (or a blank one) always rebuilds.
pub fn needs_rebuild(stored: Option<&str>, current: &Fingerprint) -> bool {
    match stored.map(str::trim) {
        None | Some("") => true,
        Some(stored) => stored != current.as_str(),
    }
}

fn canonical_json(settings: &BuildSettings) -> String {
    let mut map = Map::new();
    map.insert(
        "buildPack".to_owned(),
        Value::String(settings.buildpack.as_str().to_owned()),
    );
    map.insert(
        "port".to_owned(),
        settings.port.map_or(Value::Null, Value::from),
    );
    map.insert(
        "installCommand".to_owned(),
        command_value(settings.install_command.as_deref()),
    );
    map.insert(
        "buildCommand".to_owned(),
        command_value(settings.build_command.as_deref()),
    );
    map.insert(
        "startCommand".to_owned(),
        command_value(settings.start_command.as_deref()),
    );

    // serde_json's default map is ordered by key.
    Value::Object(map).to_string()
}

fn command_value(command: Option<&str>) -> Value {
    match command.map(str::trim) {
        None | Some("") => Value::Null,
        Some(c) => Value::String(c.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuildpackKind;

    #[test]
    fn canonical_json_sorts_keys() {
        let settings = BuildSettings {
            buildpack: BuildpackKind::Node,
            port: Some(3000),
            install_command: Some("yarn install".to_owned()),
            build_command: None,
            start_command: Some("yarn start".to_owned()),
        };
        assert_eq!(
            canonical_json(&settings),
            r#"{"buildCommand":null,"buildPack":"node","installCommand":"yarn install","port":3000,"startCommand":"yarn start"}"#
        );
    }

    #[test]
    fn blank_command_renders_as_null() {
        assert_eq!(command_value(Some("   ")), Value::Null);
        assert_eq!(command_value(None), Value::Null);
    }
}
