use serde::{Deserialize, Serialize};

use crate::buildpack::BuildpackKind;
use crate::destination::{DestinationBackend, SourceOrigin};
use crate::fingerprint::fingerprint;
use crate::job::BuildJob;

/// Build-affecting settings of an application: the fingerprinted tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(rename = "build_pack", alias = "buildpack")]
    pub buildpack: BuildpackKind,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub install_command: Option<String>,
    #[serde(default)]
    pub build_command: Option<String>,
    #[serde(default)]
    pub start_command: Option<String>,
}

impl BuildSettings {
    pub fn new(buildpack: BuildpackKind) -> Self {
        Self {
            buildpack,
            port: None,
            install_command: None,
            build_command: None,
            start_command: None,
        }
    }

    /// Fill unset fields with the buildpack's defaults.
    ///
    /// Blank commands count as unset. Must run before fingerprinting: the
    /// defaults are part of the hashed configuration.
    pub fn with_defaults(&self) -> Self {
        let kind = self.buildpack;
        let build_command = non_blank(self.build_command.as_deref());

        Self {
            buildpack: kind,
            port: Some(self.port.unwrap_or_else(|| kind.default_port())),
            install_command: non_blank(self.install_command.as_deref()).or_else(|| {
                kind.default_install_command(build_command.is_some())
                    .map(str::to_owned)
            }),
            start_command: non_blank(self.start_command.as_deref())
                .or_else(|| kind.default_start_command().map(str::to_owned)),
            build_command,
        }
    }

    /// The port the container listens on, falling back to the buildpack default.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.buildpack.default_port())
    }
}

/// An application record as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub settings: BuildSettings,
    #[serde(default)]
    pub domain: Option<String>,
    /// Domain still routed by the proxy and awaiting retirement.
    #[serde(default, alias = "old_domain")]
    pub previous_domain: Option<String>,
    /// Fingerprint of the settings as of the last comparison.
    #[serde(default)]
    pub config_hash: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub destination_id: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// New values submitted for an application's deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    pub settings: BuildSettings,
    pub domain: Option<String>,
}

impl Application {
    pub fn new(id: impl Into<String>, name: impl Into<String>, buildpack: BuildpackKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            settings: BuildSettings::new(buildpack),
            domain: None,
            previous_domain: None,
            config_hash: None,
            repository: None,
            branch: None,
            destination_id: None,
            source_id: None,
        }
    }

    /// Replace the deployment configuration.
    ///
    /// A domain change records the currently routed domain as pending
    /// cleanup. An already pending cleanup is kept: the domain in between was
    /// never routed. Switching back to the pending domain cancels the cleanup.
    /// The stored fingerprint is left alone; the next build compares against it.
    pub fn update_configuration(&mut self, update: ConfigurationUpdate) {
        let new_domain = non_blank(update.domain.as_deref());
        let current = non_blank(self.domain.as_deref());

        if new_domain != current {
            let pending = non_blank(self.previous_domain.as_deref());
            if pending.is_none() {
                self.previous_domain = current;
            }
            if self.previous_domain.is_some() && self.previous_domain == new_domain {
                self.previous_domain = None;
            }
        }

        self.domain = new_domain;
        self.settings = update.settings;
    }

    /// Point the application at another source origin.
    ///
    /// Repository and branch belong to the old origin and are cleared.
    pub fn attach_source(&mut self, source_id: &str) {
        if self.source_id.as_deref() != Some(source_id) {
            self.repository = None;
            self.branch = None;
        }
        self.source_id = Some(source_id.to_owned());
    }

    pub fn set_repository(&mut self, repository: &str, branch: &str) {
        self.repository = Some(repository.trim_matches('/').to_owned());
        self.branch = Some(branch.to_owned());
    }

    pub fn attach_destination(&mut self, destination_id: &str) {
        self.destination_id = Some(destination_id.to_owned());
    }

    /// Build the queue payload for a deployment of this application.
    ///
    /// An application that has never been fingerprinted is seeded with the
    /// fingerprint of its settings as stored (defaults not applied), so the
    /// first build compares against what the user actually entered.
    pub fn prepare_job(
        &mut self,
        build_id: &str,
        destination: &DestinationBackend,
        origin: &SourceOrigin,
    ) -> crate::Result<BuildJob> {
        let repository = self
            .repository
            .clone()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| crate::Error::MissingRepository(self.name.clone()))?;
        if self.destination_id.as_deref() != Some(destination.id.as_str()) {
            return Err(crate::Error::MissingDestination(self.name.clone()));
        }
        if self.source_id.as_deref() != Some(origin.id.as_str()) {
            return Err(crate::Error::MissingSource(self.name.clone()));
        }

        if non_blank(self.config_hash.as_deref()).is_none() {
            self.config_hash = Some(fingerprint(&self.settings).into_string());
        }

        Ok(BuildJob {
            build_id: build_id.to_owned(),
            application_id: self.id.clone(),
            repository,
            branch: self.branch.clone().unwrap_or_else(|| "main".to_owned()),
            settings: self.settings.clone(),
            destination: destination.clone(),
            origin: origin.clone(),
            config_hash: self.config_hash.clone(),
            domain: self.domain.clone(),
            previous_domain: self.previous_domain.clone(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
