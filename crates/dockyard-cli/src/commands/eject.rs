use std::path::Path;

use dockyard_build::Buildpack;
use dockyard_core::{Application, DockyardConfig};

pub fn eject(config_dir: &Path, application_path: &Path, repository_dir: &Path) -> anyhow::Result<()> {
    let config = DockyardConfig::load(config_dir)?;
    let application: Application = super::read_record(application_path)?;

    let settings = application.settings.with_defaults();
    let dockerfile = Buildpack::for_kind(settings.buildpack, &config.buildpacks).dockerfile(&settings);

    dockyard_build::eject::eject(repository_dir, &dockerfile)?;

    println!("Ejected build config to .dockyard/Dockerfile");
    println!("You can now edit it directly. Builds of this repository will use this file.");
    Ok(())
}
