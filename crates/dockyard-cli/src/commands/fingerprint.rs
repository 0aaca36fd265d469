use std::path::Path;

use dockyard_core::{Application, needs_rebuild};

pub fn fingerprint(application_path: &Path) -> anyhow::Result<()> {
    let application: Application = super::read_record(application_path)?;
    let settings = application.settings.with_defaults();
    let current = dockyard_core::fingerprint(&settings);

    println!("{current}");
    if needs_rebuild(application.config_hash.as_deref(), &current) {
        println!("Configuration changed since the last build; the next build rebuilds.");
    } else {
        println!("Configuration unchanged.");
    }
    Ok(())
}
