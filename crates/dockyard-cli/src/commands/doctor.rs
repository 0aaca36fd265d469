use std::path::Path;

use dockyard_core::{BackendKind, DestinationBackend, DockyardConfig, destination::DEFAULT_ENGINE};
use dockyard_proxy::{DataPlaneApi, HaproxyClient};
use dockyard_runtime::{CheckResult, DockerClient, DoctorReport, check_runtime};

/// Network checked when no destination file is given.
const DEFAULT_NETWORK: &str = "dockyard";

pub async fn doctor(config_dir: &Path, destination_path: Option<&Path>) -> anyhow::Result<()> {
    let mut report = DoctorReport::default();

    let config_path = config_dir.join("dockyard.toml");
    let config = match DockyardConfig::load(config_dir) {
        Ok(config) => {
            report.config_file = if config_path.exists() {
                CheckResult::ok("Found")
            } else {
                CheckResult::ok("Not found, using defaults")
            };
            config
        }
        Err(e) => {
            report.config_file = CheckResult::fail(&e.to_string());
            DockyardConfig::default()
        }
    };

    let destination = match destination_path {
        Some(path) => super::read_record(path)?,
        None => local_destination(),
    };
    let client = DockerClient::for_backend(&config.runtime.docker_binary, &destination);
    check_runtime(&client, &destination.network, &mut report).await;

    report.proxy = match HaproxyClient::new(&config.proxy) {
        Ok(proxy) => match proxy.configuration_version().await {
            Ok(version) => CheckResult::ok(&format!("configuration version {version}")),
            Err(e) => CheckResult::fail(&e.to_string()),
        },
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed; see above for details");
    }

    Ok(())
}

fn local_destination() -> DestinationBackend {
    DestinationBackend {
        id: "local".to_owned(),
        name: "local".to_owned(),
        kind: BackendKind::SingleHost,
        engine: DEFAULT_ENGINE.to_owned(),
        network: DEFAULT_NETWORK.to_owned(),
        proxy_managed: true,
    }
}
