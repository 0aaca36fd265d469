use crate::runtime::ContainerRuntime;

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub docker: CheckResult,
    pub network: CheckResult,
    pub proxy: CheckResult,
    pub config_file: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.docker.passed && self.network.passed && self.proxy.passed && self.config_file.passed
    }
}

impl std::fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, check) in [
            ("docker", &self.docker),
            ("network", &self.network),
            ("proxy", &self.proxy),
            ("dockyard.toml", &self.config_file),
        ] {
            writeln!(f, "[{}] {label:<14} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

/// Check the engine and the destination network without early return.
///
/// Only inspects; a missing network is reported, not created.
pub async fn check_runtime(runtime: &dyn ContainerRuntime, network: &str, report: &mut DoctorReport) {
    match runtime.server_version().await {
        Ok(v) if !v.is_empty() => report.docker = CheckResult::ok(&format!("server {v}")),
        Ok(_) => report.docker = CheckResult::fail("daemon did not report a version"),
        Err(e) => {
            report.docker = CheckResult::fail(&e.to_string());
            report.network = CheckResult::fail("skipped: docker unavailable");
            return;
        }
    }

    report.network = match runtime.network_exists(network).await {
        Ok(true) => CheckResult::ok(network),
        Ok(false) => CheckResult::fail(&format!("{network} does not exist")),
        Err(e) => CheckResult::fail(&e.to_string()),
    };
}
