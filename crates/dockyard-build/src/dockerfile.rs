use dockyard_core::{BuildSettings, BuildpackConfig, BuildpackKind};

/// Directory inside the image the sources are copied to.
const APP_DIR: &str = "/usr/src/app";

/// Directory the static server image serves from.
const STATIC_ROOT: &str = "/usr/share/nginx/html";

/// Generates the Dockerfile for a buildpack.
///
/// Expects settings with defaults applied; unset commands are skipped.
pub struct DockerfileGenerator<'a> {
    config: &'a BuildpackConfig,
    settings: &'a BuildSettings,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(config: &'a BuildpackConfig, settings: &'a BuildSettings) -> Self {
        Self { config, settings }
    }

    pub fn render(&self) -> String {
        match self.settings.buildpack {
            BuildpackKind::Node => self.render_node(),
            BuildpackKind::Static => self.render_static(),
        }
    }

    fn render_node(&self) -> String {
        let start = match self.command(&self.settings.start_command) {
            Some(cmd) => format!("CMD {cmd}\n"),
            None => String::new(),
        };

        format!(
            r#"FROM {image}
WORKDIR {APP_DIR}
COPY . .
{steps}EXPOSE {port}
{start}"#,
            image = self.config.node_image,
            steps = self.run_steps(),
            port = self.settings.effective_port(),
        )
    }

    fn render_static(&self) -> String {
        if self.command(&self.settings.build_command).is_none() {
            return format!(
                r#"FROM {image}
COPY . {STATIC_ROOT}
EXPOSE {port}
"#,
                image = self.config.static_image,
                port = self.settings.effective_port(),
            );
        }

        format!(
            r#"# === Stage 1: Builder ===
FROM {builder} AS builder
WORKDIR {APP_DIR}
COPY . .
{steps}
# === Stage 2: Server ===
FROM {image}
COPY --from=builder {APP_DIR}/{output} {STATIC_ROOT}
EXPOSE {port}
"#,
            builder = self.config.node_image,
            image = self.config.static_image,
            steps = self.run_steps(),
            output = self.config.static_output_dir.trim_matches('/'),
            port = self.settings.effective_port(),
        )
    }

    fn run_steps(&self) -> String {
        [&self.settings.install_command, &self.settings.build_command]
            .into_iter()
            .filter_map(|c| self.command(c))
            .map(|c| format!("RUN {c}\n"))
            .collect()
    }

    fn command<'s>(&self, value: &'s Option<String>) -> Option<&'s str> {
        value.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}
