use async_trait::async_trait;
use dockyard_core::{ImageTag, Removal};
use dockyard_runtime::runtime::{ContainerRuntime, ContainerSpec, RestartPolicy};
use dockyard_runtime::{DockerClient, DockerError, DockerExecutor};
use mockall::mock;
use std::path::Path;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

mock! {
    Executor {}

    #[async_trait]
    impl DockerExecutor for Executor {
        async fn exec(&self, args: &[String]) -> Result<String, DockerError>;
        async fn exec_streaming(
            &self,
            args: &[String],
            lines: UnboundedSender<String>,
        ) -> Result<(), DockerError>;
    }
}

fn failed(stderr: &str) -> DockerError {
    DockerError::CommandFailed {
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

fn image() -> ImageTag {
    ImageTag::for_revision("app123", "abc1234567")
}

// ── Image Tests ──

#[tokio::test]
async fn image_exists_when_inspect_succeeds() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| {
            args.starts_with(&["image".to_owned(), "inspect".to_owned()])
                && args.contains(&"app123:abc1234".to_owned())
        })
        .times(1)
        .returning(|_| Ok("sha256:deadbeef\n".to_owned()));

    let client = DockerClient::with_executor(mock);

    assert!(client.image_exists(&image()).await.unwrap());
}

#[tokio::test]
async fn image_missing_is_not_an_error() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .returning(|_| Err(failed("Error: No such image: app123:abc1234")));

    let client = DockerClient::with_executor(mock);

    assert!(!client.image_exists(&image()).await.unwrap());
}

#[tokio::test]
async fn image_lookup_propagates_daemon_errors() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .returning(|_| Err(failed("Cannot connect to the Docker daemon")));

    let client = DockerClient::with_executor(mock);

    assert!(matches!(
        client.image_exists(&image()).await,
        Err(DockerError::CommandFailed { .. })
    ));
}

#[tokio::test]
async fn build_image_streams_output() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .withf(|args, _| {
            args.first().map(String::as_str) == Some("build")
                && args.windows(2).any(|w| w[0] == "--tag" && w[1] == "app123:abc1234")
                && args.windows(2).any(|w| w[0] == "--file" && w[1] == "/ws/.dockyard-build/Dockerfile")
                && args.last().map(String::as_str) == Some("/ws")
        })
        .times(1)
        .returning(|_, lines| {
            lines.send("#1 [internal] load build definition".to_owned()).unwrap();
            lines.send("#2 DONE".to_owned()).unwrap();
            Ok(())
        });

    let client = DockerClient::with_executor(mock);
    let (tx, mut rx) = unbounded_channel();

    client
        .build_image(
            Path::new("/ws"),
            Path::new("/ws/.dockyard-build/Dockerfile"),
            &image(),
            tx,
        )
        .await
        .unwrap();

    assert_eq!(rx.recv().await.unwrap(), "#1 [internal] load build definition");
    assert_eq!(rx.recv().await.unwrap(), "#2 DONE");
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn remove_image_reports_not_found() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args.starts_with(&["image".to_owned(), "rm".to_owned()]))
        .returning(|_| Err(failed("Error: No such image: app123:abc1234")));

    let client = DockerClient::with_executor(mock);

    assert_eq!(client.remove_image(&image()).await.unwrap(), Removal::NotFound);
}

// ── Container Tests ──

#[tokio::test]
async fn stop_container_without_grace_period() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args == ["stop", "--time", "0", "app123"])
        .times(1)
        .returning(|_| Ok("app123\n".to_owned()));

    let client = DockerClient::with_executor(mock);

    assert_eq!(client.stop_container("app123").await.unwrap(), Removal::Removed);
}

#[tokio::test]
async fn stop_missing_container_is_not_found() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .returning(|_| Err(failed("Error response from daemon: No such container: app123")));

    let client = DockerClient::with_executor(mock);

    assert_eq!(client.stop_container("app123").await.unwrap(), Removal::NotFound);
}

#[tokio::test]
async fn remove_container_propagates_other_failures() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args == ["rm", "app123"])
        .returning(|_| Err(failed("permission denied")));

    let client = DockerClient::with_executor(mock);

    assert!(client.remove_container("app123").await.is_err());
}

#[tokio::test]
async fn run_container_detached_with_restart_policy() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| {
            args == [
                "run",
                "--name",
                "app123",
                "--network",
                "dockyard",
                "--restart",
                "always",
                "--detach",
                "app123:abc1234",
            ]
        })
        .times(1)
        .returning(|_| Ok("4f3c2a\n".to_owned()));

    let client = DockerClient::with_executor(mock);
    let spec = ContainerSpec::new("app123", "app123:abc1234")
        .network("dockyard")
        .restart(RestartPolicy::Always);

    assert_eq!(client.run_container(&spec).await.unwrap(), "4f3c2a");
}

#[tokio::test]
async fn run_to_completion_passes_command_after_image() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| {
            args == [
                "run",
                "--name",
                "once",
                "--rm",
                "busybox",
                "echo",
                "hello",
            ]
        })
        .returning(|_| Ok("hello\n".to_owned()));

    let client = DockerClient::with_executor(mock);
    let spec = ContainerSpec::new("once", "busybox")
        .auto_remove()
        .command(["echo", "hello"]);

    assert_eq!(client.run_to_completion(&spec).await.unwrap(), "hello\n");
}

// ── Network Tests ──

#[tokio::test]
async fn ensure_network_creates_missing_network() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args.starts_with(&["network".to_owned(), "inspect".to_owned()]))
        .times(1)
        .returning(|_| Err(failed("Error: No such network: dockyard")));
    mock.expect_exec()
        .withf(|args| args == ["network", "create", "--attachable", "dockyard"])
        .times(1)
        .returning(|_| Ok("a1b2c3\n".to_owned()));

    let client = DockerClient::with_executor(mock);

    assert!(client.ensure_network("dockyard").await.unwrap());
}

#[tokio::test]
async fn ensure_network_keeps_existing_network() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args.starts_with(&["network".to_owned(), "inspect".to_owned()]))
        .times(1)
        .returning(|_| Ok("dockyard\n".to_owned()));
    mock.expect_exec()
        .withf(|args| args.contains(&"create".to_owned()))
        .times(0);

    let client = DockerClient::with_executor(mock);

    assert!(!client.ensure_network("dockyard").await.unwrap());
}

#[tokio::test]
async fn server_version_is_trimmed() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args.first().map(String::as_str) == Some("version"))
        .returning(|_| Ok("27.3.1\n".to_owned()));

    let client = DockerClient::with_executor(mock);

    assert_eq!(client.server_version().await.unwrap(), "27.3.1");
}
