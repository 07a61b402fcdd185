//! Throwaway postgres/redis containers for the provisioned contract run.
//!
//! Lifecycle: connect → sweep leftovers of crashed runs → provision →
//! (run fixtures) → teardown. Containers carry a harness label so a sweep
//! never touches anything else on the daemon.

use std::collections::HashMap;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptionsBuilder,
    RemoveContainerOptionsBuilder, StartContainerOptionsBuilder, StopContainerOptionsBuilder,
};
use futures::TryStreamExt;

const STACK_LABEL_KEY: &str = "rastro.role";
const STACK_LABEL_VALUE: &str = "contract-test";

const POSTGRES_IMAGE: &str = "postgres:18";
const REDIS_IMAGE: &str = "redis:8";

/// Connection strings of the provisioned containers, as seen from the
/// machine the harness runs on.
pub struct InfraUrls {
    pub database_url: String,
    pub redis_url: String,
}

/// The postgres + redis pair backing one provisioned contract run.
pub struct TestStack {
    client: Docker,
    /// IP/hostname to reach container ports from the harness.
    host: String,
    container_ids: Vec<String>,
}

impl TestStack {
    /// Connect to the Docker daemon described by `docker_host`.
    ///
    /// - `unix://...` → local Unix socket
    /// - `tcp://HOST:PORT` → unencrypted HTTP to `HOST:PORT`
    /// - anything else → bollard's defaults
    pub async fn connect(docker_host: &str) -> Result<Self> {
        let (client, host) = if docker_host.starts_with("unix://") {
            let client = Docker::connect_with_local_defaults()
                .context("failed to connect to local Docker socket")?;
            (client, "127.0.0.1".to_owned())
        } else if let Some(rest) = docker_host.strip_prefix("tcp://") {
            let host = reachable_host(docker_host);
            let client = Docker::connect_with_http(rest, 120, bollard::API_DEFAULT_VERSION)
                .context("failed to connect to remote Docker daemon")?;
            (client, host)
        } else {
            let client =
                Docker::connect_with_defaults().context("failed to connect to Docker daemon")?;
            (client, "127.0.0.1".to_owned())
        };

        client
            .ping()
            .await
            .context("Docker daemon did not respond to ping")?;

        Ok(Self {
            client,
            host,
            container_ids: Vec::new(),
        })
    }

    /// Remove **non-running** containers left behind by earlier runs.
    ///
    /// Matches the harness label and exited/dead state only; a concurrent
    /// run's live containers are never touched.
    pub async fn sweep_leftovers(&self) -> Result<()> {
        let mut filters = HashMap::new();
        filters.insert(
            "label".to_owned(),
            vec![format!("{STACK_LABEL_KEY}={STACK_LABEL_VALUE}")],
        );
        filters.insert(
            "status".to_owned(),
            vec!["exited".to_owned(), "dead".to_owned()],
        );

        let options = ListContainersOptionsBuilder::new()
            .all(true)
            .filters(&filters)
            .build();

        for leftover in self.client.list_containers(Some(options)).await? {
            if let Some(id) = leftover.id {
                // Sweep failures are non-fatal; the new containers get fresh ports anyway.
                self.client
                    .remove_container(
                        &id,
                        Some(RemoveContainerOptionsBuilder::new().force(true).build()),
                    )
                    .await
                    .ok();
            }
        }

        Ok(())
    }

    /// Start postgres and redis on random host ports and wait for both to
    /// accept connections.
    pub async fn provision(&mut self) -> Result<InfraUrls> {
        let pg_id = self
            .run_container(
                POSTGRES_IMAGE,
                Some(vec![
                    "POSTGRES_USER=postgres".to_owned(),
                    "POSTGRES_PASSWORD=postgres".to_owned(),
                    "POSTGRES_DB=rastro_test".to_owned(),
                ]),
                "5432/tcp",
            )
            .await?;
        let pg_port = self.host_port(&pg_id, "5432/tcp").await?;
        wait_port_open(&self.host, pg_port, 30).await?;

        let redis_id = self.run_container(REDIS_IMAGE, None, "6379/tcp").await?;
        let redis_port = self.host_port(&redis_id, "6379/tcp").await?;
        wait_port_open(&self.host, redis_port, 30).await?;

        Ok(InfraUrls {
            database_url: format!(
                "postgres://postgres:postgres@{}:{}/rastro_test",
                self.host, pg_port
            ),
            redis_url: format!("redis://{}:{}", self.host, redis_port),
        })
    }

    /// Stop and remove everything this stack started. Best effort — a
    /// half-removed container is caught by the next run's sweep.
    pub async fn teardown(&mut self) {
        for id in self.container_ids.drain(..) {
            let _ = self
                .client
                .stop_container(&id, Some(StopContainerOptionsBuilder::new().t(5).build()))
                .await;
            let _ = self
                .client
                .remove_container(
                    &id,
                    Some(RemoveContainerOptionsBuilder::new().force(true).build()),
                )
                .await;
        }
    }

    /// Pull `image` if missing, create a labeled container with
    /// `container_port` bound to a random loopback port, and start it.
    async fn run_container(
        &mut self,
        image: &str,
        env: Option<Vec<String>>,
        container_port: &str,
    ) -> Result<String> {
        self.client
            .create_image(
                Some(CreateImageOptionsBuilder::new().from_image(image).build()),
                None,
                None,
            )
            .try_collect::<Vec<_>>()
            .await
            .with_context(|| format!("failed to pull {image}"))?;

        let mut labels = HashMap::new();
        labels.insert(STACK_LABEL_KEY.to_owned(), STACK_LABEL_VALUE.to_owned());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            container_port.to_owned(),
            Some(vec![PortBinding {
                host_ip: Some("127.0.0.1".to_owned()),
                host_port: Some(String::new()), // "" = random port
            }]),
        );

        let body = ContainerCreateBody {
            image: Some(image.to_owned()),
            env,
            labels: Some(labels),
            exposed_ports: Some(vec![container_port.to_owned()]),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        let id = self
            .client
            .create_container(Some(CreateContainerOptionsBuilder::new().build()), body)
            .await
            .with_context(|| format!("failed to create {image} container"))?
            .id;

        self.client
            .start_container(&id, Some(StartContainerOptionsBuilder::new().build()))
            .await
            .with_context(|| format!("failed to start {image} container"))?;

        self.container_ids.push(id.clone());
        Ok(id)
    }

    /// Host-side port that Docker mapped to `container_port`.
    async fn host_port(&self, container_id: &str, container_port: &str) -> Result<u16> {
        let info = self
            .client
            .inspect_container(container_id, None)
            .await
            .context("failed to inspect container")?;

        let port = info
            .network_settings
            .as_ref()
            .and_then(|net| net.ports.as_ref())
            .and_then(|ports| ports.get(container_port))
            .and_then(|bindings| bindings.as_ref())
            .and_then(|bindings| bindings.first())
            .and_then(|binding| binding.host_port.as_deref())
            .ok_or_else(|| anyhow!("no host port mapped for {container_port}"))?;

        port.parse()
            .with_context(|| format!("invalid mapped port: {port}"))
    }
}

/// Poll until `host:port` accepts a TCP connection or `timeout_secs` elapses.
async fn wait_port_open(host: &str, port: u16, timeout_secs: u64) -> Result<()> {
    let addr = format!("{host}:{port}");
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);

    loop {
        if TcpStream::connect(&addr).is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(anyhow!("timed out waiting for {addr} to accept connections"));
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Hostname the provisioned ports are reachable on, derived from the Docker
/// daemon URL.
///
/// - `unix://...`      → `"127.0.0.1"`
/// - `tcp://HOST:PORT` → `"HOST"`
/// - anything else     → `"127.0.0.1"`
fn reachable_host(url: &str) -> String {
    if url.starts_with("unix://") {
        return "127.0.0.1".to_owned();
    }
    if let Some(rest) = url.strip_prefix("tcp://") {
        return rest
            .split_once(':')
            .map(|(host, _)| host.to_owned())
            .unwrap_or_else(|| rest.to_owned());
    }
    "127.0.0.1".to_owned()
}
