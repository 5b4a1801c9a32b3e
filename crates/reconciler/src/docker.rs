//! Docker API abstraction for testability.
//!
//! The [`DockerClient`] trait covers exactly the runtime calls the reconciler
//! needs. Production code uses [`BollardDockerClient`]; unit tests use
//! `MockDockerClient`, a stateful in-memory runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────┐
//! │ Reconciler / Provisioner / Watcher│
//! └─────────────────┬─────────────────┘
//!                   │
//!                   ▼
//!            ┌─────────────┐
//!            │DockerClient │ (trait)
//!            └─────────────┘
//!                 │     │
//!                 ▼     ▼
//!            ┌───────┐ ┌────┐
//!            │Bollard│ │Mock│
//!            └───┬───┘ └────┘
//!                │
//!                ▼
//!          Docker Daemon
//! ```
//!
//! # Handle Validation
//!
//! Every container handle and network name is validated before it reaches
//! the API:
//! - 1-255 characters
//! - ASCII alphanumerics plus `_`, `.` and `-`
//! - first character alphanumeric

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use autonet_core::types::{ContainerDetails, ContainerRef, normalize_name};
use bollard::models::EventMessage;
use futures_util::{Stream, StreamExt};

use crate::error::ReconcileError;
use crate::event::{LifecycleEvent, LifecycleStatus};

const MAX_NAME_LEN: usize = 255;

/// Validates a container handle or network name before an API call.
pub fn validate_name(kind: &str, value: &str) -> Result<(), ReconcileError> {
    if value.is_empty() || value.len() > MAX_NAME_LEN {
        return Err(ReconcileError::DockerApi(format!(
            "invalid {kind} '{value}': length {} (must be 1-{MAX_NAME_LEN})",
            value.len()
        )));
    }
    let mut chars = value.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !first_ok || !rest_ok {
        return Err(ReconcileError::DockerApi(format!(
            "invalid {kind} '{value}': must match [A-Za-z0-9][A-Za-z0-9_.-]*"
        )));
    }
    Ok(())
}

/// Trait abstracting Docker API operations.
///
/// The trait is `Send + Sync + 'static`, allowing the client to be shared
/// across the watcher, dispatcher and rescan tasks behind an `Arc`.
///
/// # Error Handling
///
/// - **404 on inspect**: `ReconcileError::ContainerNotFound`
/// - **Connection errors**: `ReconcileError::DockerConnection`
/// - **connect/disconnect failures**: `ReconcileError::Mutation`
/// - **network creation failures**: `ReconcileError::Provision`
pub trait DockerClient: Send + Sync + 'static {
    /// Lists containers, optionally only running ones.
    fn list_containers(
        &self,
        running_only: bool,
    ) -> impl Future<Output = Result<Vec<ContainerRef>, ReconcileError>> + Send;

    /// Reads a container's labels, network mode and attached networks.
    ///
    /// # Errors
    ///
    /// - `ReconcileError::ContainerNotFound`: container does not exist (404)
    /// - `ReconcileError::DockerApi`: invalid handle or other API errors
    fn inspect_container(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<ContainerDetails, ReconcileError>> + Send;

    /// Checks whether a network with this name exists.
    fn network_exists(
        &self,
        network: &str,
    ) -> impl Future<Output = Result<bool, ReconcileError>> + Send;

    /// Creates a network with default driver settings.
    fn create_network(
        &self,
        network: &str,
    ) -> impl Future<Output = Result<(), ReconcileError>> + Send;

    /// Connects a container to a network under the given alias.
    fn connect_network(
        &self,
        network: &str,
        container: &str,
        alias: &str,
    ) -> impl Future<Output = Result<(), ReconcileError>> + Send;

    /// Disconnects a container from a network (not forced).
    fn disconnect_network(
        &self,
        network: &str,
        container: &str,
    ) -> impl Future<Output = Result<(), ReconcileError>> + Send;

    /// Subscribes to container lifecycle events.
    ///
    /// The stream is lazy and ends when the daemon closes the connection.
    fn events(&self) -> impl Stream<Item = Result<LifecycleEvent, ReconcileError>> + Send + '_;

    /// Checks Docker daemon connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), ReconcileError>> + Send;
}

/// Production Docker client implementation using `bollard`.
///
/// Internally uses `Arc<bollard::Docker>` for sharing across async tasks.
///
/// # Connection Management
///
/// - Request timeout: 120 seconds
/// - API version: default (negotiated by bollard)
/// - Socket path: configurable, else bollard's local defaults (honours `DOCKER_HOST`)
pub struct BollardDockerClient {
    docker: Arc<bollard::Docker>,
}

impl BollardDockerClient {
    /// Connects to Docker using the platform's local defaults.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::DockerConnection` if the client cannot be built.
    pub fn connect_local() -> Result<Self, ReconcileError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            ReconcileError::DockerConnection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects to Docker using a specific socket path.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, ReconcileError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    ReconcileError::DockerConnection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects with an explicit socket when given, else local defaults.
    pub fn connect(socket_path: Option<&str>) -> Result<Self, ReconcileError> {
        match socket_path {
            Some(path) => Self::connect_with_socket(path),
            None => Self::connect_local(),
        }
    }
}

fn status_code(err: &bollard::errors::Error) -> Option<u16> {
    match err {
        bollard::errors::Error::DockerResponseServerError { status_code, .. } => {
            Some(*status_code)
        }
        _ => None,
    }
}

impl DockerClient for BollardDockerClient {
    async fn list_containers(&self, running_only: bool) -> Result<Vec<ContainerRef>, ReconcileError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all: !running_only,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| ReconcileError::DockerApi(format!("list containers failed: {e}")))?;

        let result = containers
            .into_iter()
            .map(|container| {
                let id = container.id.unwrap_or_default();
                let name = container
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                ContainerRef::new(id, name)
            })
            .collect();

        Ok(result)
    }

    async fn inspect_container(&self, handle: &str) -> Result<ContainerDetails, ReconcileError> {
        validate_name("container handle", handle)?;

        let details = self
            .docker
            .inspect_container(handle, None)
            .await
            .map_err(|e| match status_code(&e) {
                Some(404) => ReconcileError::ContainerNotFound(handle.to_owned()),
                _ => ReconcileError::DockerApi(format!("inspect container '{handle}' failed: {e}")),
            })?;

        let labels = details
            .config
            .and_then(|c| c.labels)
            .unwrap_or_default();
        let network_mode = details.host_config.and_then(|h| h.network_mode);
        let networks = details
            .network_settings
            .and_then(|n| n.networks)
            .map(|networks| networks.into_keys().collect())
            .unwrap_or_default();

        Ok(ContainerDetails {
            id: details.id.unwrap_or_default(),
            name: details.name.map(|n| normalize_name(&n)).unwrap_or_default(),
            labels,
            network_mode,
            networks,
        })
    }

    async fn network_exists(&self, network: &str) -> Result<bool, ReconcileError> {
        use bollard::network::InspectNetworkOptions;

        validate_name("network name", network)?;

        match self
            .docker
            .inspect_network(network, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if status_code(&e) == Some(404) => Ok(false),
            Err(e) => Err(ReconcileError::DockerApi(format!(
                "inspect network '{network}' failed: {e}"
            ))),
        }
    }

    async fn create_network(&self, network: &str) -> Result<(), ReconcileError> {
        use bollard::network::CreateNetworkOptions;

        validate_name("network name", network)?;

        let options = CreateNetworkOptions {
            name: network.to_owned(),
            ..Default::default()
        };

        match self.docker.create_network(options).await {
            Ok(_) => Ok(()),
            // created concurrently by someone else
            Err(e) if status_code(&e) == Some(409) => Ok(()),
            Err(e) => Err(ReconcileError::Provision {
                network: network.to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    async fn connect_network(
        &self,
        network: &str,
        container: &str,
        alias: &str,
    ) -> Result<(), ReconcileError> {
        use bollard::models::EndpointSettings;
        use bollard::network::ConnectNetworkOptions;

        validate_name("network name", network)?;
        validate_name("container handle", container)?;

        let options = ConnectNetworkOptions {
            container: container.to_owned(),
            endpoint_config: EndpointSettings {
                aliases: Some(vec![alias.to_owned()]),
                ..Default::default()
            },
        };

        self.docker
            .connect_network(network, options)
            .await
            .map_err(|e| ReconcileError::Mutation {
                container: container.to_owned(),
                network: network.to_owned(),
                reason: format!("connect failed: {e}"),
            })
    }

    async fn disconnect_network(&self, network: &str, container: &str) -> Result<(), ReconcileError> {
        use bollard::network::DisconnectNetworkOptions;

        validate_name("network name", network)?;
        validate_name("container handle", container)?;

        self.docker
            .disconnect_network(
                network,
                DisconnectNetworkOptions {
                    container: container.to_owned(),
                    force: false,
                },
            )
            .await
            .map_err(|e| ReconcileError::Mutation {
                container: container.to_owned(),
                network: network.to_owned(),
                reason: format!("disconnect failed: {e}"),
            })
    }

    fn events(&self) -> impl Stream<Item = Result<LifecycleEvent, ReconcileError>> + Send + '_ {
        use bollard::system::EventsOptions;

        let mut filters = HashMap::new();
        filters.insert("type".to_owned(), vec!["container".to_owned()]);
        filters.insert(
            "event".to_owned(),
            vec!["start".to_owned(), "update".to_owned()],
        );

        let options = EventsOptions::<String> {
            filters,
            ..Default::default()
        };

        self.docker.events(Some(options)).map(|message| {
            message
                .map(lifecycle_event)
                .map_err(|e| ReconcileError::Stream(format!("event stream failed: {e}")))
        })
    }

    async fn ping(&self) -> Result<(), ReconcileError> {
        self.docker
            .ping()
            .await
            .map_err(|e| ReconcileError::DockerConnection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// Maps a raw Docker event to a [`LifecycleEvent`].
///
/// The container name comes from the actor's `name` attribute. When it is
/// missing the name stays empty and the event's handle falls back to the id.
pub fn lifecycle_event(message: EventMessage) -> LifecycleEvent {
    let status = LifecycleStatus::from_action(message.action.as_deref().unwrap_or_default());
    let actor = message.actor.unwrap_or_default();
    let container_name = actor
        .attributes
        .as_ref()
        .and_then(|attrs| attrs.get("name").cloned())
        .unwrap_or_default();
    LifecycleEvent::new(status, actor.id.unwrap_or_default(), container_name)
}

#[cfg(test)]
pub use mock::{MockCall, MockDockerClient};
