// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::env;
use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use tracing::debug;

use crate::error::{ItemwatchError, Result};

/// Environment indicators consulted when resolving how to reach the API server
#[derive(Debug, Clone, Default)]
pub struct ConnectionEnv {
    pub kubeconfig: Option<String>,
    pub master_url: Option<String>,
    pub service_host: Option<String>,
    pub service_port: Option<String>,
}

impl ConnectionEnv {
    /// Snapshot the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self {
            kubeconfig: read_var("KUBECONFIG"),
            master_url: read_var("KUBERNETES_MASTER"),
            service_host: read_var("KUBERNETES_SERVICE_HOST"),
            service_port: read_var("KUBERNETES_SERVICE_PORT"),
        }
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// How the connection to the API server is established
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSource {
    /// Read endpoint and credentials from a kubeconfig file
    Kubeconfig(PathBuf),
    /// Use the service account environment mounted into the pod
    InCluster,
}

/// Pick the connection source. An explicit path wins over the KUBECONFIG
/// environment variable, which wins over the in-cluster service variables.
/// KUBERNETES_MASTER is inspected by the driver for logging but never
/// selects a source on its own.
pub fn resolve_source(explicit: Option<PathBuf>, env: &ConnectionEnv) -> Result<ConnectionSource> {
    if let Some(path) = explicit {
        return Ok(ConnectionSource::Kubeconfig(path));
    }
    if let Some(path) = &env.kubeconfig {
        return Ok(ConnectionSource::Kubeconfig(PathBuf::from(path)));
    }
    if env.service_host.is_some() && env.service_port.is_some() {
        return Ok(ConnectionSource::InCluster);
    }
    Err(ItemwatchError::Configuration(
        "no kubeconfig path given and no in-cluster service environment found".to_string(),
    ))
}

/// Build a client for the resolved source
pub async fn connect(source: &ConnectionSource) -> Result<Client> {
    let config = match source {
        ConnectionSource::Kubeconfig(path) => {
            debug!("Loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                ItemwatchError::Configuration(format!(
                    "failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;
            KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    ItemwatchError::Configuration(format!(
                        "invalid kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?
        }
        ConnectionSource::InCluster => KConfig::incluster().map_err(|e| {
            ItemwatchError::Configuration(format!("in-cluster configuration unavailable: {}", e))
        })?,
    };

    Client::try_from(config)
        .map_err(|e| ItemwatchError::Configuration(format!("failed to create client: {}", e)))
}
