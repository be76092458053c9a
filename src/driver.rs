// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sequences the demonstration: connect, CRUD calls, optional subscriptions.

use std::future::Future;
use std::path::PathBuf;

use k8s_openapi::api::core::v1::Pod;
use kube::{Client, ResourceExt};
use tracing::info;

use crate::client::ResourceClient;
use crate::config::{self, ConnectionEnv};
use crate::constants::{sync, ITEM_NAMESPACE};
use crate::error::Result;
use crate::informer::{ResourceEvent, Subscription};
use crate::types::{Item, ItemSpec};

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// Explicit kubeconfig path from the command line, if any
    pub kubeconfig: Option<PathBuf>,
    /// Register event subscriptions after the CRUD calls
    pub watch: bool,
}

/// Resolve the connection, build a client, and run the demonstration.
/// Errors from any step are fatal; `main` logs them and exits non-zero.
pub async fn run(options: DriverOptions) -> Result<()> {
    let env = ConnectionEnv::from_env();
    info!("kubeconfig flag: {:?}", options.kubeconfig);
    info!("KUBECONFIG: {:?}", env.kubeconfig);
    info!("KUBERNETES_MASTER: {:?}", env.master_url);
    info!("KUBERNETES_SERVICE_HOST: {:?}", env.service_host);
    info!("KUBERNETES_SERVICE_PORT: {:?}", env.service_port);

    let source = config::resolve_source(options.kubeconfig.clone(), &env)?;
    let client = config::connect(&source).await?;
    info!("Connected to Kubernetes cluster");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    run_with_client(client, &options, shutdown).await
}

/// The demonstration proper, parameterized over the connected client and
/// a shutdown future so it can be driven end to end in tests.
pub async fn run_with_client(
    client: Client,
    options: &DriverOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let pods = ResourceClient::<Pod>::all(client.clone());
    let pod_list = pods.list(None).await?;
    info!("{} pods in the cluster", pod_list.items.len());

    let items = ResourceClient::<Item>::namespaced(client.clone(), ITEM_NAMESPACE);
    let created = items
        .create(&Item::new(
            "item1",
            ItemSpec {
                detail: "xyz".to_string(),
            },
        ))
        .await?;
    info!("Created item {}/{}", ITEM_NAMESPACE, created.name_any());

    let item_list = items.list(None).await?;
    info!("{} items in {}", item_list.items.len(), ITEM_NAMESPACE);
    for (index, item) in item_list.items.iter().enumerate() {
        info!(
            "item {}: name={} detail={}",
            index,
            item.name_any(),
            item.spec.detail
        );
    }

    if !options.watch {
        return Ok(());
    }

    let pod_subscription = Subscription::all(client.clone(), log_pod_event);
    let item_subscription = Subscription::namespaced(client, ITEM_NAMESPACE, log_item_event);

    pod_subscription.wait_until_synced(sync::TIMEOUT).await?;
    item_subscription.wait_until_synced(sync::TIMEOUT).await?;
    info!("Local views synced, watching for changes");

    shutdown.await;
    info!("Shutting down subscriptions");
    pod_subscription.stop().await;
    item_subscription.stop().await;
    Ok(())
}

fn log_pod_event(event: ResourceEvent<Pod>) {
    match event {
        ResourceEvent::Added(pod) => {
            info!(
                "Pod added: {}/{}",
                pod.namespace().unwrap_or_default(),
                pod.name_any()
            );
        }
        ResourceEvent::Modified { old, new } => {
            info!(
                "Pod modified: {}/{} -> {}/{}",
                old.namespace().unwrap_or_default(),
                old.name_any(),
                new.namespace().unwrap_or_default(),
                new.name_any()
            );
        }
        ResourceEvent::Deleted(pod) => {
            info!(
                "Pod deleted: {}/{}",
                pod.namespace().unwrap_or_default(),
                pod.name_any()
            );
        }
    }
}

fn log_item_event(event: ResourceEvent<Item>) {
    match event {
        ResourceEvent::Added(item) => {
            info!(
                "Item added: {}/{}",
                item.namespace().unwrap_or_default(),
                item.name_any()
            );
        }
        ResourceEvent::Modified { old, new } => {
            info!(
                "Item modified: {}/{} -> {}/{}",
                old.namespace().unwrap_or_default(),
                old.name_any(),
                new.namespace().unwrap_or_default(),
                new.name_any()
            );
        }
        ResourceEvent::Deleted(item) => {
            info!(
                "Item deleted: {}/{}",
                item.namespace().unwrap_or_default(),
                item.name_any()
            );
        }
    }
}
