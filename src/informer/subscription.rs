// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Long-lived watch subscriptions feeding event handlers.

use std::fmt::Debug;
use std::time::Duration;

use futures::StreamExt;
use kube::api::Api;
use kube::core::NamespaceResourceScope;
use kube::{Client, Resource};
use kube_runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ItemwatchError, Result};
use crate::informer::view::{LocalView, ResourceEvent};

/// Where a subscription stands with respect to its initial list.
///
/// A subscription starts out `Syncing` and becomes `Synced` once the
/// initial list has been fully applied to the local view. The state is
/// monotonic: a later re-list does not take it back to `Syncing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Syncing,
    Synced,
}

/// Handle to a running subscription for one resource type.
///
/// The subscription owns a background task that consumes the watch
/// stream, maintains the local view, and invokes the registered handler.
/// Handlers run on that task, so events for one resource type arrive in
/// the order the server emitted them. Dropping the handle leaves the
/// task running for the process lifetime; call [`Subscription::stop`]
/// to cancel it.
pub struct Subscription {
    state_rx: watch::Receiver<SyncState>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Subscribe to objects of type `K` in one namespace
    pub fn namespaced<K, F>(client: Client, namespace: &str, handler: F) -> Self
    where
        K: Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static,
        K::DynamicType: Default,
        F: FnMut(ResourceEvent<K>) + Send + 'static,
    {
        Self::start(Api::namespaced(client, namespace), handler)
    }

    /// Subscribe to objects of type `K` across all namespaces
    pub fn all<K, F>(client: Client, handler: F) -> Self
    where
        K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
        K::DynamicType: Default,
        F: FnMut(ResourceEvent<K>) + Send + 'static,
    {
        Self::start(Api::all(client), handler)
    }

    fn start<K, F>(api: Api<K>, mut handler: F) -> Self
    where
        K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
        F: FnMut(ResourceEvent<K>) + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(SyncState::Syncing);
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            // The watcher re-lists whenever the stream breaks, so a gap in
            // the change stream always surfaces as a fresh snapshot that
            // the view diffs against its previous contents.
            let mut stream = watcher(api, watcher::Config::default())
                .default_backoff()
                .boxed();
            let mut view = LocalView::new();
            let mut emitted = Vec::new();

            loop {
                let event = tokio::select! {
                    _ = task_token.cancelled() => break,
                    next = stream.next() => match next {
                        Some(Ok(event)) => event,
                        Some(Err(error)) => {
                            warn!("Watch stream error, resynchronizing: {}", error);
                            continue;
                        }
                        None => break,
                    },
                };

                if view.apply(event, &mut emitted) {
                    state_tx.send_replace(SyncState::Synced);
                }
                for event in emitted.drain(..) {
                    handler(event);
                }
            }

            debug!("Subscription task stopped");
        });

        Self {
            state_rx,
            token,
            task,
        }
    }

    /// Current sync state of the local view
    pub fn state(&self) -> SyncState {
        *self.state_rx.borrow()
    }

    /// Block until the initial list has been fully applied.
    ///
    /// Fails with `Unavailable` when the timeout elapses first or when
    /// the background task has terminated without ever syncing.
    pub async fn wait_until_synced(&self, timeout: Duration) -> Result<()> {
        let mut state = self.state_rx.clone();
        let result = match tokio::time::timeout(timeout, state.wait_for(|s| *s == SyncState::Synced)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(ItemwatchError::Unavailable(
                "subscription task terminated before syncing".to_string(),
            )),
            Err(_) => Err(ItemwatchError::Unavailable(format!(
                "local view not synced within {}s",
                timeout.as_secs()
            ))),
        };
        result
    }

    /// Cancel the background task and wait for it to release the stream
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(error) = self.task.await {
            debug!("Subscription task join failed: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        item_list_json, item_value, status_json, watch_event_json, MockService,
    };
    use crate::types::Item;
    use kube::ResourceExt;
    use tokio::sync::mpsc;

    const ITEMS_PATH: &str = "/apis/itemresource.dev/v1/namespaces/itemns/items";

    fn describe(event: &ResourceEvent<Item>) -> String {
        match event {
            ResourceEvent::Added(object) => format!("added:{}", object.name_any()),
            ResourceEvent::Modified { new, .. } => format!("modified:{}", new.name_any()),
            ResourceEvent::Deleted(object) => format!("deleted:{}", object.name_any()),
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no event within 10s")
            .expect("event channel closed")
    }

    fn subscribe(client: Client) -> (Subscription, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription::namespaced::<Item, _>(client, "itemns", move |event| {
            let _ = tx.send(describe(&event));
        });
        (subscription, rx)
    }

    #[tokio::test]
    async fn test_syncs_and_delivers_watch_events_in_order() {
        let client = MockService::new()
            .on_get(
                ITEMS_PATH,
                200,
                &item_list_json("10", &[item_value("item1", "itemns", "1", "xyz")]),
            )
            .on_watch(
                ITEMS_PATH,
                200,
                &format!(
                    "{}{}",
                    watch_event_json("ADDED", item_value("item2", "itemns", "11", "abc")),
                    watch_event_json("DELETED", item_value("item2", "itemns", "12", "abc")),
                ),
            )
            .on_watch(ITEMS_PATH, 200, "")
            .into_client();

        let (subscription, mut rx) = subscribe(client);
        subscription
            .wait_until_synced(Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(subscription.state(), SyncState::Synced);

        assert_eq!(next(&mut rx).await, "added:item1");
        assert_eq!(next(&mut rx).await, "added:item2");
        assert_eq!(next(&mut rx).await, "deleted:item2");

        subscription.stop().await;
    }

    #[tokio::test]
    async fn test_relists_after_losing_the_stream() {
        let client = MockService::new()
            .on_get(
                ITEMS_PATH,
                200,
                &item_list_json("10", &[item_value("item1", "itemns", "1", "xyz")]),
            )
            .on_get(
                ITEMS_PATH,
                200,
                &item_list_json(
                    "20",
                    &[
                        item_value("item1", "itemns", "1", "xyz"),
                        item_value("item3", "itemns", "15", "new"),
                    ],
                ),
            )
            // A watch desync ("too old resource version") is delivered by
            // the apiserver as an in-stream ERROR event, which is what
            // drives the kube watcher to re-list; a transport-level 410
            // would merely be retried in place.
            .on_watch(
                ITEMS_PATH,
                200,
                &watch_event_json(
                    "ERROR",
                    serde_json::json!({
                        "kind": "Status",
                        "apiVersion": "v1",
                        "status": "Failure",
                        "message": "too old resource version",
                        "reason": "Expired",
                        "code": 410
                    }),
                ),
            )
            .on_watch(ITEMS_PATH, 200, "")
            .into_client();

        let (subscription, mut rx) = subscribe(client);
        subscription
            .wait_until_synced(Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(next(&mut rx).await, "added:item1");
        // The watch is gone; the re-list carries the object added during
        // the gap, item1 is unchanged and emits nothing again.
        assert_eq!(next(&mut rx).await, "added:item3");
        assert_eq!(subscription.state(), SyncState::Synced);

        subscription.stop().await;
    }

    #[tokio::test]
    async fn test_wait_times_out_while_the_list_keeps_failing() {
        let client = MockService::new()
            .on_get(
                ITEMS_PATH,
                500,
                &status_json(500, "InternalError", "etcd is on fire"),
            )
            .into_client();

        let (subscription, _rx) = subscribe(client);
        let result = subscription
            .wait_until_synced(Duration::from_millis(200))
            .await;

        assert!(matches!(result, Err(ItemwatchError::Unavailable(_))));
        assert_eq!(subscription.state(), SyncState::Syncing);

        subscription.stop().await;
    }

    #[tokio::test]
    async fn test_stop_cancels_the_background_task() {
        let client = MockService::new()
            .on_get(ITEMS_PATH, 200, &item_list_json("10", &[]))
            .on_watch(ITEMS_PATH, 200, "")
            .into_client();

        let (subscription, _rx) = subscribe(client);
        subscription
            .wait_until_synced(Duration::from_secs(10))
            .await
            .unwrap();

        // stop() joins the pump task; returning at all proves cancellation.
        subscription.stop().await;
    }
}
