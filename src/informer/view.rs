// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client-side replica of server state for one resource type.

use std::collections::HashMap;
use std::sync::Arc;

use kube::runtime::watcher;
use kube::{Resource, ResourceExt};

/// Identifies an object by namespace and name within one resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn from_resource<K: Resource>(resource: &K) -> Self {
        Self {
            namespace: resource.meta().namespace.clone(),
            name: resource.name_any(),
        }
    }
}

/// Change notification delivered to a subscription's handler.
///
/// The payload type is fixed when the subscription is registered, so a
/// handler never has to downcast what it receives.
#[derive(Debug)]
pub enum ResourceEvent<K> {
    Added(Arc<K>),
    Modified { old: Arc<K>, new: Arc<K> },
    Deleted(Arc<K>),
}

/// The most recently observed object per key, populated by an initial
/// list and kept current by a change stream.
///
/// Only the subscription's pump task applies events; everyone else sees
/// the view through the emitted `ResourceEvent`s. When the stream is
/// re-established after a failure, the watcher re-lists and the view
/// diffs the fresh snapshot against what it had, so changes that happened
/// during the gap still surface as events.
pub struct LocalView<K> {
    objects: HashMap<ObjectKey, Arc<K>>,
    pending: Option<HashMap<ObjectKey, Arc<K>>>,
    synced: bool,
}

impl<K> Default for LocalView<K> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            pending: None,
            synced: false,
        }
    }
}

impl<K> LocalView<K>
where
    K: Resource,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the initial list has been fully applied
    pub fn synced(&self) -> bool {
        self.synced
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&Arc<K>> {
        self.objects.get(key)
    }

    /// Apply one watcher event, pushing resulting change notifications
    /// onto `emitted`. Returns true when the event completed an initial
    /// list or a re-list, i.e. the view is synced.
    pub fn apply(
        &mut self,
        event: watcher::Event<K>,
        emitted: &mut Vec<ResourceEvent<K>>,
    ) -> bool {
        match event {
            watcher::Event::Init => {
                self.pending = Some(HashMap::new());
                false
            }
            watcher::Event::InitApply(object) => {
                let object = Arc::new(object);
                let key = ObjectKey::from_resource(object.as_ref());
                self.pending
                    .get_or_insert_with(HashMap::new)
                    .insert(key, object);
                false
            }
            watcher::Event::InitDone => {
                let fresh = self.pending.take().unwrap_or_default();
                self.replace(fresh, emitted);
                self.synced = true;
                true
            }
            watcher::Event::Apply(object) => {
                let object = Arc::new(object);
                let key = ObjectKey::from_resource(object.as_ref());
                match self.objects.insert(key, Arc::clone(&object)) {
                    None => emitted.push(ResourceEvent::Added(object)),
                    Some(old) => {
                        if old.resource_version() != object.resource_version() {
                            emitted.push(ResourceEvent::Modified { old, new: object });
                        }
                    }
                }
                false
            }
            watcher::Event::Delete(object) => {
                let object = Arc::new(object);
                let key = ObjectKey::from_resource(object.as_ref());
                if self.objects.remove(&key).is_some() {
                    emitted.push(ResourceEvent::Deleted(object));
                }
                false
            }
        }
    }

    /// Swap in a freshly listed snapshot, emitting the difference against
    /// the previous view.
    fn replace(
        &mut self,
        fresh: HashMap<ObjectKey, Arc<K>>,
        emitted: &mut Vec<ResourceEvent<K>>,
    ) {
        let mut previous = std::mem::replace(&mut self.objects, fresh);
        for (key, new) in &self.objects {
            match previous.remove(key) {
                None => emitted.push(ResourceEvent::Added(Arc::clone(new))),
                Some(old) => {
                    if old.resource_version() != new.resource_version() {
                        emitted.push(ResourceEvent::Modified {
                            old,
                            new: Arc::clone(new),
                        });
                    }
                }
            }
        }
        for (_, old) in previous {
            emitted.push(ResourceEvent::Deleted(old));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Item, ItemSpec};

    fn item(name: &str, resource_version: &str) -> Item {
        let mut item = Item::new(name, ItemSpec::default());
        item.metadata.namespace = Some("itemns".to_string());
        item.metadata.resource_version = Some(resource_version.to_string());
        item
    }

    fn describe(event: &ResourceEvent<Item>) -> String {
        match event {
            ResourceEvent::Added(object) => format!("added:{}", object.name_any()),
            ResourceEvent::Modified { old, new } => format!(
                "modified:{}:{}->{}",
                new.name_any(),
                old.resource_version().unwrap_or_default(),
                new.resource_version().unwrap_or_default()
            ),
            ResourceEvent::Deleted(object) => format!("deleted:{}", object.name_any()),
        }
    }

    fn apply(
        view: &mut LocalView<Item>,
        event: watcher::Event<Item>,
    ) -> (Vec<String>, bool) {
        let mut emitted = Vec::new();
        let synced = view.apply(event, &mut emitted);
        (emitted.iter().map(describe).collect(), synced)
    }

    #[test]
    fn test_initial_list_populates_and_syncs() {
        let mut view = LocalView::new();
        assert!(!view.synced());

        assert_eq!(apply(&mut view, watcher::Event::Init), (vec![], false));
        assert_eq!(
            apply(&mut view, watcher::Event::InitApply(item("a", "1"))),
            (vec![], false)
        );
        assert_eq!(
            apply(&mut view, watcher::Event::InitApply(item("b", "2"))),
            (vec![], false)
        );

        let (mut events, synced) = apply(&mut view, watcher::Event::InitDone);
        events.sort();
        assert!(synced);
        assert!(view.synced());
        assert_eq!(events, vec!["added:a", "added:b"]);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_incremental_apply_upserts() {
        let mut view = LocalView::new();
        apply(&mut view, watcher::Event::Init);
        apply(&mut view, watcher::Event::InitApply(item("a", "1")));
        apply(&mut view, watcher::Event::InitDone);

        let (events, _) = apply(&mut view, watcher::Event::Apply(item("a", "2")));
        assert_eq!(events, vec!["modified:a:1->2"]);

        let (events, _) = apply(&mut view, watcher::Event::Apply(item("c", "3")));
        assert_eq!(events, vec!["added:c"]);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_unchanged_resource_version_emits_nothing() {
        let mut view = LocalView::new();
        apply(&mut view, watcher::Event::Apply(item("a", "1")));

        let (events, _) = apply(&mut view, watcher::Event::Apply(item("a", "1")));
        assert_eq!(events, Vec::<String>::new());
    }

    #[test]
    fn test_delete_removes_and_emits_exactly_once() {
        let mut view = LocalView::new();
        apply(&mut view, watcher::Event::Apply(item("a", "1")));

        let (events, _) = apply(&mut view, watcher::Event::Delete(item("a", "1")));
        assert_eq!(events, vec!["deleted:a"]);
        assert!(view.is_empty());

        let (events, _) = apply(&mut view, watcher::Event::Delete(item("a", "1")));
        assert_eq!(events, Vec::<String>::new());
    }

    #[test]
    fn test_relist_diff_surfaces_the_gap() {
        let mut view = LocalView::new();
        apply(&mut view, watcher::Event::Init);
        apply(&mut view, watcher::Event::InitApply(item("a", "1")));
        apply(&mut view, watcher::Event::InitApply(item("b", "1")));
        apply(&mut view, watcher::Event::InitDone);

        // The stream dropped; the re-list shows a changed, b gone, c new.
        apply(&mut view, watcher::Event::Init);
        apply(&mut view, watcher::Event::InitApply(item("a", "2")));
        apply(&mut view, watcher::Event::InitApply(item("c", "1")));
        let (mut events, synced) = apply(&mut view, watcher::Event::InitDone);
        events.sort();

        assert!(synced);
        assert_eq!(events, vec!["added:c", "deleted:b", "modified:a:1->2"]);
        assert_eq!(view.len(), 2);
        assert!(view
            .get(&ObjectKey {
                namespace: Some("itemns".to_string()),
                name: "c".to_string()
            })
            .is_some());
    }
}
