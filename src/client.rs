// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed CRUD access to one resource type in one scope.

use std::fmt::Debug;

use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::core::{NamespaceResourceScope, ObjectList};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ItemwatchError, Result};

/// Synchronous-style CRUD calls against a named resource type.
///
/// Every call blocks the caller until the server responds or the client
/// times out, and surfaces failures through the crate error taxonomy.
/// Nothing here touches a subscription's local view; writes always go to
/// the server.
pub struct ResourceClient<K> {
    api: Api<K>,
}

impl<K> ResourceClient<K>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    /// Client scoped to a single namespace
    pub fn namespaced(client: Client, namespace: &str) -> Self
    where
        K: Resource<Scope = NamespaceResourceScope>,
    {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }

    /// Client spanning all namespaces
    pub fn all(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    pub async fn create(&self, object: &K) -> Result<K> {
        Ok(self.api.create(&PostParams::default(), object).await?)
    }

    pub async fn get(&self, name: &str) -> Result<K> {
        Ok(self.api.get(name).await?)
    }

    /// List objects, optionally narrowed by a label selector
    pub async fn list(&self, selector: Option<&str>) -> Result<ObjectList<K>> {
        let mut params = ListParams::default();
        if let Some(selector) = selector {
            params = params.labels(selector);
        }
        Ok(self.api.list(&params).await?)
    }

    /// Replace an object on the server.
    ///
    /// The object must carry the resource version from the last read; a
    /// stale version yields `ItemwatchError::Conflict` and it is up to the
    /// caller to re-fetch and retry.
    pub async fn update(&self, object: &K) -> Result<K> {
        let meta = object.meta();
        let name = meta
            .name
            .clone()
            .ok_or_else(|| ItemwatchError::Invalid("object has no name".to_string()))?;
        if meta.resource_version.is_none() {
            return Err(ItemwatchError::Invalid(format!(
                "update of {} requires the last observed resource version",
                name
            )));
        }
        Ok(self.api.replace(&name, &PostParams::default(), object).await?)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let _ = self.api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }
}
