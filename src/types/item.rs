// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A named, namespaced entity carrying a single free-form detail string.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "itemresource.dev", version = "v1", kind = "Item")]
#[kube(namespaced)]
pub struct ItemSpec {
    #[serde(default)]
    pub detail: String,
}
