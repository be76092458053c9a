// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Namespace the Item demonstration objects live in
pub const ITEM_NAMESPACE: &str = "itemns";

/// Subscription timing configuration
pub mod sync {
    use std::time::Duration;

    /// Maximum time to wait for a subscription's initial list to be applied
    pub const TIMEOUT: Duration = Duration::from_secs(60);
}
