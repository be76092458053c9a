// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Informer-style subscriptions: a local view kept current by list-then-watch.

pub mod subscription;
pub mod view;

pub use subscription::{Subscription, SyncState};
pub use view::{LocalView, ObjectKey, ResourceEvent};
