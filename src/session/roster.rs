//! Roster membership: the only shared state with contention-safe
//! read-modify-write. Join and leave go through the store's single-path
//! transaction; everything else in the session is last-write-wins.

use super::{profile, SessionClient};
use crate::types::*;
use serde_json::Value;
use std::sync::Arc;

impl SessionClient {
    /// Join the session under a player name.
    ///
    /// The transaction appends the trimmed name iff it is not already on the
    /// roster, so concurrent joins can never insert a duplicate. The name is
    /// remembered locally for auto-rejoin. An empty name is a silent no-op,
    /// as is a name containing a path separator (it would corrupt the
    /// per-player stats path).
    pub async fn join(&self, name: &str) {
        let name = name.trim().to_string();
        if name.is_empty() || name.contains('/') {
            return;
        }

        let result = self
            .store
            .transact(&self.paths.players(), &mut |current| {
                let mut list = match decode::<Vec<PlayerName>>(&current) {
                    Decoded::Present(list) => list,
                    Decoded::Absent | Decoded::Malformed => Vec::new(),
                };
                if !list.contains(&name) {
                    list.push(name.clone());
                }
                Value::Array(list.into_iter().map(Value::String).collect())
            })
            .await;

        match result {
            Ok(_) => {
                *self.user_name.write().await = Some(name.clone());
                if let Err(e) = profile::remember(&self.name_file, &name) {
                    tracing::warn!("Failed to remember player name: {}", e);
                }
                tracing::info!("Joined session as {}", name);
            }
            Err(e) => tracing::warn!("Join failed: {}", e),
        }
    }

    /// Remove a player (any client may remove any player). The removed
    /// client notices via auto-leave detection on its next roster snapshot.
    pub async fn remove_player(&self, name: &str) {
        let name = name.to_string();
        let result = self
            .store
            .transact(&self.paths.players(), &mut |current| {
                let mut list = match decode::<Vec<PlayerName>>(&current) {
                    Decoded::Present(list) => list,
                    Decoded::Absent | Decoded::Malformed => Vec::new(),
                };
                list.retain(|n| n != &name);
                Value::Array(list.into_iter().map(Value::String).collect())
            })
            .await;

        match result {
            Ok(_) => tracing::info!("Removed player {}", name),
            Err(e) => tracing::warn!("Remove failed: {}", e),
        }
    }

    /// React to a pushed roster snapshot: refresh the cache, emit join
    /// notifications for the membership diff, and detect forced removal of
    /// the local player.
    pub(super) async fn apply_roster_snapshot(self: &Arc<Self>, snapshot: Value) {
        let list = match decode::<Vec<PlayerName>>(&snapshot) {
            Decoded::Present(list) => list,
            Decoded::Absent => Vec::new(),
            Decoded::Malformed => {
                tracing::warn!("Malformed roster snapshot, treating as empty");
                Vec::new()
            }
        };

        let previous = {
            let mut roster = self.roster.write().await;
            std::mem::replace(&mut *roster, list.clone())
        };

        // Diff by membership, not order
        let mut enqueued = false;
        {
            let mut queue = self.notifications.write().await;
            for name in &list {
                if !previous.contains(name) {
                    queue.push_back(Notification::joined(name));
                    enqueued = true;
                }
            }
        }
        if enqueued {
            self.ensure_drain_running().await;
        }

        // Auto-leave: another client removed us
        let remembered = self.user_name.read().await.clone();
        if let Some(me) = remembered {
            if !list.contains(&me) {
                tracing::info!("Player {} no longer on roster, clearing local join", me);
                *self.user_name.write().await = None;
                profile::forget(&self.name_file);
            }
        }
    }
}
