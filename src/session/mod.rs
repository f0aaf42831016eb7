//! Session synchronization: bridges the pure engine and the shared store.
//!
//! Every client holds a read-through cache of the persisted session state
//! (roster, cup board, stats), kept fresh by one watcher task per store
//! subscription. Teams, turn pointer, active question, category filter and
//! feedback are client-local view state and are not synchronized; see
//! DESIGN.md for that choice.

mod profile;
mod roster;
mod turn;

use crate::questions::QuestionBank;
use crate::store::{SharedStore, StoreResult};
use crate::types::*;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// How long answer feedback and the resolved question stay on screen
pub const ANSWER_DISPLAY_DELAY: Duration = Duration::from_secs(2);
/// How long each join notification lives before the queue drains it
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Store key paths for one session
#[derive(Debug, Clone)]
pub struct SessionPaths {
    session_id: String,
}

impl SessionPaths {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    pub fn players(&self) -> String {
        format!("games/{}/players", self.session_id)
    }

    pub fn cups(&self) -> String {
        format!("games/{}/cups", self.session_id)
    }

    pub fn stats(&self) -> String {
        format!("games/{}/stats", self.session_id)
    }

    pub fn player_stats(&self, name: &str) -> String {
        format!("games/{}/stats/{}", self.session_id, name)
    }
}

/// One client's view of a shared game session
pub struct SessionClient {
    store: Arc<dyn SharedStore>,
    paths: SessionPaths,
    bank: QuestionBank,
    name_file: PathBuf,

    // read-through caches of store-owned state
    roster: RwLock<Vec<PlayerName>>,
    cups: RwLock<CupBoard>,
    stats: RwLock<HashMap<PlayerName, PlayerStats>>,

    // client-local ephemeral view state
    user_name: RwLock<Option<PlayerName>>,
    teams: RwLock<Option<Teams>>,
    turn_index: RwLock<usize>,
    category: RwLock<Option<Category>>,
    active_question: RwLock<Option<ActiveQuestion>>,
    feedback: RwLock<Option<Feedback>>,
    notifications: RwLock<VecDeque<Notification>>,

    // cancelable scheduled work
    watchers: Mutex<Vec<JoinHandle<()>>>,
    drain_task: Mutex<Option<JoinHandle<()>>>,
    clear_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionClient {
    /// Connect to a session: recall the locally remembered player name,
    /// subscribe to the session paths and start the watcher tasks.
    pub async fn connect(
        store: Arc<dyn SharedStore>,
        session_id: impl Into<String>,
        bank: QuestionBank,
        name_file: PathBuf,
    ) -> StoreResult<Arc<Self>> {
        let client = Arc::new(Self {
            store,
            paths: SessionPaths::new(session_id),
            bank,
            name_file,
            roster: RwLock::new(Vec::new()),
            cups: RwLock::new(fresh_board()),
            stats: RwLock::new(HashMap::new()),
            user_name: RwLock::new(None),
            teams: RwLock::new(None),
            turn_index: RwLock::new(0),
            category: RwLock::new(None),
            active_question: RwLock::new(None),
            feedback: RwLock::new(None),
            notifications: RwLock::new(VecDeque::new()),
            watchers: Mutex::new(Vec::new()),
            drain_task: Mutex::new(None),
            clear_task: Mutex::new(None),
        });

        if let Some(name) = profile::recall(&client.name_file) {
            tracing::info!("Rejoining as remembered player {}", name);
            *client.user_name.write().await = Some(name);
        }

        client.spawn_watchers().await?;
        Ok(client)
    }

    async fn spawn_watchers(self: &Arc<Self>) -> StoreResult<()> {
        let mut roster_rx = self.store.subscribe(&self.paths.players()).await?;
        let mut cups_rx = self.store.subscribe(&self.paths.cups()).await?;
        let mut stats_rx = self.store.subscribe(&self.paths.stats()).await?;

        let mut watchers = self.watchers.lock().await;

        let weak = Arc::downgrade(self);
        watchers.push(tokio::spawn(async move {
            loop {
                let snapshot = roster_rx.borrow_and_update().clone();
                let Some(client) = weak.upgrade() else { break };
                client.apply_roster_snapshot(snapshot).await;
                drop(client);
                if roster_rx.changed().await.is_err() {
                    break;
                }
            }
        }));

        let weak = Arc::downgrade(self);
        watchers.push(tokio::spawn(async move {
            loop {
                let snapshot = cups_rx.borrow_and_update().clone();
                let Some(client) = weak.upgrade() else { break };
                client.apply_cups_snapshot(snapshot).await;
                drop(client);
                if cups_rx.changed().await.is_err() {
                    break;
                }
            }
        }));

        let weak = Arc::downgrade(self);
        watchers.push(tokio::spawn(async move {
            loop {
                let snapshot = stats_rx.borrow_and_update().clone();
                let Some(client) = weak.upgrade() else { break };
                client.apply_stats_snapshot(snapshot).await;
                drop(client);
                if stats_rx.changed().await.is_err() {
                    break;
                }
            }
        }));

        Ok(())
    }

    /// Stop all watcher and timer tasks
    pub async fn shutdown(&self) {
        for handle in self.watchers.lock().await.drain(..) {
            handle.abort();
        }
        if let Some(handle) = self.drain_task.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.clear_task.lock().await.take() {
            handle.abort();
        }
    }

    // =========================================================================
    // Snapshot handlers
    // =========================================================================

    async fn apply_cups_snapshot(&self, snapshot: Value) {
        match decode_cups(&snapshot) {
            Decoded::Present(cups) => *self.cups.write().await = cups,
            Decoded::Absent => self.initialize_cups().await,
            Decoded::Malformed => {
                tracing::warn!("Malformed cup board snapshot, reinitializing");
                self.initialize_cups().await;
            }
        }
    }

    /// Write the all-active board. Racing initializers converge because every
    /// writer produces the identical array.
    async fn initialize_cups(&self) {
        if let Err(e) = self.store.set(&self.paths.cups(), json!(fresh_board())).await {
            tracing::warn!("Cup board initialization failed: {}", e);
        }
    }

    async fn apply_stats_snapshot(&self, snapshot: Value) {
        let map = match decode::<HashMap<PlayerName, PlayerStats>>(&snapshot) {
            Decoded::Present(map) => map,
            Decoded::Absent => HashMap::new(),
            Decoded::Malformed => {
                tracing::warn!("Malformed stats snapshot, treating as empty");
                HashMap::new()
            }
        };
        *self.stats.write().await = map;
    }

    // =========================================================================
    // Read accessors (most recent snapshot; staleness is bounded by
    // subscription latency only)
    // =========================================================================

    pub async fn roster(&self) -> Vec<PlayerName> {
        self.roster.read().await.clone()
    }

    pub async fn cups(&self) -> CupBoard {
        self.cups.read().await.clone()
    }

    /// A player's stats, lazily defaulted to zeros when absent
    pub async fn stats(&self, name: &str) -> PlayerStats {
        self.stats
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn stats_map(&self) -> HashMap<PlayerName, PlayerStats> {
        self.stats.read().await.clone()
    }

    pub async fn user_name(&self) -> Option<PlayerName> {
        self.user_name.read().await.clone()
    }

    pub async fn teams(&self) -> Option<Teams> {
        self.teams.read().await.clone()
    }

    pub async fn turn_index(&self) -> usize {
        *self.turn_index.read().await
    }

    /// The player whose turn it is, per the explicit turn pointer
    pub async fn current_player(&self) -> Option<PlayerName> {
        let index = *self.turn_index.read().await;
        self.roster.read().await.get(index).cloned()
    }

    pub async fn category(&self) -> Option<Category> {
        *self.category.read().await
    }

    pub async fn active_question(&self) -> Option<ActiveQuestion> {
        self.active_question.read().await.clone()
    }

    pub async fn feedback(&self) -> Option<Feedback> {
        self.feedback.read().await.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.iter().cloned().collect()
    }

    // =========================================================================
    // Scheduled work
    // =========================================================================

    /// Start the FIFO notification drain if it is not already running:
    /// one entry expires per [`NOTIFICATION_TTL`] until the queue is empty.
    async fn ensure_drain_running(self: &Arc<Self>) {
        let mut guard = self.drain_task.lock().await;
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(self);
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(NOTIFICATION_TTL).await;
                let Some(client) = weak.upgrade() else { break };
                let mut queue = client.notifications.write().await;
                queue.pop_front();
                if queue.is_empty() {
                    break;
                }
            }
        }));
    }

    /// Clear the resolved question and feedback after the display delay.
    /// A newer resolution replaces a pending clear rather than stacking.
    async fn schedule_display_clear(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ANSWER_DISPLAY_DELAY).await;
            if let Some(client) = weak.upgrade() {
                *client.active_question.write().await = None;
                *client.feedback.write().await = None;
            }
        });
        if let Some(previous) = self.clear_task.lock().await.replace(handle) {
            previous.abort();
        }
    }
}
