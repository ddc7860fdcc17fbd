// ── Session facade ──
//
// The surface hosts program against: one `Session` per account, wrapping the
// authenticated API client and the latest pairing snapshot. The snapshot is
// replaced as a whole on every successful refresh and published through a
// `watch` channel, so readers never see a half-updated door list.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use fermly_api::{AccessId, ApiClient, AuthState, Pairing, TokenState};

use crate::config::SessionConfig;
use crate::convert::{home_info, map_doors};
use crate::error::CoreError;
use crate::model::{Door, HomeInfo};

// ── DeviceSnapshot ───────────────────────────────────────────────────

/// Result of one pairing refresh.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    pub pairings: Vec<Pairing>,
    pub doors: Vec<Door>,
    pub home: HomeInfo,
    /// `None` until the first successful refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    fn from_pairings(pairings: Vec<Pairing>, requested_at: DateTime<Utc>) -> Self {
        Self {
            doors: map_doors(&pairings),
            home: home_info(&pairings),
            pairings,
            refreshed_at: Some(requested_at),
        }
    }

    pub fn door(&self, door_id: &str) -> Option<&Door> {
        self.doors.iter().find(|d| d.id == door_id)
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Authenticated session for one Fermax Blue account.
///
/// Cheaply cloneable. No background tasks are started; hosts decide when to
/// call [`refresh()`](Self::refresh).
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    snapshot: watch::Sender<Arc<DeviceSnapshot>>,
}

impl Session {
    /// Build a session. Does not touch the network; call
    /// [`connect()`](Self::connect) or [`authenticate()`](Self::authenticate).
    pub fn new(config: &SessionConfig) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.credentials(), &config.transport)?;
        let (snapshot, _) = watch::channel(Arc::new(DeviceSnapshot::default()));
        Ok(Self {
            inner: Arc::new(SessionInner { client, snapshot }),
        })
    }

    /// The underlying API client.
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Make sure a usable token is held, then load the pairings.
    ///
    /// Imported tokens are reused when still valid.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.ensure_valid().await?;
        let snapshot = self.refresh().await?;
        info!(
            doors = snapshot.doors.len(),
            pairings = snapshot.pairings.len(),
            "session connected"
        );
        Ok(())
    }

    /// Log in with the password grant, replacing any held tokens.
    pub async fn authenticate(&self) -> Result<TokenState, CoreError> {
        Ok(self.inner.client.authenticate().await?)
    }

    pub async fn ensure_valid(&self) -> Result<(), CoreError> {
        Ok(self.inner.client.ensure_valid().await?)
    }

    /// Fetch the pairings and replace the snapshot.
    ///
    /// `refreshed_at` is the time the request was issued. A response that
    /// arrives after one issued later is returned but not published.
    pub async fn refresh(&self) -> Result<Arc<DeviceSnapshot>, CoreError> {
        let requested_at = Utc::now();
        let pairings = self.inner.client.list_pairings().await?;
        let snapshot = Arc::new(DeviceSnapshot::from_pairings(pairings, requested_at));

        let published = self.inner.snapshot.send_if_modified(|current| {
            if current.refreshed_at.is_some_and(|at| at > requested_at) {
                return false;
            }
            *current = Arc::clone(&snapshot);
            true
        });
        if published {
            debug!(
                doors = snapshot.doors.len(),
                pairings = snapshot.pairings.len(),
                "device snapshot replaced"
            );
        } else {
            debug!("stale pairing response, newer snapshot kept");
        }
        Ok(snapshot)
    }

    /// Authenticate and list doors, returning how many were found.
    pub async fn test_connection(&self) -> Result<usize, CoreError> {
        self.ensure_valid().await?;
        Ok(self.refresh().await?.doors.len())
    }

    // ── Data access ──────────────────────────────────────────────────

    /// Fetch fresh pairings from the API (and update the snapshot).
    pub async fn list_pairings(&self) -> Result<Vec<Pairing>, CoreError> {
        Ok(self.refresh().await?.pairings.clone())
    }

    /// Doors from the last refresh.
    pub fn get_doors(&self) -> Vec<Door> {
        self.snapshot().doors.clone()
    }

    /// Home summary from the last refresh.
    pub fn get_home_info(&self) -> HomeInfo {
        self.snapshot().home.clone()
    }

    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DeviceSnapshot>> {
        self.inner.snapshot.subscribe()
    }

    // ── Door actions ─────────────────────────────────────────────────

    /// Trigger `access_id` on `device_id`. `Ok(false)` when the intercom
    /// reports a refusal.
    pub async fn open_door(&self, device_id: &str, access_id: AccessId) -> Result<bool, CoreError> {
        Ok(self.inner.client.open_door(device_id, access_id).await?)
    }

    /// Open a door by its `<device_id>_<door_key>` id, loading the pairings
    /// first if the session has never refreshed.
    pub async fn open_door_by_id(&self, door_id: &str) -> Result<bool, CoreError> {
        let mut snapshot = self.snapshot();
        if snapshot.refreshed_at.is_none() {
            snapshot = self.refresh().await?;
        }

        let door = snapshot
            .door(door_id)
            .ok_or_else(|| CoreError::DoorNotFound {
                identifier: door_id.to_owned(),
            })?;

        debug!(door = %door.display_name, "opening door by id");
        self.open_door(&door.device_id, door.access_id).await
    }

    // ── Token persistence ────────────────────────────────────────────

    pub async fn export_tokens(&self) -> TokenState {
        self.inner.client.export_tokens().await
    }

    pub async fn import_tokens(&self, tokens: TokenState) {
        self.inner.client.import_tokens(tokens).await;
    }

    pub async fn auth_state(&self) -> AuthState {
        self.inner.client.auth_state().await
    }

    /// Doors are actionable while a token is held.
    pub async fn is_available(&self) -> bool {
        self.auth_state().await.has_token()
    }
}
