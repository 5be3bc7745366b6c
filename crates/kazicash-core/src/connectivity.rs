//! Process-wide connectivity flag for the UI.
//!
//! `OfflineSignal` owns the flag; consumers hold an `OfflineStatus`, a
//! read-only view they can poll or await. The flag is advisory: a request
//! can still fail while it says online, and the fetch fallback covers that.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

use crate::http::Request;
use crate::network::Network;

/// Banner shown while offline
pub const OFFLINE_BANNER: &str =
    "You're working offline. Changes will sync when you're back online.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_offline(self) -> bool {
        self == Connectivity::Offline
    }

    /// Parse a platform event name
    pub fn from_event(event: &str) -> Option<Self> {
        match event {
            "online" => Some(Connectivity::Online),
            "offline" => Some(Connectivity::Offline),
            _ => None,
        }
    }
}

pub struct OfflineSignal {
    offline: watch::Sender<bool>,
}

impl OfflineSignal {
    pub fn new(initial: Connectivity) -> Self {
        let (offline, _) = watch::channel(initial.is_offline());
        Self { offline }
    }

    /// Derive the initial state from a single HEAD request to `origin`.
    /// Any response counts as online.
    pub async fn probe(network: &dyn Network, origin: &Url) -> Self {
        let request = Request::new(reqwest::Method::HEAD, origin.clone());
        let initial = match network.fetch(&request).await {
            Ok(response) => {
                debug!(status = response.status, "Connectivity probe answered");
                Connectivity::Online
            }
            Err(e) => {
                debug!(error = %e, "Connectivity probe failed");
                Connectivity::Offline
            }
        };
        info!(state = ?initial, "Initial connectivity");
        Self::new(initial)
    }

    /// Overwrite the flag
    pub fn notify(&self, state: Connectivity) {
        let changed = self.offline.send_if_modified(|offline| {
            let was = *offline;
            *offline = state.is_offline();
            was != *offline
        });
        if changed {
            info!(state = ?state, "Connectivity changed");
        }
    }

    /// Feed a platform "online" / "offline" event. Returns false for
    /// events that are not connectivity events.
    pub fn handle_event(&self, event: &str) -> bool {
        match Connectivity::from_event(event) {
            Some(state) => {
                self.notify(state);
                true
            }
            None => false,
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        to_connectivity(*self.offline.borrow())
    }

    /// A read-only view for consumers
    pub fn view(&self) -> OfflineStatus {
        OfflineStatus {
            rx: self.offline.subscribe(),
        }
    }
}

#[derive(Clone)]
pub struct OfflineStatus {
    rx: watch::Receiver<bool>,
}

impl OfflineStatus {
    pub fn is_offline(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn connectivity(&self) -> Connectivity {
        to_connectivity(self.is_offline())
    }

    /// Wait for the next change. `None` once the signal is gone.
    pub async fn changed(&mut self) -> Option<Connectivity> {
        self.rx.changed().await.ok()?;
        Some(to_connectivity(*self.rx.borrow_and_update()))
    }

    pub fn banner(&self) -> Option<&'static str> {
        self.is_offline().then_some(OFFLINE_BANNER)
    }
}

fn to_connectivity(offline: bool) -> Connectivity {
    if offline {
        Connectivity::Offline
    } else {
        Connectivity::Online
    }
}
