//! In-process network double shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::http::{Request, Response};
use crate::network::{Network, NetworkError};

pub const APP_URL: &str = "https://app.kazicash.test/";

pub fn app_url() -> url::Url {
    url::Url::parse(APP_URL).unwrap()
}

pub fn get(path: &str) -> Request {
    Request::get(app_url().join(path).unwrap())
}

pub fn navigate(path: &str) -> Request {
    Request::navigate(app_url().join(path).unwrap())
}

/// Pauses a fetch inside the network until released
#[derive(Clone, Default)]
pub struct Gate {
    /// Signalled once the fetch has reached the network
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// Serves canned responses by URL; unknown URLs get a 404.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    unreachable: Mutex<HashSet<String>>,
    held: Mutex<HashMap<String, Gate>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for an absolute URL or an app-relative path
    pub fn route(&self, target: &str, response: Response) {
        self.routes.lock().unwrap().insert(resolve(target), response);
    }

    pub fn serve_shell(&self) {
        for asset in crate::worker::SHELL_ASSETS {
            self.route(asset, Response::ok(format!("shell:{}", asset)));
        }
    }

    pub fn make_unreachable(&self, target: &str) {
        self.unreachable.lock().unwrap().insert(resolve(target));
    }

    /// Hold fetches of `target` until the returned gate is released
    pub fn hold(&self, target: &str) -> Gate {
        let gate = Gate::default();
        self.held.lock().unwrap().insert(resolve(target), gate.clone());
        gate
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn resolve(target: &str) -> String {
    if target.contains("://") {
        url::Url::parse(target).unwrap().to_string()
    } else {
        app_url().join(target).unwrap().to_string()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.to_string();
        let gate = self.held.lock().unwrap().get(&url).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.offline.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().contains(&url) {
            return Err(NetworkError::Unreachable(url));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}
