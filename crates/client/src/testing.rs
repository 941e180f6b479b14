//! Test doubles shared by the worker tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use lumina_core::{AppConfig, CacheDb, CacheStore, Error, Request, Response};
use url::Url;

use crate::fetch::Network;

pub const ORIGIN: &str = "https://lumina.test";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn get(path: &str) -> Request {
    Request::get(url(path))
}

pub fn html(path: &str) -> Request {
    get(path).header("accept", "text/html,application/xhtml+xml")
}

pub fn ok(body: &str) -> Response {
    Response::new(200, body.to_string()).status_text("OK")
}

pub fn config() -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        precache_urls: vec!["/".into(), "/offline/".into()],
        ..Default::default()
    }
}

pub async fn store() -> Arc<CacheDb> {
    Arc::new(CacheDb::open_in_memory().await.unwrap())
}

/// Network that serves canned responses by URL and can be switched off.
///
/// Unknown URLs get a 404.
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { routes: Mutex::new(HashMap::new()), online: AtomicBool::new(true), calls: AtomicUsize::new(0) })
    }

    pub fn route(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path).to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::NetworkFailure(format!("{}: offline", request.url)));
        }

        let response = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "Not Found").status_text("Not Found")))
    }
}

/// Store whose every operation fails.
pub struct BrokenStore;

fn broken<T>() -> Result<T, Error> {
    Err(Error::Storage("disk unavailable".into()))
}

#[async_trait]
impl CacheStore for BrokenStore {
    async fn open(&self, _namespace: &str) -> Result<(), Error> {
        broken()
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        broken()
    }

    async fn match_in(&self, _namespace: &str, _request: &Request) -> Result<Option<Response>, Error> {
        broken()
    }

    async fn match_any(&self, _request: &Request) -> Result<Option<Response>, Error> {
        broken()
    }

    async fn put(&self, _namespace: &str, _request: &Request, _response: &Response) -> Result<(), Error> {
        broken()
    }

    async fn put_all(&self, _namespace: &str, _entries: Vec<(Request, Response)>) -> Result<(), Error> {
        broken()
    }

    async fn delete(&self, _namespace: &str) -> Result<bool, Error> {
        broken()
    }

    async fn entries(&self, _namespace: &str) -> Result<Vec<String>, Error> {
        broken()
    }
}
