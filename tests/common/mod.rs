//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use text_mutator_client::{
    CacheConfig, FetchError, MutationItem, MutationQueryCache, MutationRequest, MutationResponse,
    MutationType, MutatorApi, SessionController,
};

/// In-memory mutation service with canned responses keyed by input text.
///
/// Unknown texts come back unchanged with no mutations. Every call is
/// recorded so tests can count network round-trips.
pub struct ScriptedApi {
    responses: Mutex<HashMap<String, Result<MutationResponse, FetchError>>>,
    seen: Mutex<Vec<MutationRequest>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(ScriptedApi {
            responses: Mutex::new(HashMap::new()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn respond(&self, text: &str, response: MutationResponse) {
        self.responses.lock().unwrap().insert(text.to_string(), Ok(response));
    }

    pub fn fail(&self, text: &str, error: FetchError) {
        self.responses.lock().unwrap().insert(text.to_string(), Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<MutationRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl MutatorApi for ScriptedApi {
    async fn mutate(&self, request: &MutationRequest) -> Result<MutationResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let canned = self.responses.lock().unwrap().get(request.text()).cloned();
        canned.unwrap_or_else(|| {
            Ok(MutationResponse { mutated_text: request.text().to_string(), mutations: vec![] })
        })
    }

    async fn health(&self) -> Result<String, FetchError> {
        Ok("Healthy".to_string())
    }
}

/// `"Hello, world!"` with its comma removed.
pub fn hello_world() -> MutationResponse {
    MutationResponse {
        mutated_text: "Hello world!".to_string(),
        mutations: vec![MutationItem { start: 5, end: 6, kind: MutationType::RemovePunctuation }],
    }
}

pub fn two_sites(text: &str) -> MutationResponse {
    MutationResponse {
        mutated_text: text.to_string(),
        mutations: vec![
            MutationItem { start: 0, end: 1, kind: MutationType::SwapLetters },
            MutationItem { start: 2, end: 3, kind: MutationType::ReplaceHomophone },
        ],
    }
}

pub fn session(api: &Arc<ScriptedApi>) -> SessionController<ScriptedApi> {
    let cache = MutationQueryCache::new(Arc::clone(api), CacheConfig::default());
    SessionController::new(cache)
}
