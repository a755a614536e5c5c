use std::sync::Arc;
use std::time::Duration;

use crate::upstream::cache::ResponseCache;
use crate::upstream::client::{UpstreamClient, UpstreamOptions};
use crate::workflow::dialog::SessionStore;
use crate::workflow::dispatch::Dispatcher;
use crate::workflow::refresh::RefreshBus;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub cache: Arc<ResponseCache>,
    pub refresh: Arc<RefreshBus>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        upstream_opts: UpstreamOptions,
        cache_ttl: Duration,
        refresh_debounce: Duration,
        session_ttl: Duration,
    ) -> Self {
        Self {
            upstream: Arc::new(UpstreamClient::new(upstream_opts)),
            cache: Arc::new(ResponseCache::new(cache_ttl)),
            refresh: Arc::new(RefreshBus::new(refresh_debounce)),
            sessions: SessionStore::new(session_ttl),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.upstream.clone(), self.cache.clone(), self.refresh.clone())
    }
}
