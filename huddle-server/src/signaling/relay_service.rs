use crate::config::RelayConfig;
use crate::room::SessionRegistry;
use crate::signaling::Dispatcher;
use std::sync::Arc;

struct RelayInner {
    registry: Arc<SessionRegistry>,
    dispatcher: Dispatcher,
    config: RelayConfig,
}

/// State shared by every connection handler and HTTP route.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.room_capacity));
        let dispatcher = Dispatcher::new(registry.clone());

        Self {
            inner: Arc::new(RelayInner {
                registry,
                dispatcher,
                config,
            }),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.inner.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
