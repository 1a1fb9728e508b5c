use std::sync::Arc;

use orrery_core::{audit::AuditStore, Config, SanitizedConfig};

use crate::api::WsBroadcaster;
use crate::engine::EngineHandle;

/// Shared application state
pub struct AppState {
    config: Config,
    engine: EngineHandle,
    audit_store: Arc<dyn AuditStore>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: EngineHandle,
        audit_store: Arc<dyn AuditStore>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            engine,
            audit_store,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
