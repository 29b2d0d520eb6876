use std::sync::Arc;

use tracing::info;
use updraft_core::{
    BuildInfo, Collaborators, Config, SharedConnectivity, StringTable, UpdateOrchestrator,
};

use crate::bridge::{ConsentSlot, HttpTransport, ServerHost};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: UpdateOrchestrator,
    transport: Arc<HttpTransport>,
    consent: Arc<ConsentSlot>,
    host: Arc<ServerHost>,
    connectivity: Arc<SharedConnectivity>,
    build_info: Option<BuildInfo>,
}

impl AppState {
    /// Wire the orchestrator to the HTTP bridges. Nothing runs until
    /// [`start`](Self::start).
    pub fn new(config: Config, build_info: Option<BuildInfo>) -> Self {
        let transport = Arc::new(HttpTransport::new());
        let consent = Arc::new(ConsentSlot::new());
        let host = Arc::new(ServerHost::new());
        let connectivity = Arc::new(SharedConnectivity::new(config.connectivity.initial));
        let localizer = Arc::new(StringTable::from_config(&config.localization));

        let orchestrator = UpdateOrchestrator::new(
            config.update.clone(),
            Collaborators {
                transport: transport.clone(),
                prompt: consent.clone(),
                host: host.clone(),
                connectivity: connectivity.clone(),
                localizer,
            },
        );

        Self {
            config,
            orchestrator,
            transport,
            consent,
            host,
            connectivity,
            build_info,
        }
    }

    /// Enter the update procedure and start polling for completion.
    pub fn start(&self) {
        self.orchestrator.enter();
        self.orchestrator.spawn_tick_loop();
    }

    /// Abandon the current run and begin a new one.
    pub fn restart(&self) {
        info!("Restarting update procedure");
        self.orchestrator.stop_tick_loop();
        self.orchestrator.leave(true);
        self.consent.take();
        self.transport.clear_commands();
        self.start();
    }

    /// Stop ticking and unregister from the transport.
    pub fn stop(&self) {
        self.orchestrator.stop_tick_loop();
        self.orchestrator.leave(true);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &UpdateOrchestrator {
        &self.orchestrator
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn consent(&self) -> &ConsentSlot {
        &self.consent
    }

    pub fn host(&self) -> &ServerHost {
        &self.host
    }

    pub fn connectivity(&self) -> &SharedConnectivity {
        &self.connectivity
    }

    pub fn build_info(&self) -> Option<&BuildInfo> {
        self.build_info.as_ref()
    }
}
