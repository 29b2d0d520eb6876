pub mod build_info;
pub mod config;
pub mod localization;
pub mod metrics;
pub mod testing;
pub mod update;

pub use build_info::{BuildInfo, BuildInfoError, Platform};
pub use config::{
    load_config, load_config_from_str, validate_config, BuildInfoConfig, Config, ConfigError,
    ConnectivityConfig, ServerConfig,
};
pub use localization::{LocalizationConfig, Localizer, StringTable};
pub use update::{
    Collaborators, CompletionReport, Connectivity, ConnectivityProbe, ConsentPrompt,
    ConsentReply, ConsentRequest, EventBus, ProcedureHost, ResourceTransport, SessionSnapshot,
    SessionState, SharedConnectivity, Subscription, UpdateConfig, UpdateError, UpdateEvent,
    UpdateEventHandler, UpdateOrchestrator,
};
