// Stagehand Library - Environment session coordination for the admin console
// This exposes the core components for testing and integration

pub mod clipboard;
pub mod config;
pub mod error;
pub mod identity;
pub mod journal;
pub mod lock;
pub mod model;
pub mod observability;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod shutdown;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use clipboard::{Clipboard, ClipboardEntity};
pub use config::{config, init_config, StagehandConfig};
pub use error::{ConsoleError, OperationError};
pub use identity::{Capability, Identity, UserId};
pub use journal::ChangeJournal;
pub use lock::{LockManager, LockState};
pub use model::{
    Agent, Application, ApplicationServer, Config, ConnectionPool, EntityKind, Environment,
    JmsServer, LogFile, Notifier, Publisher,
};
pub use observability::{OperationTimer, SessionMetrics, SessionStats};
pub use remote::{
    AgentCallError, AgentClient, AgentEndpoint, AgentOperation, AgentRequest, BackgroundOperation,
    CommandAgentClient, OperationHandle, OperationResult, OperationState,
};
pub use scheduler::{Continuation, ContinuationId, Step, TaskScheduler, TickReport};
pub use session::{
    ConsoleLevel, ConsoleMessage, EntityRef, EnvironmentSession, OperationTicket, PasteTarget,
    RemoteTarget, SessionSettings,
};
pub use shutdown::{shutdown_signal, ShutdownCoordinator};
pub use store::{ConfigStore, InMemoryStore, JsonFileStore};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
