// Remote agent operations: the RPC seam and the background operation wrapper
// that keeps agent calls off the console thread.

pub mod client;
pub mod operation;

pub use client::{
    AgentCallError, AgentClient, AgentEndpoint, AgentOperation, AgentRequest, CommandAgentClient,
};
#[cfg(any(test, feature = "testing"))]
pub use client::MockAgentClient;
pub use operation::{BackgroundOperation, OperationHandle, OperationId, OperationResult, OperationState};
