//! Application layer for agent-crew
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::OrchestratorParams;
pub use ports::{
    agent_worker::{AgentTask, AgentWorker, PlaceholderWorker, WorkerError},
    checkpoint::{CheckpointError, CheckpointHook},
    config_store::{ConfigKey, ConfigStorePort, load_active_roster},
    llm_gateway::{CompletionOptions, GatewayError, LlmGateway},
    telemetry::{
        AttemptReport, CompositeTelemetry, DecisionKind, NoTelemetry, RunTelemetry,
        TelemetryGuard,
    },
};
pub use use_cases::batch_executor::{
    BatchExecutorError, BatchSummary, ParallelBatchExecutor, WorkOutcome, WorkUnit,
};
pub use use_cases::llm_worker::LlmAgentWorker;
pub use use_cases::orchestrator::{Orchestrator, OrchestratorError, RunInput, RunOutput};
pub use use_cases::plan_executor::{
    NoPlanObserver, PlanDagExecutor, PlanExecutionReport, PlanObserver,
};
pub use use_cases::planner::{PlanRequest, Planner, PlannerError};
pub use use_cases::structured_output::{
    Structured, StructuredOutputError, StructuredOutputRequest,
};
