//! Vidqa gateway: HTTP calls to the ingestion and question-answering service.
mod gateway;
mod runtime;
mod types;

pub use gateway::{Gateway, GatewaySettings, ReqwestGateway};
pub use runtime::GatewayHandle;
pub use types::{
    Answer, FailureKind, GatewayEvent, GatewayFailure, HealthStatus, IngestAck, Outcome,
    UNREACHABLE_MESSAGE,
};
