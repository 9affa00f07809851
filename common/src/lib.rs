pub mod codec;
pub mod config;
pub mod documents;
pub mod error;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod topics;
pub mod types;
pub mod xml;

pub use codec::{decode_command, decode_report, encode_telemetry, ReportField};
pub use config::{BridgeConfig, DocumentContext, NetworkConfig};
pub use documents::{ConfigDocument, StatusDocument, TimeDocument};
pub use error::{CodecError, ConfigError, EngineError};
pub use reconcile::{Ingested, ReconciliationEngine};
pub use routes::DeviceRoute;
pub use state::{DesiredConfig, ObservedState};
pub use topics::*;
pub use types::{CommandKind, CommandOutcome, PollDecision, ReportEndpoint};
