//! §4.G Ingress Adapter: contract-deployment detection, log decoding
//! into typed events, and routing into the Event Store.

mod adapter;
mod decode;
mod types;

pub use adapter::Adapter;
pub use decode::{decode_log, DecodedEvent};
pub use types::{BlockEvent, ContractCreation, LogEntry, TxEvent};
