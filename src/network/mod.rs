mod collect;
mod parse;
mod snapshot;

pub use collect::load_snapshot;
pub use snapshot::{
    ContractTelemetry, MessageEvent, MessageKind, NetworkSnapshot, PeerRecord, PeerState,
    TopologySnapshot, contract_location,
};
