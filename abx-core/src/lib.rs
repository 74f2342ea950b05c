pub mod phase;
pub mod stimulus;
pub mod trial;

pub use phase::{Phase, StandardPhase};
pub use stimulus::{
    AssetKind, Condition, Driver, PathMeta, StimulusPool, StimulusRecord, UnknownCondition,
};
pub use trial::{AbxTrial, Construction, Side, TrialResponse, TrialState, UnknownSide};
