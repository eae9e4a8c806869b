mod engine;
mod types;

pub use engine::{decumulation_schedule, project_accumulation, project_decumulation};
pub use types::{
    AccumulationRequest, AccumulationResult, DecumulationRequest, DecumulationResult,
    DrawdownMonth,
};
