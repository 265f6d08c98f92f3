pub mod engine;
pub mod grouping;
pub mod layout;
pub mod pipeline;

pub use crate::domain::model::{
    Competitor, CompetitorTable, GridSpec, GroupAssignment, GroupedTable, Namecard, Placement,
    RunArtifacts, Scorecard,
};
pub use crate::domain::ports::{CardRenderer, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
