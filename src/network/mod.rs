//! Graph algorithms the schedulers are built on.
//!
//! # Modules
//!
//! - **`flow`**: directed capacitated networks and pluggable max-flow
//!   solvers ([`FlowMethod`])
//! - **`matching`**: undirected graphs and seeded maximum matching
//!   ([`EdmondsBlossom`])
//! - **`dcs`**: degree-constrained subgraph reduction to matching
//!   ([`VertexSplittingReduction`])
//!
//! Each concern sits behind a trait ([`MaxFlowSolver`],
//! [`MatchingSolver`], [`DcsReduction`]) so schedulers can be handed any
//! implementation.

mod dcs;
mod flow;
mod matching;

pub use dcs::{AuxiliaryGraph, DcsReduction, VertexSplittingReduction};
pub use flow::{FlowMethod, FlowNetwork, FlowResult, MaxFlowSolver, NodeIndex};
pub use matching::{EdmondsBlossom, Graph, Matching, MatchingSolver};
