//! Builder patterns for complex object construction.
//!
//! Each builder collects its components step by step and validates them in
//! `build()`, which consumes the builder and returns a `Result`.
//!
//! # Available Builders
//!
//! - **`MarketGraphBuilder`**: Builds market graphs from assets and edges
//! - **`ExecutorBuilder`**: Selects the submission mode and constructs the executor
//! - **`KeeperBuilder`**: Wires reader, executor and operating parameters into a keeper

pub mod executor;
pub mod graph;
pub mod keeper;

pub use executor::ExecutorBuilder;
pub use graph::MarketGraphBuilder;
pub use keeper::KeeperBuilder;
