//! Single-Collateral Dai Arbitrage Keeper Library
//!
//! A library for finding and executing closed trading cycles across the
//! Single-Collateral Dai markets: the Tub/Tap vault operations (`join`, `exit`,
//! `boom`, `bust`) at fixed internal prices, and resting orders on the OASIS
//! order book. Every cycle starts and ends in one configured base asset.
//!
//! # Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - **`numeric`**: `Wad`/`Ray`/`Rad` fixed-decimal types
//! - **`graph`**: Asset/edge graph of fixed-price and book-order edges
//! - **`market`**: Per-block immutable market snapshot
//! - **`path`**: Cycle enumeration, sizing and plan derivation
//! - **`executor`**: Approval staging, call encoding and submission
//! - **`chain`**: Chain collaborators (reader, sender, block source) and their Alloy implementation
//! - **`keeper`**: The per-block pipeline and its state machine
//! - **`config`**: Operating parameters and their validation
//! - **`builders`**: Builder patterns for snapshots, graphs and executors
//! - **`errors`**: Error taxonomy and exit codes
//! - **`utils`**: Type conversions between Alloy and `BigUint`
//!
//! # Core Concepts
//!
//! - **Market Snapshot**: An immutable view of every executable edge at one block
//! - **Cycle**: A path of edges that leaves the base asset and returns to it,
//!   using each vault operation and each order at most once
//! - **Plan**: A cycle sized by its tightest edge capacity and the engagement
//!   cap, with every intermediate amount derived using round-down arithmetic
//! - **Submission**: One transaction per step (direct mode) or one batched
//!   transaction through a Batch Executor contract

pub mod builders;
pub mod chain;
pub mod config;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod keeper;
pub mod market;
pub mod numeric;
pub mod path;
pub mod utils;

pub use errors::{KeeperError, Result};

// Module-specific Result types
pub type UtilityResult<T> = std::result::Result<T, errors::UtilityError>;
pub type GraphResult<T> = std::result::Result<T, errors::GraphError>;
pub type PathResult<T> = std::result::Result<T, errors::PathError>;
pub type MarketResult<T> = std::result::Result<T, errors::MarketError>;
pub type ExecutionResult<T> = std::result::Result<T, errors::ExecutionError>;
pub type ConfigResult<T> = std::result::Result<T, errors::ConfigError>;
