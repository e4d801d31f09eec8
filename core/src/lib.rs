//! Streaming plan compiler: parses numbered `N. tool(args)` plans as they are
//! generated and executes them as a dependency graph.

pub mod api;
pub mod capability;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod plan;
