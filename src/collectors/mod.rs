//! Log collection implementations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Collector (collection plan)         │
//! ├─────────────────────────────────────────┤
//! │  aggregate_concurrent (host + nodes)    │
//! │   └─ per node: aggregate_concurrent     │
//! │        (inspect, serial, version,       │
//! │         journal, kubelet, containerd)   │
//! ├─────────────────────────────────────────┤
//! │  DirSnapshotter  →  TarUnpacker         │
//! ├─────────────────────────────────────────┤
//! │         CommandRunner (exec)            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use cluster_log_collector::collectors::collector::Collector;
//! use cluster_log_collector::config::CollectionConfig;
//! use cluster_log_collector::exec::ProcessRunner;
//! use cluster_log_collector::nodes::Node;
//!
//! # async fn example() {
//! let config = CollectionConfig::default();
//! let runner = Arc::new(ProcessRunner::new(config.provider.clone()));
//! let collector = Collector::new(runner, config);
//!
//! let report = collector
//!     .collect(&[Node::new("kind-control-plane")], Path::new("/tmp/kind-logs"))
//!     .await;
//! println!("{}", report);
//! # }
//! ```

/// Concurrent, non-short-circuiting execution of collection actions
pub mod aggregate;

/// The full collection plan over host and nodes
pub mod collector;

/// Point-in-time copies of node directories
pub mod snapshot;

/// Streaming tar extraction
pub mod untar;
