//! # cluster-log-collector
//!
//! Best-effort collection of diagnostic logs from the nodes of a
//! container-based Kubernetes cluster and from the host running them.
//!
//! ## Overview
//!
//! When a cluster misbehaves, everything that might explain why is gathered
//! into one directory tree for post-mortem inspection: the host's container
//! runtime information, each node's `/var/log`, container metadata and
//! console output, and the system, kubelet and containerd journals.
//!
//! Collection never stops at the first failure. Every action runs, and all
//! failures are returned together in a [`collectors::collector::CollectionReport`].
//!
//! ## Output Layout
//!
//! ```text
//! <dir>/docker-info.txt
//! <dir>/<node>/...                      mirrored /var/log
//! <dir>/<node>/inspect.json
//! <dir>/<node>/serial.log
//! <dir>/<node>/kubernetes-version.txt
//! <dir>/<node>/journal.log
//! <dir>/<node>/kubelet.log
//! <dir>/<node>/containerd.log
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`collectors`]: Collection plan, aggregation, snapshots and tar extraction
//! - [`config`]: YAML configuration
//! - [`exec`]: Command execution on the host and inside nodes
//! - [`nodes`]: Cluster nodes and their discovery
//! - [`error`]: Error taxonomy and aggregation
//! - [`logging`]: Logger setup and warning sinks
//! - [`constants`]: Output names and defaults

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Log collectors and the collection plan
pub mod collectors;

/// Configuration management
pub mod config;

/// Output file names and default values
pub mod constants;

/// Error types and aggregation helpers
pub mod error;

/// Command execution against the host and nodes
pub mod exec;

/// Logging setup and warning sinks
pub mod logging;

/// Cluster nodes
pub mod nodes;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
