//! Global constants for the collector.
//!
//! Output file names are part of the produced directory layout and should not
//! change between releases.

// Output layout
/// Host container-runtime information, directly under the output root
pub const HOST_INFO_FILE: &str = "docker-info.txt";

/// Node container metadata
pub const INSPECT_FILE: &str = "inspect.json";

/// Node container console output
pub const SERIAL_LOG_FILE: &str = "serial.log";

/// Kubernetes version marker read from inside the node
pub const VERSION_FILE: &str = "kubernetes-version.txt";

/// Full system journal of the node
pub const JOURNAL_FILE: &str = "journal.log";

pub const KUBELET_LOG_FILE: &str = "kubelet.log";

pub const CONTAINERD_LOG_FILE: &str = "containerd.log";

// Node side
/// Directory mirrored from every node
pub const DEFAULT_REMOTE_LOG_DIR: &str = "/var/log";

/// Version marker written into node images
pub const DEFAULT_NODE_VERSION_PATH: &str = "/kind/version";

pub const KUBELET_UNIT: &str = "kubelet.service";

pub const CONTAINERD_UNIT: &str = "containerd.service";

// Host side
/// Container runtime used to reach nodes
pub const DEFAULT_PROVIDER: &str = "docker";

pub const DEFAULT_CLUSTER_NAME: &str = "kind";

/// Label carried by every node container of a cluster
pub const CLUSTER_LABEL_KEY: &str = "io.x-k8s.kind.cluster";
