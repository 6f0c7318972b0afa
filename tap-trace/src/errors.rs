//! Unified error types for tap-trace.
//!
//! Setup failures (program load/attach, missing maps) abort startup; a poll
//! failure is fatal to the consumer loop and becomes the process's exit
//! status. Producer-side conditions — a full ring, a malformed record — are
//! deliberately not represented here: they are absorbed in-band so that the
//! probes never disturb what they observe.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TapTraceError {
    #[error("eBPF program failed to load: {program_name} - {source}")]
    EbpfLoadFailed {
        program_name: String,
        source: anyhow::Error,
    },

    #[error("eBPF program failed to attach: {program_name} - {source}")]
    EbpfAttachmentFailed {
        program_name: String,
        source: anyhow::Error,
    },

    #[error("eBPF map not found: {map_name}")]
    MapNotFound { map_name: String },

    #[error("event channel setup failed: {source}")]
    ChannelSetupFailed { source: anyhow::Error },

    #[error("event channel poll failed: {source}")]
    ChannelPollFailed { source: anyhow::Error },

    #[error("malformed event record: {message}")]
    MalformedRecord { message: String },

    #[error("output sink failed: {source}")]
    OutputSinkFailed { source: std::io::Error },

    #[error("Invalid probe type: {probe_type}. Valid types: {valid_types:?}")]
    InvalidProbeType {
        probe_type: String,
        valid_types: Vec<String>,
    },

    #[error("Probe already attached: {probe_type:?}")]
    ProbeAlreadyAttached { probe_type: ProbeType },

    #[error("Probe not found: {probe_type:?}")]
    ProbeNotFound { probe_type: ProbeType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeType {
    OpenMonitor,
    PacketMonitor,
}

impl ProbeType {
    pub fn all() -> Vec<ProbeType> {
        vec![Self::OpenMonitor, Self::PacketMonitor]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeType::OpenMonitor => "open_monitor",
            ProbeType::PacketMonitor => "packet_monitor",
        }
    }
}

impl std::fmt::Display for ProbeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProbeType {
    type Err = TapTraceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open_monitor" => Ok(ProbeType::OpenMonitor),
            "packet_monitor" => Ok(ProbeType::PacketMonitor),
            _ => Err(TapTraceError::InvalidProbeType {
                probe_type: s.to_string(),
                valid_types: ProbeType::all()
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

pub type Result<T> = std::result::Result<T, TapTraceError>;
