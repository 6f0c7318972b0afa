use clap::Parser;
use tap_trace_common::OpenEvent;

pub mod ebpf_manager;
pub mod errors;
pub mod event_processing;

use errors::ProbeType;

#[derive(Debug, Clone, Parser)]
#[clap(name = "tap-trace", about = "eBPF observation probes: file opens and packet sources")]
pub struct Args {
    /// Which probes to attach: open_monitor, packet_monitor or all
    #[clap(short, long, default_value = "all")]
    pub probe_type: String,

    /// Network interface the packet probe binds to
    #[clap(short, long, default_value = "eth0")]
    pub iface: String,

    /// Duration to run the tracer in seconds
    #[clap(short, long)]
    pub duration: Option<u64>,
}

impl Args {
    pub fn validate(&self) -> Result<(), String> {
        match self.probe_type.as_str() {
            "open_monitor" | "packet_monitor" | "all" => Ok(()),
            _ => Err(format!("Unsupported probe type: {}", self.probe_type)),
        }
    }

    pub fn probe_types(&self) -> errors::Result<Vec<ProbeType>> {
        match self.probe_type.as_str() {
            "all" => Ok(ProbeType::all()),
            other => Ok(vec![other.parse()?]),
        }
    }
}

/// Renders decoded records for the line-oriented sink, one line per record.
pub struct LineFormatter;

impl LineFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_event(&self, event: &OpenEvent) -> String {
        format!(
            "{} openat: {}",
            event.parent_comm_as_str(),
            event.requested_path_as_str()
        )
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new()
    }
}
