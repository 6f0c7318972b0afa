//! Manager for the packet probe (XDP source printer).
//!
//! The XDP program needs an interface to bind to; the manager carries the
//! name so the trait surface stays uniform across probe types.

use super::probe_manager::ProbeManager;
use crate::errors::{ProbeType, Result, TapTraceError};
use aya::{
    programs::{Xdp, XdpFlags},
    Ebpf,
};
use log::info;
use std::collections::HashSet;

pub struct PacketProbeManager {
    iface: String,
    attached_probes: HashSet<ProbeType>,
}

impl PacketProbeManager {
    pub fn new(iface: &str) -> Self {
        Self {
            iface: iface.to_string(),
            attached_probes: HashSet::new(),
        }
    }

    pub fn iface(&self) -> &str {
        &self.iface
    }
}

impl ProbeManager for PacketProbeManager {
    fn attach(&mut self, ebpf: &mut Ebpf, probe_type: ProbeType) -> Result<()> {
        if probe_type != ProbeType::PacketMonitor {
            return Err(TapTraceError::InvalidProbeType {
                probe_type: probe_type.as_str().to_string(),
                valid_types: vec!["packet_monitor".to_string()],
            });
        }

        if self.attached_probes.contains(&probe_type) {
            return Err(TapTraceError::ProbeAlreadyAttached { probe_type });
        }

        let program: &mut Xdp = ebpf
            .program_mut("source_printer")
            .ok_or_else(|| TapTraceError::MapNotFound {
                map_name: "source_printer".to_string(),
            })?
            .try_into()
            .map_err(|e| TapTraceError::EbpfLoadFailed {
                program_name: "source_printer".to_string(),
                source: anyhow::anyhow!("Failed to convert to Xdp: {:?}", e),
            })?;

        program.load().map_err(|e| TapTraceError::EbpfLoadFailed {
            program_name: "source_printer".to_string(),
            source: anyhow::anyhow!("Load failed: {:?}", e),
        })?;

        program
            .attach(&self.iface, XdpFlags::default())
            .map_err(|e| TapTraceError::EbpfAttachmentFailed {
                program_name: "source_printer".to_string(),
                source: anyhow::anyhow!(
                    "Attach to {} failed: {:?} (try changing the interface with --iface)",
                    self.iface,
                    e
                ),
            })?;

        info!("Attached XDP source printer to {}", self.iface);
        self.attached_probes.insert(probe_type);
        Ok(())
    }

    fn detach(&mut self, probe_type: ProbeType) -> Result<()> {
        if !self.attached_probes.remove(&probe_type) {
            return Err(TapTraceError::ProbeNotFound { probe_type });
        }

        info!("Packet probe detached from {}", self.iface);
        Ok(())
    }

    fn is_attached(&self, probe_type: ProbeType) -> bool {
        self.attached_probes.contains(&probe_type)
    }

    fn attached_probes(&self) -> &HashSet<ProbeType> {
        &self.attached_probes
    }

    fn program_names(&self, probe_type: ProbeType) -> Vec<&'static str> {
        match probe_type {
            ProbeType::PacketMonitor => vec!["source_printer"],
            _ => vec![],
        }
    }
}
