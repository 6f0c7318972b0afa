//! eBPF probe management.
//!
//! Thin glue between the CLI and aya: loading the programs, attaching them
//! to their hook points, and tracking attachment state. All the interesting
//! work happens in the kernel handlers and the event pipeline; failures here
//! are fatal at startup and leave no partial pipeline running.

pub mod open_probe_manager;
pub mod packet_probe_manager;
pub mod probe_manager;

pub use open_probe_manager::OpenProbeManager;
pub use packet_probe_manager::PacketProbeManager;
pub use probe_manager::ProbeManager;

use crate::errors::{ProbeType, Result, TapTraceError};
use aya::Ebpf;
use std::collections::HashSet;

/// Coordinates the two probe managers and rejects double attachment.
pub struct UnifiedProbeManager {
    open_manager: OpenProbeManager,
    packet_manager: PacketProbeManager,
    attached_probes: HashSet<ProbeType>,
}

impl UnifiedProbeManager {
    pub fn new(iface: &str) -> Self {
        Self {
            open_manager: OpenProbeManager::new(),
            packet_manager: PacketProbeManager::new(iface),
            attached_probes: HashSet::new(),
        }
    }

    pub fn attach_multiple(&mut self, ebpf: &mut Ebpf, probe_types: &[ProbeType]) -> Result<()> {
        for &probe_type in probe_types {
            self.attach(ebpf, probe_type)?;
        }
        Ok(())
    }

    pub fn detach_all(&mut self) -> Result<()> {
        let probe_types: Vec<ProbeType> = self.attached_probes.iter().cloned().collect();
        for probe_type in probe_types {
            self.detach(probe_type)?;
        }
        Ok(())
    }
}

impl ProbeManager for UnifiedProbeManager {
    fn attach(&mut self, ebpf: &mut Ebpf, probe_type: ProbeType) -> Result<()> {
        if self.attached_probes.contains(&probe_type) {
            return Err(TapTraceError::ProbeAlreadyAttached { probe_type });
        }

        match probe_type {
            ProbeType::OpenMonitor => self.open_manager.attach(ebpf, probe_type)?,
            ProbeType::PacketMonitor => self.packet_manager.attach(ebpf, probe_type)?,
        }

        self.attached_probes.insert(probe_type);
        Ok(())
    }

    fn detach(&mut self, probe_type: ProbeType) -> Result<()> {
        if !self.attached_probes.remove(&probe_type) {
            return Err(TapTraceError::ProbeNotFound { probe_type });
        }

        match probe_type {
            ProbeType::OpenMonitor => self.open_manager.detach(probe_type)?,
            ProbeType::PacketMonitor => self.packet_manager.detach(probe_type)?,
        }

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
            ProbeType::OpenMonitor => self.open_manager.program_names(probe_type),
            ProbeType::PacketMonitor => self.packet_manager.program_names(probe_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_with_no_attached_probes() {
        let manager = UnifiedProbeManager::new("eth0");
        assert!(manager.attached_probes().is_empty());
        assert!(!manager.is_attached(ProbeType::OpenMonitor));
        assert!(!manager.is_attached(ProbeType::PacketMonitor));
    }

    #[test]
    fn should_report_program_names_for_both_probes() {
        let manager = UnifiedProbeManager::new("eth0");
        assert_eq!(
            manager.program_names(ProbeType::OpenMonitor),
            vec!["sys_enter_openat"]
        );
        assert_eq!(
            manager.program_names(ProbeType::PacketMonitor),
            vec!["source_printer"]
        );
    }

    #[test]
    fn should_fail_to_detach_non_attached_probe() {
        let mut manager = UnifiedProbeManager::new("eth0");

        let result = manager.detach(ProbeType::OpenMonitor);

        match result {
            Err(TapTraceError::ProbeNotFound { probe_type }) => {
                assert_eq!(probe_type, ProbeType::OpenMonitor);
            }
            _ => panic!("Expected ProbeNotFound error"),
        }
    }
}
