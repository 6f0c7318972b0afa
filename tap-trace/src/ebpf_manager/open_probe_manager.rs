//! Manager for the open-monitor probe (tracepoint on
//! `syscalls/sys_enter_openat`).

use super::probe_manager::ProbeManager;
use crate::errors::{ProbeType, Result, TapTraceError};
use aya::{programs::TracePoint, Ebpf};
use log::info;
use std::collections::HashSet;

pub struct OpenProbeManager {
    attached_probes: HashSet<ProbeType>,
}

impl OpenProbeManager {
    pub fn new() -> Self {
        Self {
            attached_probes: HashSet::new(),
        }
    }
}

impl ProbeManager for OpenProbeManager {
    fn attach(&mut self, ebpf: &mut Ebpf, probe_type: ProbeType) -> Result<()> {
        if probe_type != ProbeType::OpenMonitor {
            return Err(TapTraceError::InvalidProbeType {
                probe_type: probe_type.as_str().to_string(),
                valid_types: vec!["open_monitor".to_string()],
            });
        }

        if self.attached_probes.contains(&probe_type) {
            return Err(TapTraceError::ProbeAlreadyAttached { probe_type });
        }

        let program: &mut TracePoint = ebpf
            .program_mut("sys_enter_openat")
            .ok_or_else(|| TapTraceError::MapNotFound {
                map_name: "sys_enter_openat".to_string(),
            })?
            .try_into()
            .map_err(|e| TapTraceError::EbpfLoadFailed {
                program_name: "sys_enter_openat".to_string(),
                source: anyhow::anyhow!("Failed to convert to TracePoint: {:?}", e),
            })?;

        program.load().map_err(|e| TapTraceError::EbpfLoadFailed {
            program_name: "sys_enter_openat".to_string(),
            source: anyhow::anyhow!("Load failed: {:?}", e),
        })?;

        program
            .attach("syscalls", "sys_enter_openat")
            .map_err(|e| TapTraceError::EbpfAttachmentFailed {
                program_name: "sys_enter_openat".to_string(),
                source: anyhow::anyhow!("Attach failed: {:?}", e),
            })?;

        info!("Attached tracepoint to sys_enter_openat");
        self.attached_probes.insert(probe_type);
        Ok(())
    }

    fn detach(&mut self, probe_type: ProbeType) -> Result<()> {
        if !self.attached_probes.remove(&probe_type) {
            return Err(TapTraceError::ProbeNotFound { probe_type });
        }

        info!("Open monitor probe detached");
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
            ProbeType::OpenMonitor => vec!["sys_enter_openat"],
            _ => vec![],
        }
    }
}

impl Default for OpenProbeManager {
    fn default() -> Self {
        Self::new()
    }
}
