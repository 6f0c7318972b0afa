//! Core ProbeManager trait definition.

use crate::errors::{ProbeType, Result};
use aya::Ebpf;
use std::collections::HashSet;

/// Abstract interface for managing eBPF probes.
///
/// Hides program loading and hook attachment behind one seam, so callers
/// (and tests) deal in probe types rather than aya program handles.
pub trait ProbeManager {
    /// Load the programs backing `probe_type` and attach them to their hook
    /// points.
    fn attach(&mut self, ebpf: &mut Ebpf, probe_type: ProbeType) -> Result<()>;

    /// Forget an attachment. aya detaches the underlying programs when the
    /// `Ebpf` instance drops.
    fn detach(&mut self, probe_type: ProbeType) -> Result<()>;

    /// Whether `probe_type` is currently attached.
    fn is_attached(&self, probe_type: ProbeType) -> bool;

    /// All currently attached probe types.
    fn attached_probes(&self) -> &HashSet<ProbeType>;

    /// Names of the eBPF programs associated with `probe_type`.
    fn program_names(&self, probe_type: ProbeType) -> Vec<&'static str>;
}
