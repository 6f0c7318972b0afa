use std::future::Future;
use std::io;
use std::time::Duration;

use aya::Ebpf;
use aya_log::EbpfLogger;
use clap::Parser;
use log::{debug, info, warn};
use tap_trace::ebpf_manager::{ProbeManager, UnifiedProbeManager};
use tap_trace::errors::{ProbeType, Result as TapResult, TapTraceError};
use tap_trace::event_processing::{ConsumerLoop, RingBufChannel};
use tap_trace::Args;
use tap_trace_common::OPEN_EVENTS_MAP;
use tokio::{signal, time::timeout};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    env_logger::init();

    // Bump the memlock rlimit. This is needed for older kernels that don't use the
    // new memcg based accounting, see https://lwn.net/Articles/837122/
    let rlim = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };
    let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
    if ret != 0 {
        debug!("remove limit on locked memory failed, ret is: {ret}");
    }

    let mut ebpf = Ebpf::load(aya::include_bytes_aligned!(concat!(
        env!("OUT_DIR"),
        "/tap-trace"
    )))?;

    // The packet probe's diagnostic lines arrive through this logger; losing
    // it degrades output but is not fatal.
    if let Err(e) = EbpfLogger::init(&mut ebpf) {
        warn!("failed to initialize eBPF logger: {e}");
    }

    let probe_types = args.probe_types()?;
    let mut manager = UnifiedProbeManager::new(&args.iface);
    manager.attach_multiple(&mut ebpf, &probe_types)?;
    for probe_type in &probe_types {
        info!(
            "attached {} ({:?})",
            probe_type,
            manager.program_names(*probe_type)
        );
    }

    println!("tap-trace started (probes: {})", args.probe_type);
    if let Some(duration) = args.duration {
        println!("Running for {} seconds", duration);
    }
    println!("Press Ctrl+C to exit\n");

    if probe_types.contains(&ProbeType::OpenMonitor) {
        let map = ebpf
            .take_map(OPEN_EVENTS_MAP)
            .ok_or_else(|| TapTraceError::MapNotFound {
                map_name: OPEN_EVENTS_MAP.to_string(),
            })?;
        let channel = RingBufChannel::new(map)?;
        let mut consumer = ConsumerLoop::new(channel, io::stdout());
        run_until_shutdown(args.duration, consumer.run()).await?;
    } else {
        // Packet-only mode has no userspace channel to drain; hold the
        // attachment until shutdown.
        run_until_shutdown(args.duration, std::future::pending::<TapResult<()>>()).await?;
    }

    Ok(())
}

/// Drives `work` until it fails, the optional duration elapses, or Ctrl+C
/// arrives. A clean shutdown returns Ok; a consumer failure propagates as
/// the process's exit status.
async fn run_until_shutdown<F>(duration: Option<u64>, work: F) -> TapResult<()>
where
    F: Future<Output = TapResult<()>>,
{
    match duration {
        Some(secs) => match timeout(Duration::from_secs(secs), work).await {
            Ok(result) => result,
            Err(_elapsed) => {
                println!("\nTracing completed after {} seconds", secs);
                Ok(())
            }
        },
        None => {
            tokio::select! {
                result = work => result,
                _ = signal::ctrl_c() => {
                    println!("\nReceived Ctrl+C, exiting...");
                    Ok(())
                }
            }
        }
    }
}
