use clap::Parser;

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use nas_config::{SharedConfig, toml_config};
use nas_core::debug;
use nas_entities::MmeWorkerPool;
use nas_saps::{SapMsg, SapMsgInner};

mod demo;

use demo::{DemoGtpc, DemoHss};

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

/// Logs what the MME sends towards S1AP and GTP-C. No transport is attached, so this is
/// where the outbound side of the stack ends.
fn drain_outbound(outbound: Receiver<SapMsg>) {
    for msg in outbound.iter() {
        match &msg.msg {
            SapMsgInner::S1apDownlinkNasTransport(p) => {
                tracing::info!("-> {:?} {}: NAS PDU {} bytes", msg.dest, p.ids, p.nas_pdu.len())
            }
            SapMsgInner::S1apPaging(p) => tracing::info!("-> {:?} paging m-tmsi {:08x}", msg.dest, p.m_tmsi),
            other => tracing::info!("-> {:?} {}", msg.dest, other),
        }
    }
    tracing::debug!("outbound channel closed");
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "MME NAS procedure engine",
    long_about = "Runs the EMM/ESM procedure engine with in-process HSS and gateway stand-ins"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with network, PDN, security and timer parameters")]
    config: String,

    /// Serving gateway user plane address handed to the eNodeB
    #[arg(long, default_value = "127.0.0.2")]
    sgw_ip: Ipv4Addr,

    /// First address of the UE address pool
    #[arg(long, default_value = "10.45.0.0")]
    ue_pool: Ipv4Addr,
}

fn main() {
    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let network = cfg.config().network.clone();
    eprintln!(" -> mme-nas {}", nas_core::STACK_VERSION);
    eprintln!(" -> PLMN {}-{}, TAC {}, MME group {} code {}", network.mcc, network.mnc, network.tac, network.mme_group, network.mme_code);

    let hss = Arc::new(DemoHss::new(&network.mcc, &network.mnc));
    let gtpc = Arc::new(DemoGtpc::new(args.sgw_ip, args.ue_pool));
    let (tx, rx) = unbounded();

    let mut pool = match MmeWorkerPool::new(cfg, hss, gtpc, tx) {
        Ok(p) => p,
        Err(e) => {
            println!("Failed to start MME workers: {}", e);
            std::process::exit(1);
        }
    };
    let drain = thread::spawn(move || drain_outbound(rx));

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    tracing::info!("MME running with {} workers", pool.workers());
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    tracing::info!("shutting down, {} UE contexts", pool.registry().len());
    pool.shutdown();
    // Workers held the last senders; the drain thread ends once they are gone
    if drain.join().is_err() {
        tracing::error!("outbound drain thread panicked");
    }
}
