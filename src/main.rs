/*!
 * sched-sim - Demo Entry Point
 *
 * Loads a config, spins up the dispatcher, feeds it a batch workload, and
 * dumps periodic status reports until every process finishes.
 */

use log::{info, warn};
use rand::Rng;
use sched_sim::{MemoryMode, SimConfig, SimContext};
use std::error::Error;
use std::time::Duration;

/// Fallback configuration when no config file is supplied.
const DEFAULT_CONFIG: &str = "\
num-cpu 4
scheduler rr
quantum-cycles 5
batch-process-freq 1
min-ins 20
max-ins 60
delays-per-exec 0
max-overall-mem 16384
mem-per-frame 256
min-mem-per-proc 1024
max-mem-per-proc 4096
";

/// Number of batch processes the demo submits.
const BATCH_SIZE: usize = 8;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_file(&path)?,
        None => {
            warn!("No config file given; using built-in defaults");
            SimConfig::from_str_contents(DEFAULT_CONFIG)?
        }
    };

    info!("sched-sim starting");
    let ctx = SimContext::new(config);
    ctx.scheduler.start();

    // Batch workload: instruction counts and footprints drawn from the
    // configured ranges, submitted at the batch frequency.
    let config = &ctx.config;
    let mut rng = rand::thread_rng();
    for i in 0..BATCH_SIZE {
        let name = format!("p{:02}", i + 1);
        let ticks = rng.gen_range(config.min_ins..=config.max_ins);
        let memory = match config.memory_mode() {
            MemoryMode::Flat => config.min_mem_per_proc,
            MemoryMode::Paging => {
                rng.gen_range(config.min_mem_per_proc..=config.max_mem_per_proc)
            }
        };
        ctx.submit_process(&name, ticks, memory)?;
        std::thread::sleep(config.tick_delay() * config.batch_process_freq as u32);
    }

    // Reporting loop: read-only snapshots until the workload drains.
    loop {
        std::thread::sleep(Duration::from_millis(500));

        let sched = ctx.scheduler.stats();
        let mem = ctx.memory.stats();
        println!("{}", serde_json::to_string(&sched)?);
        println!("{}", serde_json::to_string(&mem)?);

        if ctx.registry.snapshot().iter().all(|p| {
            p.state == sched_sim::ProcessState::Finished
        }) {
            break;
        }
    }

    ctx.scheduler.stop();

    println!("--- final report ---");
    for process in ctx.registry.snapshot() {
        println!("{}", serde_json::to_string(&process)?);
    }
    info!("All processes finished");
    Ok(())
}
