use partsim::display;
use partsim::memory::{PartitionList, Policy, TaskId};

use anyhow::{anyhow, Result};
use log::*;

/// Total size of the simulated address space, in KB.
const MEMORY_SIZE: u64 = 65536;

/// One step of a simulation script: a task requesting a
/// number of KB, or a task releasing what it holds.
enum Op {
    Request(TaskId, u64),
    Release(TaskId),
}

use Op::{Release, Request};

/// First-fit workload: fragments the space, fills the hole
/// left by task 3, then releases partitions between two
/// allocated neighbors, behind a free predecessor, and
/// with both sides free at once.
const FIRST_FIT_SCRIPT: &[Op] = &[
    Request(1, 8000),
    Request(2, 12000),
    Request(3, 6000),
    Request(4, 20000),
    Request(5, 4000),
    Release(3),
    Request(6, 5000),
    Release(2),
    Request(7, 15000),
    Release(4),
    Release(6),
];

/// Best-fit workload: releases of tasks 2 and 5 open holes
/// of very different sizes that the later requests must
/// fill, including a merge with a free successor.
const BEST_FIT_SCRIPT: &[Op] = &[
    Request(1, 5000),
    Request(2, 15000),
    Request(3, 10000),
    Request(4, 25000),
    Request(5, 8000),
    Release(2),
    Request(6, 12000),
    Release(5),
    Request(7, 8000),
    Release(4),
    Release(6),
];

/// Worst-fit workload: the request of task 5 does not fit
/// anywhere and fails, so its later release fails too.
const WORST_FIT_SCRIPT: &[Op] = &[
    Request(1, 10000),
    Request(2, 20000),
    Request(3, 5000),
    Request(4, 30000),
    Request(5, 6000),
    Release(4),
    Request(6, 20000),
    Release(2),
    Request(7, 15000),
    Release(5),
    Release(6),
];

fn main() -> Result<()> {
    std::env::set_var("RUST_LOG", "info");
    pretty_env_logger::init();

    // An optional policy name on the command line restricts
    // the run to that single scenario; by default the three
    // are replayed in sequence.
    match std::env::args().nth(1) {
        Some(name) => run_scenario(parse_policy(&name)?),
        None => {
            for policy in [Policy::FirstFit, Policy::BestFit, Policy::WorstFit] {
                run_scenario(policy);
            }
        }
    }

    Ok(())
}

fn parse_policy(name: &str) -> Result<Policy> {
    match name {
        "first-fit" => Ok(Policy::FirstFit),
        "best-fit" => Ok(Policy::BestFit),
        "worst-fit" => Ok(Policy::WorstFit),
        _ => Err(anyhow!("unknown placement policy: {name}")),
    }
}

fn run_scenario(policy: Policy) {
    let script = match policy {
        Policy::FirstFit => FIRST_FIT_SCRIPT,
        Policy::BestFit => BEST_FIT_SCRIPT,
        Policy::WorstFit => WORST_FIT_SCRIPT,
    };

    info!("simulating {policy} placement over {MEMORY_SIZE} KB");
    let mut list = PartitionList::new(MEMORY_SIZE);
    println!("{}", display::render_table(&list.snapshot()));

    // Replay the script. Failures are part of the workload:
    // they are reported and the simulation moves on with
    // the list unchanged.
    for op in script {
        match *op {
            Request(task, size) => match list.allocate(task, size, policy) {
                Ok(()) => info!("allocated {size} KB to task {task}"),
                Err(err) => warn!("allocation for task {task} failed: {err}"),
            },
            Release(task) => match list.deallocate(task) {
                Ok(()) => info!("reclaimed the memory of task {task}"),
                Err(err) => warn!("reclaim for task {task} failed: {err}"),
            },
        }
    }

    info!(
        "final layout: {} of {} KB allocated",
        list.allocated(),
        list.capacity(),
    );
    println!("{}", display::render_table(&list.snapshot()));
}
