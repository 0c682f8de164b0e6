use anyhow::Result;
use log::{debug, error, info, trace, warn};
use std::fs::File;
use std::io::Write;
use std::time::Instant;

use flock_engine::{FlockSimulation, SimulationConfig};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Flock Engine (CPU Parallel)...");

    // --- Load Configuration ---
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // The spatial dimension is fixed per run; dispatch once here so the
    // whole hot path is monomorphized.
    match config.world.dimensions {
        2 => run::<2>(config),
        3 => run::<3>(config),
        other => anyhow::bail!("Unsupported dimension count: {}.", other),
    }
}

fn run<const N: usize>(config: SimulationConfig) -> Result<()> {
    // --- Initialize Simulation ---
    info!("Initializing {}D flock state...", N);
    let mut sim = FlockSimulation::<N>::new(config)?;
    info!("State initialized with {} agents.", sim.agent_count());
    debug!("Simulation parameters: {:#?}", sim.params());

    // --- Simulation Loop ---
    let total_ticks = sim.config().timing.total_ticks;
    let mut record_interval_ticks = sim.config().timing.record_interval_ticks;
    if record_interval_ticks == 0 {
        warn!("Record interval of 0 ticks requested. Recording every tick.");
        record_interval_ticks = 1;
    }
    info!("Recording snapshot every {} ticks.", record_interval_ticks);

    info!("Starting simulation loop for {} ticks...", total_ticks);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (tick = 0) ---
    info!("Recording initial snapshot (t=0)...");
    sim.record_snapshot();

    for tick in 0..total_ticks {
        let tick_start_time = Instant::now();
        if let Err(e) = sim.step() {
            error!("Error during simulation tick {}: {}", tick + 1, e);
            anyhow::bail!("Simulation tick failed.");
        }
        let tick_duration = tick_start_time.elapsed();

        // Print status periodically
        let current_time = Instant::now();
        let print_interval_secs = 5.0;
        let should_print_status =
            current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_tick = (tick + 1) % record_interval_ticks == 0;
        let is_last_tick = tick == total_ticks - 1;

        if should_print_status || is_record_tick || is_last_tick {
            let elapsed_total = start_time.elapsed();
            info!(
                "Tick [{}/{}] | Agents: {} | Mean Speed: {:.3} | Tick Time: {:6.2} ms | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                sim.agent_count(),
                sim.snapshot().average_speed,
                tick_duration.as_secs_f64() * 1000.0,
                elapsed_total.as_secs_f64()
            );
            previous_print_time = current_time;

            // --- Record Snapshot ---
            if is_record_tick || is_last_tick {
                sim.record_snapshot();
            }
        } else {
            trace!(
                "Tick [{}/{}] completed in {:.2} ms",
                tick + 1,
                total_ticks,
                tick_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({:.3} minutes).",
        total_duration.as_secs_f64(),
        total_duration.as_secs_f64() / 60.0
    );

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    if sim.config().output.save_stats {
        let output_format = sim.config().output.format.as_deref().unwrap_or("json");
        let snapshots = sim.recorded_snapshots();

        match output_format {
            "json" => {
                let filename = format!("{}_snapshots.json", sim.config().output.base_filename);
                match File::create(&filename) {
                    Ok(mut file) => match serde_json::to_string(snapshots) {
                        Ok(json_string) => {
                            if let Err(e) = file.write_all(json_string.as_bytes()) {
                                error!("Error writing snapshot JSON to file '{}': {}", filename, e);
                            } else {
                                info!("All snapshots saved to {}", filename);
                            }
                        }
                        Err(e) => error!("Error serializing snapshots to JSON: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            "bincode" => {
                // Binary format (much more compact)
                let filename = format!("{}_snapshots.bin", sim.config().output.base_filename);
                match File::create(&filename) {
                    Ok(file) => match bincode::serialize_into(file, snapshots) {
                        Ok(_) => info!("All snapshots saved to {} (binary format)", filename),
                        Err(e) => error!("Error serializing snapshots to bincode: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            "messagepack" => {
                // MessagePack format (compact and cross-platform)
                let filename = format!("{}_snapshots.msgpack", sim.config().output.base_filename);
                match &mut File::create(&filename) {
                    Ok(file) => match rmp_serde::encode::write(file, snapshots) {
                        Ok(_) => info!("All snapshots saved to {} (MessagePack format)", filename),
                        Err(e) => error!("Error serializing snapshots to MessagePack: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                let filename = format!("{}_snapshots.json", sim.config().output.base_filename);
                match File::create(&filename) {
                    Ok(mut file) => match serde_json::to_string(snapshots) {
                        Ok(json_string) => {
                            if let Err(e) = file.write_all(json_string.as_bytes()) {
                                error!("Error writing snapshot JSON to file '{}': {}", filename, e);
                            } else {
                                info!("All snapshots saved to {}", filename);
                            }
                        }
                        Err(e) => error!("Error serializing snapshots to JSON: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    // Save final positions if requested (separate from full snapshots)
    if sim.config().output.save_positions {
        let filename = format!(
            "{}_final_positions.csv",
            sim.config().output.base_filename
        );
        let final_snapshot = sim.snapshot();

        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                const AXIS_LABELS: [&str; 3] = ["x", "y", "z"];
                writer.write_record(&AXIS_LABELS[..N])?;
                for position in &final_snapshot.positions {
                    let row: Vec<String> =
                        (0..N).map(|axis| format!("{:.4}", position[axis])).collect();
                    writer.write_record(&row)?;
                }
                writer.flush()?;
                info!("Final positions saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
