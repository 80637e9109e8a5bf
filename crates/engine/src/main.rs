use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use drip_engine::command::{parse_command, Command, ValveAction};
use drip_engine::config::{self, Preset};
use drip_engine::{ControlFacade, ControlResult, MoistureClock, PlantStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // ── Config file (simulation + seed garden) ──────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::load(&config_path)?;

    let preset = env::var("SIM_PRESET")
        .map(|s| Preset::from_str_lossy(&s))
        .unwrap_or(cfg.simulation.preset);
    let sim = cfg.simulation_with_preset(preset);

    // ── Store + seed plants ─────────────────────────────────────────
    let store = PlantStore::new().into_shared();
    let facade = ControlFacade::new(store.clone());

    for seed in cfg.seed_plants() {
        let name = seed.name.clone();
        facade
            .add_plant(seed)
            .await
            .with_context(|| format!("failed to seed plant '{name}'"))?;
    }
    {
        let mut st = store.write().await;
        let count = st.len();
        st.record_system(format!("engine started (preset: {preset}, {count} plant(s))"));
    }
    info!(%preset, plants = cfg.plants.len(), config = %config_path, "engine ready");

    // ── Change notifications ────────────────────────────────────────
    let mut rx = facade.subscribe().await;
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!(plant = %event.plant_id(), ?event, "plant changed");
        }
    });

    // ── Moisture clock ──────────────────────────────────────────────
    let mut clock = MoistureClock::new(store.clone(), sim);
    clock.start();

    // ── Console ─────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("type 'list', 'status', 'add <moisture> <threshold> <name>', ... or 'quit'");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received");
                break;
            }
        };
        // EOF
        let Some(line) = line else { break };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => dispatch(&facade, cmd).await,
            Err(msg) => eprintln!("{msg}"),
        }
    }

    clock.stop();
    store.write().await.record_system("engine stopped".to_string());
    info!("engine stopped");
    Ok(())
}

async fn dispatch(facade: &ControlFacade, cmd: Command) {
    match cmd {
        Command::List => print_json(&facade.list().await),
        Command::Status => print_json(&facade.status().await),
        Command::Get(id) => print_result(facade.get(id).await),
        Command::Add(new) => print_result(facade.add_plant(new).await),
        Command::Threshold(id, n) => print_result(facade.set_threshold(id, n).await),
        Command::Valve(id, ValveAction::Set(v)) => print_result(facade.set_valve(id, v).await),
        Command::Valve(id, ValveAction::Toggle) => print_result(facade.toggle_valve(id).await),
        Command::Moisture(id, n) => print_result(facade.set_moisture(id, n).await),
        Command::Nudge(id, d) => print_result(facade.adjust_moisture(id, d).await),
        Command::Delete(id) => {
            facade
                .delete_plant(
                    id,
                    Some(|removed: bool| {
                        print_json(&serde_json::json!({ "id": id, "removed": removed }))
                    }),
                )
                .await;
        }
        Command::Quit => {}
    }
}

fn print_result<T: Serialize>(result: ControlResult<T>) {
    match result {
        Ok(v) => print_json(&v),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: failed to encode response: {e}"),
    }
}
