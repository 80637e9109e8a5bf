//! End-to-end garden scenarios driven through the public API.

use std::time::Duration;

use drip_engine::clock::{apply_tick, TickKind};
use drip_engine::{
    ControlError, ControlFacade, MoistureClock, NewPlant, PlantEvent, PlantId, PlantStore,
    Preset, SimulationConfig, ValveStatus,
};

fn rapid() -> SimulationConfig {
    Preset::Rapid.settings()
}

fn new_plant(name: &str, moisture: i32, threshold: i32) -> NewPlant {
    NewPlant {
        name: name.into(),
        moisture,
        threshold,
    }
}

#[tokio::test]
async fn dry_out_then_refill_cycle() {
    let store = PlantStore::new().into_shared();
    let facade = ControlFacade::new(store.clone());
    let id = facade
        .add_plant(new_plant("Plant 1", 45, 30))
        .await
        .unwrap()
        .id;
    assert_eq!(facade.get(id).await.unwrap().valve_status, ValveStatus::Off);

    let sim = rapid();
    assert_eq!(sim.increase_rate_per_tick, 2);
    assert_eq!(sim.decrease_rate_per_tick, 1);

    // Drying: the valve opens on the tick where moisture first hits 30.
    for tick in 1..=16 {
        apply_tick(&mut *store.write().await, TickKind::Decrease, &sim);
        let p = facade.get(id).await.unwrap();
        if tick < 15 {
            assert_eq!(p.valve_status, ValveStatus::Off, "tick {tick}");
            assert_eq!(i32::from(p.moisture_level), 45 - tick);
        } else {
            assert_eq!(p.valve_status, ValveStatus::On, "tick {tick}");
            assert_eq!(p.moisture_level, 30);
        }
        assert_eq!(p.is_watering, p.valve_status == ValveStatus::On);
    }

    // Watering at +2 per tick: 35 ticks from 30 to 100.
    for tick in 1..=35 {
        apply_tick(&mut *store.write().await, TickKind::Increase, &sim);
        let p = facade.get(id).await.unwrap();
        assert_eq!(i32::from(p.moisture_level), (30 + 2 * tick).min(100));
        let expected = if tick == 35 { ValveStatus::Off } else { ValveStatus::On };
        assert_eq!(p.valve_status, expected, "tick {tick}");
        assert_eq!(p.is_watering, p.valve_status == ValveStatus::On);
    }
}

#[tokio::test]
async fn threshold_change_starts_watering_without_a_tick() {
    let facade = ControlFacade::new(PlantStore::new().into_shared());
    let id = facade.add_plant(new_plant("Fern", 25, 20)).await.unwrap().id;

    let p = facade.set_threshold(id, 30).await.unwrap();
    assert_eq!(p.valve_status, ValveStatus::On);
    assert!(p.is_watering);
}

#[tokio::test]
async fn deleting_unknown_plant_leaves_store_untouched() {
    let facade = ControlFacade::new(PlantStore::new().into_shared());
    facade.add_plant(new_plant("Fern", 50, 30)).await.unwrap();
    let before = facade.list().await;

    assert!(!facade.delete_plant(PlantId(999), None::<fn(bool)>).await);
    assert_eq!(facade.list().await, before);
}

#[tokio::test]
async fn many_adds_yield_distinct_ids() {
    let facade = ControlFacade::new(PlantStore::new().into_shared());
    let mut ids = Vec::new();
    for i in 0..100 {
        ids.push(facade.add_plant(new_plant(&format!("P{i}"), 50, 30)).await.unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn unknown_ids_fail_with_not_found() {
    let facade = ControlFacade::new(PlantStore::new().into_shared());
    let id = PlantId(12);
    assert_eq!(facade.get(id).await.unwrap_err(), ControlError::NotFound(id));
    assert_eq!(facade.set_threshold(id, 10).await.unwrap_err(), ControlError::NotFound(id));
    assert_eq!(
        facade.set_valve(id, ValveStatus::On).await.unwrap_err(),
        ControlError::NotFound(id)
    );
    assert_eq!(facade.set_moisture(id, 10).await.unwrap_err(), ControlError::NotFound(id));
}

#[tokio::test(start_paused = true)]
async fn running_clock_and_manual_overrides_share_one_store() {
    let store = PlantStore::new().into_shared();
    let facade = ControlFacade::new(store.clone());
    let id = facade.add_plant(new_plant("Basil", 32, 30)).await.unwrap().id;
    let mut rx = facade.subscribe().await;

    let mut clock = MoistureClock::new(store.clone(), rapid());
    clock.start();

    // Two decrease ticks (2s cadence): 32 -> 31 -> 30, valve opens.
    tokio::time::sleep(Duration::from_millis(4_500)).await;
    let p = facade.get(id).await.unwrap();
    assert_eq!(p.moisture_level, 30);
    assert_eq!(p.valve_status, ValveStatus::On);

    // Manual override wins until the next automatic evaluation.
    let p = facade.set_valve(id, ValveStatus::Off).await.unwrap();
    assert!(!p.is_watering);

    // Next decrease tick re-evaluates: 29 <= 30 opens it again.
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    let p = facade.get(id).await.unwrap();
    assert_eq!(p.moisture_level, 29);
    assert_eq!(p.valve_status, ValveStatus::On);

    clock.stop();

    // Every notification carries a consistent watering flag.
    while let Ok(event) = rx.try_recv() {
        if let PlantEvent::Updated(p) | PlantEvent::Added(p) = event {
            assert_eq!(p.is_watering, p.valve_status == ValveStatus::On);
        }
    }
}
