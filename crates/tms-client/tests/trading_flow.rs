//! End-to-end trading-flow tests against the in-process simulated service.
//!
//! These drive the whole client: setup RPCs, the three subscriptions, wave
//! release, price escalation, stop handling, and completion via the latch.

use std::time::Duration;
use tms_client::{AppConfig, Application, TargetSpec};
use tms_core::{fields::names, FieldMap, OrdType, OrderId, Side, TargetId};
use tms_remote::{ModifyTargetsRequest, TradingService};
use tms_sim::{SimConfig, SimulatedTms};
use tokio::time::timeout;

fn target(instrument: &str, side: Side, quantity: f64) -> TargetSpec {
    TargetSpec {
        instrument: instrument.to_string(),
        side,
        quantity,
        client_name: None,
        set_px_to: None,
    }
}

/// Config with fast escalation timeouts and a live market-data feed.
fn test_config(wave_size_pct: f64, auto_fill_delay_ms: Option<u64>) -> AppConfig {
    let mut config = AppConfig::default();
    config.wave_size_pct = wave_size_pct;
    config.escalation.mid_px_timeout_ms = 100;
    config.escalation.market_timeout_ms = 150;
    config.simulator = SimConfig {
        auto_fill_delay_ms,
        market_data_interval_ms: Some(50),
        ..SimConfig::with_prices([("IBM".to_string(), 50.0), ("MSFT".to_string(), 99.0)])
    };
    config
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let waited = timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

async fn wait_for_open_order(sim: &SimulatedTms) -> OrderId {
    wait_until("an open order", || !sim.open_order_ids().is_empty()).await;
    sim.open_order_ids().remove(0)
}

#[tokio::test]
async fn test_full_run_completes_with_auto_fills() {
    let mut config = test_config(50.0, Some(40));
    config.targets = vec![target("IBM", Side::Buy, 1000.0), target("MSFT", Side::Sell, 500.0)];
    let sim = SimulatedTms::new(config.simulator.clone());

    let app = Application::new(config, sim.clone());
    timeout(Duration::from_secs(10), app.run())
        .await
        .expect("run must finish")
        .expect("run must succeed");

    // One completion alert per target, nothing left open.
    assert_eq!(sim.posted_alerts().len(), 2);
    assert!(sim.open_order_ids().is_empty());
    assert_eq!(sim.target_unreleased(TargetId::new(1)), Some(0.0));
    assert_eq!(sim.target_unreleased(TargetId::new(2)), Some(0.0));
}

#[tokio::test]
async fn test_manual_fill_waves_until_completion() {
    let mut config = test_config(50.0, None);
    config.targets = vec![target("IBM", Side::Buy, 1000.0)];
    let sim = SimulatedTms::new(config.simulator.clone());

    let app = Application::new(config, sim.clone());
    let run = tokio::spawn(app.run());

    // Two 50% waves release the full quantity.
    let first = wait_for_open_order(&sim).await;
    sim.fill_order(&first);

    // The close triggers the next wave with a fresh order id.
    let sim_ref = sim.clone();
    let prev = first.clone();
    wait_until("the next wave's order", move || {
        sim_ref.open_order_ids().iter().any(|id| *id != prev)
    })
    .await;
    let second = sim
        .open_order_ids()
        .into_iter()
        .find(|id| *id != first)
        .expect("second wave order");
    sim.fill_order(&second);

    timeout(Duration::from_secs(10), run)
        .await
        .expect("run must finish")
        .expect("task must not panic")
        .expect("run must succeed");
    assert_eq!(sim.posted_alerts().len(), 1);
}

#[tokio::test]
async fn test_price_escalates_to_mid_then_market_while_unfilled() {
    let mut config = test_config(100.0, None);
    config.targets = vec![target("IBM", Side::Buy, 1000.0)];
    let sim = SimulatedTms::new(config.simulator.clone());

    let app = Application::new(config, sim.clone());
    let run = tokio::spawn(app.run());

    let order_id = wait_for_open_order(&sim).await;
    // Limit price comes from the simulator's price table.
    assert_eq!(sim.order_price(&order_id), Some(50.0));

    // Mid-price step: published mid is last - mid_px_offset.
    let sim_ref = sim.clone();
    let mid_order = order_id.clone();
    wait_until("the mid-price modification", move || {
        sim_ref.order_price(&mid_order) == Some(49.9)
    })
    .await;
    assert_eq!(sim.order_type(&order_id), Some(OrdType::Limit));

    // Market step: order type flips, price clears.
    let sim_ref = sim.clone();
    let market_order = order_id.clone();
    wait_until("the market modification", move || {
        sim_ref.order_type(&market_order) == Some(OrdType::Market)
    })
    .await;
    assert_eq!(sim.order_price(&order_id), Some(0.0));

    sim.fill_order(&order_id);
    timeout(Duration::from_secs(10), run)
        .await
        .expect("run must finish")
        .expect("task must not panic")
        .expect("run must succeed");
}

#[tokio::test]
async fn test_stop_update_cancels_open_order_and_completes_target() {
    // Small waves: plenty of quantity stays unreleased when the stop lands.
    let mut config = test_config(10.0, None);
    config.targets = vec![target("IBM", Side::Buy, 1000.0)];
    let sim = SimulatedTms::new(config.simulator.clone());

    let app = Application::new(config, sim.clone());
    let run = tokio::spawn(app.run());

    let _order_id = wait_for_open_order(&sim).await;

    // A stop arrives for the target (e.g. from the management UI).
    sim.modify_market_targets(ModifyTargetsRequest {
        target_ids: vec![TargetId::new(1)],
        fields: vec![FieldMap::new().with_string(names::TEXT, "STOP")],
    })
    .await
    .expect("modify must succeed");

    // The client cancels the open order and the target completes without
    // requesting another wave.
    timeout(Duration::from_secs(10), run)
        .await
        .expect("run must finish")
        .expect("task must not panic")
        .expect("run must succeed");

    assert!(sim.open_order_ids().is_empty());
    assert_eq!(sim.posted_alerts().len(), 1);
}

#[tokio::test]
async fn test_startup_aborts_on_invalid_targets() {
    // A target row without quantity is rejected by the service with child
    // exception details; startup must fail before any trading happens.
    let mut config = test_config(50.0, None);
    config.targets = vec![target("IBM", Side::Buy, 0.0)];
    let sim = SimulatedTms::new(config.simulator.clone());

    let app = Application::new(config, sim.clone());
    let result = timeout(Duration::from_secs(5), app.run())
        .await
        .expect("run must finish");

    assert!(result.is_err());
    assert!(sim.open_order_ids().is_empty());
    assert!(sim.posted_alerts().is_empty());
}
