use alloy_primitives::{Address, U256};
use eyre::Result;
use sandwich_guard::{
    DryRunExecutor, GuardConfig, GuardEngineBuilder, GuardEventLogger, ObservedEvent, ObserverService, PoolSnapshot,
    Price, ScriptedObserver, SwapDirection, TradeRecord,
};
use std::sync::Arc;
use std::time::Duration;

const ONE_UNIT: u64 = 1_000_000_000_000_000_000;

fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(ONE_UNIT)
}

/// Walks one pool through a sandwich attack and a drifting, then manipulated, reserve mix.
///
/// Configuration comes from `GUARD_CONFIG` (a TOML file) when set, otherwise from
/// defaults plus environment overrides. Ledger rows land in `GUARD_LEDGER_DIR`.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let mut config = match std::env::var("GUARD_CONFIG") {
        Ok(path) => GuardConfig::from_file(path)?,
        Err(_) => GuardConfig::from_env()?,
    };
    if config.pool == Address::ZERO {
        config.pool = Address::repeat_byte(0xAA);
    }
    config.validate()?;
    let pool = config.pool;

    println!("Guarding pool {}", pool);
    println!("{}", serde_json::to_string_pretty(&config)?);

    let mut engine = GuardEngineBuilder::from_config(&config).build()?;
    if let Ok(dir) = std::env::var("GUARD_LEDGER_DIR") {
        engine.set_event_logger(GuardEventLogger::new(dir));
    }

    let observer = Arc::new(ScriptedObserver::with_batches(script(pool)));
    let mut service = ObserverService::new(config.service.clone(), pool, observer.clone())
        .with_poll_interval(Duration::from_millis(50));
    let receiver = service.start()?;

    let executor = Arc::new(DryRunExecutor::new());
    let engine_executor = Arc::clone(&executor);
    let engine_task = tokio::spawn(async move { engine.run(receiver, engine_executor.as_ref()).await });

    while observer.remaining().await > 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    // one more tick so the last batch is forwarded
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.stop().await?;

    let stats = engine_task.await??;
    println!("\nEngine statistics:");
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("Observer statistics: {:?}", service.get_stats());
    println!("Executor calls: {}", executor.executed_count());

    Ok(())
}

fn script(pool: Address) -> Vec<Vec<ObservedEvent>> {
    let attacker = Address::repeat_byte(0x01);
    let victim = Address::repeat_byte(0x02);
    let bystander = Address::repeat_byte(0x03);

    let trade = |seq: u64, trader: Address, direction: SwapDirection, price: f64| {
        ObservedEvent::Trade(TradeRecord {
            pool,
            trader,
            direction,
            amount_in: units(2),
            price_before: Price::from_f64(price),
            price_after: Price::from_f64(price),
            seq,
        })
    };
    let snapshot = |a: u64, b: u64, timestamp: u64| {
        ObservedEvent::Snapshot(PoolSnapshot { pool, balance_a: units(a), balance_b: units(b), timestamp })
    };

    vec![
        vec![ObservedEvent::Funding(units(5)), snapshot(1000, 1000, 0)],
        vec![
            trade(1, bystander, SwapDirection::BtoA, 1.0),
            trade(2, attacker, SwapDirection::AtoB, 1.0),
            trade(3, victim, SwapDirection::AtoB, 0.9),
            trade(4, attacker, SwapDirection::BtoA, 0.88),
        ],
        vec![snapshot(980, 1020, 12)],
        vec![snapshot(800, 1200, 24)],
        vec![snapshot(600, 1400, 36)],
        vec![snapshot(620, 1380, 48)],
        vec![snapshot(300, 1700, 400)],
    ]
}
