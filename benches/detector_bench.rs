use alloy_primitives::{Address, U256};
use criterion::{Criterion, criterion_group, criterion_main};
use lazy_static::lazy_static;
use sandwich_guard::{Detector, DetectorConfig, GuardEngineBuilder, Price, SwapDirection, TradeRecord};
use std::hint::black_box;

const POOL: Address = Address::repeat_byte(0xAA);

fn trade(seq: u64, trader: Address, direction: SwapDirection, price_before: Price) -> TradeRecord {
    TradeRecord {
        pool: POOL,
        trader,
        direction,
        amount_in: U256::from(1_000_000_000_000_000_000u64),
        price_before,
        price_after: price_before,
        seq,
    }
}

/// Repeating attacker / victim / attacker triples interleaved with unrelated traders
fn build_trades(count: u64) -> Vec<TradeRecord> {
    let fair = Price::ONE;
    let skewed = Price::from_f64(0.9);

    (0..count)
        .map(|seq| {
            let attacker = Address::repeat_byte((seq % 7) as u8 + 1);
            match seq % 4 {
                0 => trade(seq, attacker, SwapDirection::AtoB, fair),
                1 => trade(seq, Address::repeat_byte(0x50), SwapDirection::AtoB, skewed),
                2 => trade(seq, Address::repeat_byte(((seq - 2) % 7) as u8 + 1), SwapDirection::BtoA, skewed),
                _ => trade(seq, Address::repeat_byte(0x60), SwapDirection::BtoA, fair),
            }
        })
        .collect()
}

lazy_static! {
    static ref TRADES: Vec<TradeRecord> = build_trades(10_000);
}

fn benchmark_scan(c: &mut Criterion) {
    let narrow = Detector::new(DetectorConfig::default());
    let wide = Detector::new(DetectorConfig { window: 4, ..Default::default() });

    c.bench_function("detector_scan_window_1", |b| b.iter(|| narrow.scan(black_box(&TRADES))));
    c.bench_function("detector_scan_window_4", |b| b.iter(|| wide.scan(black_box(&TRADES))));
}

fn benchmark_engine_ingest(c: &mut Criterion) {
    c.bench_function("engine_ingest_10k_trades", |b| {
        b.iter(|| {
            let mut engine = GuardEngineBuilder::new().with_pool(POOL).build().unwrap();
            for trade in TRADES.iter() {
                black_box(engine.ingest_trade(*trade).unwrap());
            }
        })
    });
}

criterion_group!(benches, benchmark_scan, benchmark_engine_ingest);
criterion_main!(benches);
