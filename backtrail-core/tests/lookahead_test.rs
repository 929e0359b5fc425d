//! Look-ahead contamination tests for indicators and signal generators.
//!
//! Invariant: no value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Bars 0..100 must match between both runs. Any difference
//! means future data leaked into past values.

use backtrail_core::domain::{PriceBar, Signal};
use backtrail_core::indicators::{Bollinger, Indicator, Rsi, Sma};
use backtrail_core::signals::{generate_signals, StrategyConfig, StrategySpec};
use chrono::{Duration, TimeZone, Utc};

/// N daily bars of a deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<PriceBar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut price = 100.0;

    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = (price + change).max(10.0);

            PriceBar {
                symbol: "TEST".to_string(),
                timestamp: base + Duration::days(i as i64),
                open: price - 0.5,
                high: price + 2.0,
                low: price - 2.0,
                close: price,
                volume: 1000 + i as u64 * 100,
            }
        })
        .collect()
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[PriceBar], truncated_len: usize) {
    let full = indicator.compute(full_bars);
    let truncated = indicator.compute(&full_bars[..truncated_len]);

    assert_eq!(truncated.len(), truncated_len, "{}: length", indicator.name());
    assert_eq!(full.len(), full_bars.len(), "{}: length", indicator.name());

    for i in 0..truncated_len {
        let (t, f) = (truncated[i], full[i]);
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{}: NaN mismatch at bar {i} (truncated={t}, full={f})",
            indicator.name()
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{}: look-ahead contamination at bar {i}: truncated={t}, full={f}",
            indicator.name()
        );
    }
}

#[test]
fn lookahead_sma() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Sma::new(10), &bars, 100);
    assert_no_lookahead(&Sma::new(50), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&Rsi::new(7), &bars, 100);
}

#[test]
fn lookahead_bollinger() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Bollinger::upper(20, 2.0), &bars, 100);
    assert_no_lookahead(&Bollinger::middle(20, 2.0), &bars, 100);
    assert_no_lookahead(&Bollinger::lower(20, 2.0), &bars, 100);
}

fn signals_for(config: &StrategyConfig, bars: &[PriceBar]) -> Vec<Signal> {
    generate_signals(config.build().as_ref(), bars).signals
}

#[test]
fn lookahead_signals_all_strategies() {
    let bars = make_test_bars(200);
    let configs = [
        StrategyConfig::from_spec(
            &StrategySpec::named("moving_average")
                .with_param("short_window", 5.0)
                .with_param("long_window", 20.0),
        )
        .unwrap(),
        StrategyConfig::from_spec(
            &StrategySpec::named("rsi_ma")
                .with_param("short_window", 5.0)
                .with_param("long_window", 20.0)
                .with_param("rsi_period", 7.0),
        )
        .unwrap(),
        StrategyConfig::from_spec(&StrategySpec::named("bollinger").with_param("window", 10.0))
            .unwrap(),
    ];

    for config in &configs {
        let full = signals_for(config, &bars);
        let truncated = signals_for(config, &bars[..100]);
        assert_eq!(truncated[..], full[..100], "{config}: signal look-ahead");
    }
}

#[test]
fn signals_hold_through_warmup() {
    let bars = make_test_bars(60);
    let config = StrategyConfig::default();
    let signals = signals_for(&config, &bars);
    assert!(signals[..config.warmup_bars()]
        .iter()
        .all(|s| *s == Signal::Hold));
}
