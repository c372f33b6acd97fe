// CSV result sink for scan snapshots and backtest signals
use crate::error::EngineError;
use crate::services::scanner::{ScanOutcome, TickerReport};
use shared::BacktestSignal;
use std::collections::BTreeSet;
use std::io::Write;

/// A backtest signal tagged with the ticker that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub ticker: String,
    pub signal: BacktestSignal,
}

impl SignalRecord {
    pub fn from_signal(ticker: &str, signal: &BacktestSignal) -> Self {
        Self {
            ticker: ticker.to_string(),
            signal: signal.clone(),
        }
    }
}

/// Flattens every scored ticker's signals, in report order.
pub fn signal_records(reports: &[TickerReport]) -> Vec<SignalRecord> {
    reports
        .iter()
        .flat_map(|report| {
            report
                .signals()
                .iter()
                .map(move |signal| SignalRecord::from_signal(&report.ticker, signal))
        })
        .collect()
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Header: `ticker,date,entry_price,momentum_score,return_<h>d...`. A missing horizon is an empty cell.
pub fn write_signals_csv<W: Write>(
    writer: W,
    holding_periods: &BTreeSet<usize>,
    records: &[SignalRecord],
) -> Result<(), EngineError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![
        "ticker".to_string(),
        "date".to_string(),
        "entry_price".to_string(),
        "momentum_score".to_string(),
    ];
    header.extend(holding_periods.iter().map(|h| format!("return_{}d", h)));
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.ticker.clone(),
            record.signal.trigger_date.format("%Y-%m-%d").to_string(),
            record.signal.entry_price.to_string(),
            record.signal.momentum_score.to_string(),
        ];
        row.extend(
            holding_periods
                .iter()
                .map(|&h| optional(record.signal.forward_return(h))),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

const SNAPSHOT_HEADER: [&str; 20] = [
    "ticker",
    "status",
    "date",
    "close",
    "momentum_score",
    "trend",
    "ema20",
    "ema50",
    "ema200",
    "rsi14",
    "macd",
    "macd_signal",
    "macd_histogram",
    "adx14",
    "plus_di14",
    "minus_di14",
    "volume_ratio",
    "bullish_crossover",
    "bearish_crossover",
    "signals",
];

/// One row per ticker. Indicator columns stay empty unless the ticker was scored;
/// a failed ticker carries its reason in the `trend` column.
pub fn write_snapshots_csv<W: Write>(writer: W, reports: &[TickerReport]) -> Result<(), EngineError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SNAPSHOT_HEADER)?;

    for report in reports {
        let mut row = vec![report.ticker.clone(), report.outcome.status().to_string()];
        match &report.outcome {
            ScanOutcome::Scored { snapshot: s, signals } => {
                row.extend([
                    s.date.format("%Y-%m-%d").to_string(),
                    s.close.to_string(),
                    s.momentum_score.to_string(),
                    s.trend_label.to_string(),
                    s.ema20.to_string(),
                    s.ema50.to_string(),
                    s.ema200.to_string(),
                    s.rsi14.to_string(),
                    s.macd.to_string(),
                    s.macd_signal.to_string(),
                    s.macd_histogram.to_string(),
                    s.adx14.to_string(),
                    s.plus_di14.to_string(),
                    s.minus_di14.to_string(),
                    s.volume_ratio.to_string(),
                    s.bullish_crossover.to_string(),
                    s.bearish_crossover.to_string(),
                    signals.len().to_string(),
                ]);
            }
            ScanOutcome::Indeterminate { .. } => {
                row.resize(SNAPSHOT_HEADER.len(), String::new());
            }
            ScanOutcome::Failed { reason } => {
                row.extend([String::new(), String::new(), String::new(), reason.clone()]);
                row.resize(SNAPSHOT_HEADER.len(), String::new());
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::{IndicatorSnapshot, TrendLabel};
    use std::collections::BTreeMap;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn signal(returns: &[(usize, f64)]) -> BacktestSignal {
        BacktestSignal {
            bar_index: 60,
            trigger_date: date(4),
            entry_price: 12.5,
            momentum_score: 85,
            forward_returns: returns.iter().copied().collect::<BTreeMap<_, _>>(),
        }
    }

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            date: date(29),
            close: 101.5,
            ema20: 100.0,
            ema50: 98.0,
            ema200: 90.0,
            rsi14: 65.25,
            macd: 1.5,
            macd_signal: 1.0,
            macd_histogram: 0.5,
            macd_above_signal: true,
            adx14: 31.0,
            plus_di14: 28.0,
            minus_di14: 12.0,
            volume_ratio: 1.6,
            bullish_crossover: false,
            bearish_crossover: false,
            momentum_score: 90,
            trend_label: TrendLabel::Strong,
        }
    }

    fn output<F: FnOnce(&mut Vec<u8>) -> Result<(), EngineError>>(write: F) -> String {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_signals_csv_columns_follow_holding_periods() {
        let periods: BTreeSet<usize> = [20, 5, 10].into_iter().collect();
        let records = vec![
            SignalRecord::from_signal("ACME", &signal(&[(5, 2.5), (10, -1.25), (20, 4.0)])),
            SignalRecord::from_signal("BOLT", &signal(&[(5, 0.0)])),
        ];
        let text = output(|buf| write_signals_csv(buf, &periods, &records));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ticker,date,entry_price,momentum_score,return_5d,return_10d,return_20d");
        assert_eq!(lines[1], "ACME,2024-03-04,12.5,85,2.5,-1.25,4");
        assert_eq!(lines[2], "BOLT,2024-03-04,12.5,85,0,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_snapshots_csv_rows_per_status() {
        let reports = vec![
            TickerReport {
                ticker: "ACME".to_string(),
                outcome: ScanOutcome::Scored {
                    snapshot: snapshot(),
                    signals: vec![signal(&[(5, 1.0)])],
                },
            },
            TickerReport {
                ticker: "SHORT".to_string(),
                outcome: ScanOutcome::Indeterminate { available: 12 },
            },
            TickerReport {
                ticker: "DOWN".to_string(),
                outcome: ScanOutcome::Failed {
                    reason: "timeout".to_string(),
                },
            },
        ];
        let text = output(|buf| write_snapshots_csv(buf, &reports));
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), SNAPSHOT_HEADER.len());

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "ACME");
        assert_eq!(&rows[0][2], "2024-03-29");
        assert_eq!(&rows[0][4], "90");
        assert_eq!(&rows[0][5], "Strong");
        assert_eq!(&rows[0][19], "1");

        assert_eq!(&rows[1][1], "indeterminate");
        assert!(rows[1].iter().skip(2).all(|cell| cell.is_empty()));

        assert_eq!(&rows[2][1], "failed");
        assert_eq!(&rows[2][5], "timeout");
        assert_eq!(rows[2].len(), SNAPSHOT_HEADER.len());
    }

    #[test]
    fn test_signal_records_flatten_in_report_order() {
        let reports = vec![
            TickerReport {
                ticker: "B".to_string(),
                outcome: ScanOutcome::Scored {
                    snapshot: snapshot(),
                    signals: vec![signal(&[(5, 1.0)]), signal(&[(5, 2.0)])],
                },
            },
            TickerReport {
                ticker: "A".to_string(),
                outcome: ScanOutcome::Indeterminate { available: 3 },
            },
        ];
        let records = signal_records(&reports);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.ticker == "B"));
        assert_eq!(records[1].signal.forward_return(5), Some(2.0));
    }
}
