// Average Directional Index (ADX) with the +DI / -DI lines
use super::rolling::{rolling_mean, rolling_sum};
use shared::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
    pub dx: Vec<Option<f64>>,
    pub adx: Vec<Option<f64>>,
}

/// Directional movement over `period`-bar rolling sums (no Wilder smoothing).
///
/// +DI/-DI are undefined while the rolling true-range sum is zero, DX is undefined
/// when both DI lines are zero, and ADX needs `period` consecutive defined DX values.
pub struct Adx {
    period: usize,
}

impl Default for Adx {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn calculate(&self, data: &[Bar]) -> AdxSeries {
        let n = data.len();
        let mut true_range = vec![None; n];
        let mut plus_dm = vec![None; n];
        let mut minus_dm = vec![None; n];

        for i in 1..n {
            let (bar, prev) = (&data[i], &data[i - 1]);
            true_range[i] = Some(
                (bar.high - bar.low)
                    .max((bar.high - prev.close).abs())
                    .max((bar.low - prev.close).abs()),
            );

            let up_move = bar.high - prev.high;
            let down_move = prev.low - bar.low;
            plus_dm[i] = Some(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
            minus_dm[i] = Some(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        }

        let tr_sum = rolling_sum(&true_range, self.period);
        let plus_sum = rolling_sum(&plus_dm, self.period);
        let minus_sum = rolling_sum(&minus_dm, self.period);

        let directional = |dm: &[Option<f64>]| -> Vec<Option<f64>> {
            tr_sum
                .iter()
                .zip(dm)
                .map(|(tr, dm)| match (tr, dm) {
                    (Some(tr), Some(dm)) if *tr > 0.0 => Some(100.0 * dm / tr),
                    _ => None,
                })
                .collect()
        };
        let plus_di = directional(&plus_sum[..]);
        let minus_di = directional(&minus_sum[..]);

        let dx: Vec<Option<f64>> = plus_di
            .iter()
            .zip(&minus_di)
            .map(|(p, m)| match (p, m) {
                (Some(p), Some(m)) if p + m > 0.0 => Some(100.0 * (p - m).abs() / (p + m)),
                _ => None,
            })
            .collect();
        let adx = rolling_mean(&dx, self.period);

        AdxSeries { plus_di, minus_di, dx, adx }
    }
}
