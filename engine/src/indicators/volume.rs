// Volume spike ratio: current volume against its trailing mean
use super::rolling::rolling_mean;
use super::IndicatorCalculator;
use serde_json::Value;
use shared::Bar;

pub struct VolumeRatio {
    name: String,
    period: usize,
}

impl VolumeRatio {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("VolumeRatio({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for VolumeRatio {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    /// The trailing mean includes the current bar. A zero mean yields a neutral 1.0.
    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>> {
        let volumes: Vec<Option<f64>> = data.iter().map(|b| Some(b.volume as f64)).collect();
        rolling_mean(&volumes, self.period)
            .into_iter()
            .zip(data)
            .map(|(mean, bar)| {
                mean.map(|avg| if avg == 0.0 { 1.0 } else { bar.volume as f64 / avg })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::create_ohlc_bar;

    fn with_volumes(volumes: &[u64]) -> Vec<Bar> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &v)| create_ohlc_bar(i, 11.0, 9.0, 10.0, v))
            .collect()
    }

    #[test]
    fn test_spike_ratio() {
        let mut volumes = vec![1_000_000; 20];
        volumes[19] = 2_000_000;
        let results = VolumeRatio::new(20).calculate(&with_volumes(&volumes));
        assert_eq!(results[18], None);
        let ratio = results[19].unwrap();
        assert!((ratio - 2_000_000.0 / 1_050_000.0).abs() < 1e-12);
        assert!(ratio > 1.5);
    }

    #[test]
    fn test_constant_volume_is_one() {
        let results = VolumeRatio::new(20).calculate(&with_volumes(&[500; 25]));
        assert_eq!(results[24], Some(1.0));
    }

    #[test]
    fn test_zero_volume_is_neutral() {
        let results = VolumeRatio::new(20).calculate(&with_volumes(&[0; 20]));
        assert_eq!(results[19], Some(1.0));
    }
}
