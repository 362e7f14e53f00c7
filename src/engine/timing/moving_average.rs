/// ### English
/// Exponential moving average over roughly `samples` recent values.
///
/// The first value seeds the average; each later value is blended in with weight `1 / samples`.
///
/// ### 中文
/// 大约覆盖最近 `samples` 个值的指数滑动平均。
///
/// 第一个值作为初值；之后每个值以 `1 / samples` 的权重混入。
#[derive(Clone, Debug)]
pub struct MovingAverage {
    weight: f64,
    average: Option<f64>,
}

impl MovingAverage {
    pub fn new(samples: u32) -> Self {
        Self {
            weight: 1.0 / f64::from(samples.max(1)),
            average: None,
        }
    }

    pub fn update(&mut self, sample: f64) {
        self.average = Some(match self.average {
            None => sample,
            Some(average) => average + (sample - average) * self.weight,
        });
    }

    #[inline]
    pub fn average(&self) -> Option<f64> {
        self.average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_seeds_then_blends() {
        let mut avg = MovingAverage::new(10);
        assert_eq!(avg.average(), None);
        avg.update(1_000.0);
        assert_eq!(avg.average(), Some(1_000.0));
        avg.update(2_000.0);
        let value = avg.average().unwrap_or_default();
        assert!((value - 1_100.0).abs() < 1e-9);
    }

    #[test]
    fn single_sample_window_tracks_latest() {
        let mut avg = MovingAverage::new(0);
        avg.update(3.0);
        avg.update(7.0);
        assert_eq!(avg.average(), Some(7.0));
    }
}
