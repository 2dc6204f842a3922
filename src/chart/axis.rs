/// Fixed x domain: sequence numbers 1 through 10 whatever the data length.
pub const X_DOMAIN: (u32, u32) = (1, 10);

/// A value axis starting at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAxis {
    pub max: f64,
    pub step: f64,
    pub ticks: Vec<f64>,
}

/// Roughly four intervals between zero and the data maximum.
const TARGET_INTERVALS: f64 = 4.0;

impl ValueAxis {
    /// Auto-scale to `data_max`: `[0, nice ceiling]`. With nothing to plot
    /// the axis is `[0, 1]`.
    pub fn fit(data_max: Option<f64>) -> Self {
        let data_max = data_max.filter(|m| m.is_finite() && *m > 0.0).unwrap_or(1.0);
        let step = nice_step(data_max / TARGET_INTERVALS);
        let intervals = (data_max / step).ceil().max(1.0) as usize;

        Self {
            max: step * intervals as f64,
            step,
            ticks: (0..=intervals).map(|i| step * i as f64).collect(),
        }
    }

    /// Tick label with as many decimals as the step needs.
    pub fn label(&self, value: f64) -> String {
        let decimals = (0..6usize)
            .find(|d| {
                let scaled = self.step * 10f64.powi(*d as i32);
                (scaled - scaled.round()).abs() < 1e-6
            })
            .unwrap_or(6);
        format!("{value:.decimals$}")
    }
}

/// Smallest of {1, 2, 2.5, 5, 10} × 10ⁿ that is ≥ `raw`.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|n| fraction <= *n + 1e-9)
        .unwrap_or(10.0);
    nice * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_axis_is_zero_to_one() {
        let axis = ValueAxis::fit(None);
        assert_eq!(axis.max, 1.0);
        assert_eq!(axis.ticks, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(axis.label(0.5), "0.50");
        assert_eq!(axis.label(0.25), "0.25");
    }

    #[test]
    fn ceiling_covers_the_maximum() {
        let axis = ValueAxis::fit(Some(42.0));
        assert_eq!(axis.step, 20.0);
        assert_eq!(axis.ticks, vec![0.0, 20.0, 40.0, 60.0]);
        assert_eq!(axis.label(40.0), "40");

        let axis = ValueAxis::fit(Some(100.0));
        assert_eq!(axis.max, 100.0);
        assert_eq!(axis.ticks.len(), 5);
    }

    #[test]
    fn zero_maximum_falls_back_to_unit_axis() {
        assert_eq!(ValueAxis::fit(Some(0.0)), ValueAxis::fit(None));
    }
}
