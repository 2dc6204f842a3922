use serde::Serialize;

use super::percentiles::PercentileSet;
use crate::controller::{Sample, Topology};

/// Latency breakdown for one topology across a run's samples.
#[derive(Debug, Clone, Serialize)]
pub struct TopologySummary {
    pub processing: PercentileSet,
    pub end_to_end: PercentileSet,
    pub cold_starts: u64,
}

/// Per-topology summary of the current sample list. A topology with no
/// readings is `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub global: Option<TopologySummary>,
    pub regional: Option<TopologySummary>,
}

impl RunSummary {
    pub fn from_samples(samples: &[Sample]) -> Self {
        Self {
            global: TopologySummary::collect(samples, Topology::Global),
            regional: TopologySummary::collect(samples, Topology::Regional),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Topology, &TopologySummary)> {
        [(Topology::Global, &self.global), (Topology::Regional, &self.regional)]
            .into_iter()
            .filter_map(|(t, s)| s.as_ref().map(|s| (t, s)))
    }
}

impl TopologySummary {
    fn collect(samples: &[Sample], topology: Topology) -> Option<Self> {
        let readings: Vec<_> = samples.iter().filter_map(|s| s.reading(topology)).collect();
        if readings.is_empty() {
            return None;
        }

        Some(Self {
            processing: PercentileSet::from_millis(readings.iter().map(|r| r.processing_time_ms)),
            end_to_end: PercentileSet::from_millis(readings.iter().map(|r| r.end_to_end_ms)),
            cold_starts: readings.iter().filter(|r| r.cold_start).count() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TopologyReading;

    fn reading(processing: f64, cold: bool) -> TopologyReading {
        TopologyReading {
            processing_time_ms: processing,
            cold_start: cold,
            end_to_end_ms: processing + 5.0,
        }
    }

    #[test]
    fn only_present_topologies_are_summarised() {
        let samples: Vec<Sample> = (1..=5)
            .map(|i| Sample {
                fetch_num: i,
                global: Some(reading(i as f64, i == 1)),
                regional: None,
            })
            .collect();

        let summary = RunSummary::from_samples(&samples);

        assert!(summary.regional.is_none());
        let global = summary.global.as_ref().unwrap();
        assert_eq!(global.processing.count, 5);
        assert_eq!(global.cold_starts, 1);
        assert_eq!(global.processing.min, 1_000);
        assert_eq!(summary.iter().count(), 1);
    }

    #[test]
    fn empty_sample_list_has_no_series() {
        let summary = RunSummary::from_samples(&[]);
        assert!(summary.global.is_none() && summary.regional.is_none());
    }
}
