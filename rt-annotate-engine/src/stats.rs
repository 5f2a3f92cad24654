//! Store statistics

use crate::store::Store;

/// Totals over every event of a store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreStats {
    /// Number of events
    pub events: usize,
    /// Number of annotations over all events
    pub annotations: usize,
    /// Sum over events of the time between first and last annotation (seconds)
    pub annotated_time: f64,
}

impl StoreStats {
    /// Compute the statistics of a store
    pub fn of(store: &Store) -> Self {
        let mut stats = StoreStats {
            events: 0,
            annotations: 0,
            annotated_time: 0.0,
        };
        for (_, event) in store.events() {
            stats.events += 1;
            stats.annotations += event.annotations.len();
            stats.annotated_time += event.annotations.time_span();
        }
        stats
    }

    /// Average number of annotations per event
    pub fn annotations_per_event(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.annotations as f64 / self.events as f64
        }
    }

    /// Average annotated time per event (seconds)
    pub fn time_per_event(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.annotated_time / self.events as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeValue;

    #[test]
    fn test_empty_store() {
        let stats = StoreStats::of(&Store::new());
        assert_eq!(stats.events, 0);
        assert_eq!(stats.annotations_per_event(), 0.0);
        assert_eq!(stats.time_per_event(), 0.0);
    }

    #[test]
    fn test_stats_over_events() {
        let mut store = Store::new();
        store.load_keys("i inspired").unwrap();
        for (event_name, times) in [("a", vec![10.0, 70.0]), ("b", vec![5.0]), ("c", vec![])] {
            let (event, keys, _) = store.process_parts(event_name);
            for seconds in times {
                event
                    .annotations
                    .add(TimeValue::from_seconds(seconds), 'i', keys)
                    .unwrap();
            }
        }

        let stats = StoreStats::of(&store);
        assert_eq!(stats.events, 3);
        assert_eq!(stats.annotations, 3);
        assert_eq!(stats.annotated_time, 60.0);
        assert_eq!(stats.annotations_per_event(), 1.0);
        assert_eq!(stats.time_per_event(), 20.0);
    }
}
