use std::collections::BTreeMap;

use crate::TypeSummary;
use crate::packet::ensemble::Ensemble;

#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    count: u64,
    first_timestamp: f64,
    last_timestamp: f64,
}

/// Per-tag counters, keyed by tag value for stable ordering.
#[derive(Debug, Default)]
pub(crate) struct TypeStats {
    entries: BTreeMap<u8, (&'static str, TypeEntry)>,
}

impl TypeStats {
    pub(crate) fn add(&mut self, ensemble: &Ensemble) {
        let tag = ensemble.data_type();
        let ts = ensemble.timestamp();
        self.entries
            .entry(tag.value())
            .and_modify(|(_, entry)| {
                entry.count += 1;
                entry.last_timestamp = ts;
            })
            .or_insert((
                tag.name(),
                TypeEntry {
                    count: 1,
                    first_timestamp: ts,
                    last_timestamp: ts,
                },
            ));
    }

    pub(crate) fn into_summaries(self) -> Vec<TypeSummary> {
        self.entries
            .into_iter()
            .map(|(data_type, (name, entry))| TypeSummary {
                data_type,
                name: name.to_string(),
                count: entry.count,
                first_timestamp: entry.first_timestamp,
                last_timestamp: entry.last_timestamp,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::ensemble::{Payload, Thermal};

    #[test]
    fn summaries_are_sorted_by_tag() {
        let mut stats = TypeStats::default();
        stats.add(&Ensemble::new(30, Payload::Battery { millivolts: 4000 }));
        stats.add(&Ensemble::new(
            10,
            Payload::TempWater(Thermal { temp: 0, water: 0 }),
        ));
        stats.add(&Ensemble::new(5, Payload::Battery { millivolts: 3900 }));

        let summaries = stats.into_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].data_type, 1);
        assert_eq!(summaries[0].name, "temp_water");
        assert_eq!(summaries[1].data_type, 7);
        assert_eq!(summaries[1].count, 2);
        assert_eq!(summaries[1].first_timestamp, 3.0);
        assert_eq!(summaries[1].last_timestamp, 0.5);
    }
}
