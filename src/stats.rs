use std::collections::HashMap;

/// Outcome of resolving one address. Every failure collapses into `Unresolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult {
    Resolved { asn: u32 },
    /// The service answered but named no autonomous system.
    Unattributed,
    Unresolved,
}

/// An (ASN, occurrences) pair in a ranking.
pub type AsnCount = (u32, u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounters {
    pub total: u64,
    pub checked: u64,
    pub failed: u64,
    pub unattributed: u64,
}

impl ProgressCounters {
    /// Shown as "IPs checked": completed lookups minus the failed ones.
    pub fn succeeded(&self) -> u64 {
        self.checked - self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.checked == self.total
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub counters: ProgressCounters,
    pub ranking: Vec<AsnCount>,
    pub distinct_asns: usize,
}

/// Sole owner of the occurrence table and the progress counters.
#[derive(Debug)]
pub struct Aggregator {
    occurrences: HashMap<u32, u64>,
    counters: ProgressCounters,
}

impl Aggregator {
    pub fn new(total: usize) -> Self {
        Self {
            occurrences: HashMap::new(),
            counters: ProgressCounters {
                total: total as u64,
                ..ProgressCounters::default()
            },
        }
    }

    pub fn record(&mut self, result: LookupResult) {
        debug_assert!(self.counters.checked < self.counters.total, "more results than targets");
        self.counters.checked += 1;
        match result {
            LookupResult::Resolved { asn } => *self.occurrences.entry(asn).or_insert(0) += 1,
            LookupResult::Unattributed => self.counters.unattributed += 1,
            LookupResult::Unresolved => self.counters.failed += 1,
        }
    }

    /// The `n` most frequent ASNs, highest count first; equal counts are ordered by ASN.
    pub fn top_k(&self, n: usize) -> Vec<AsnCount> {
        let mut ranking: Vec<AsnCount> = self
            .occurrences
            .iter()
            .map(|(&asn, &count)| (asn, count))
            .collect();
        ranking.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranking.truncate(n);
        ranking
    }

    pub fn counters(&self) -> ProgressCounters {
        self.counters
    }

    #[cfg(test)]
    fn occurrences(&self, asn: u32) -> u64 {
        self.occurrences.get(&asn).copied().unwrap_or(0)
    }

    pub fn distinct_asns(&self) -> usize {
        self.occurrences.len()
    }
}
