use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::audit::{AuditLog, EventKind};

#[derive(Debug, Clone, Copy, Default)]
struct ViolationRecord {
    count: u32,
    blocked_until: Option<Instant>,
}

/// Per-IP violation counters with threshold blocking.
///
/// Blocking is a strict threshold trip, not a decaying score: after
/// `threshold` violations the IP is denied for `block_duration`, then the
/// slate is wiped clean. Expiry is observed lazily on the next check; there
/// is no background sweep. Records for IPs that stop offending are kept for
/// the process lifetime (accepted slow growth, one small record per IP).
pub struct ViolationLedger {
    records: Mutex<HashMap<IpAddr, ViolationRecord>>,
    threshold: u32,
    block_duration: Duration,
    audit: Arc<AuditLog>,
}

impl ViolationLedger {
    pub fn new(threshold: u32, block_duration: Duration, audit: Arc<AuditLog>) -> Self {
        Self { records: Mutex::new(HashMap::new()), threshold, block_duration, audit }
    }

    /// Records a violation and returns `true` if this one tripped the block
    /// threshold.
    ///
    /// Increment, threshold check and block set happen under one lock so two
    /// concurrent violations cannot both read count = threshold-1 and lose
    /// the trip.
    pub fn record_violation(&self, ip: IpAddr, reason: &str) -> bool {
        let (count, tripped) = {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            let record = records.entry(ip).or_default();
            record.count += 1;
            let tripped = record.count >= self.threshold && record.blocked_until.is_none();
            if tripped {
                record.blocked_until = Some(Instant::now() + self.block_duration);
            }
            (record.count, tripped)
        };

        self.audit.append(EventKind::Violation, ip, reason, Some(count));
        if tripped {
            self.audit.append(
                EventKind::IpBlocked,
                ip,
                &format!("Blocked for {}s", self.block_duration.as_secs()),
                Some(count),
            );
        }
        tripped
    }

    /// Checks whether the IP is currently blocked.
    ///
    /// A record whose block has expired is treated exactly like no record:
    /// the expiry observation clears the violation count and the deadline.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let Some(record) = records.get_mut(&ip) else {
            return false;
        };
        match record.blocked_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                // Block expired: clean slate
                record.count = 0;
                record.blocked_until = None;
                false
            }
            None => false,
        }
    }

    /// Number of IPs whose block deadline is still in the future.
    pub fn blocked_count(&self) -> usize {
        let now = Instant::now();
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.values().filter(|r| r.blocked_until.is_some_and(|u| now < u)).count()
    }

    /// Sum of all violation counts, including unblocked offenders.
    pub fn total_violations(&self) -> u64 {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.values().map(|r| u64::from(r.count)).sum()
    }

    /// The `n` IPs with the highest violation counts, descending.
    pub fn top_violators(&self, n: usize) -> Vec<(IpAddr, u32)> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut counts: Vec<(IpAddr, u32)> =
            records.iter().filter(|(_, r)| r.count > 0).map(|(ip, r)| (*ip, r.count)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(n);
        counts
    }
}
