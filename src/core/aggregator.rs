use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::{
    core::{reading::IntervalReading, rule::PricingRule},
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Finalized daily totals for one rule, keyed by UTC calendar date.
pub type DayBuckets = BTreeMap<NaiveDate, KilowattHours>;

/// De-duplication guard width.
///
/// Any reading at or before this far past the last persisted bucket start is
/// considered already counted. One day is deliberately conservative: it
/// re-admits the tail of the boundary day rather than risking double counts.
/// The threshold has been tuned before and may be again; treat it as policy,
/// not invariant.
pub const DEAD_ZONE: Days = Days::new(1);

/// The still-open bucket while walking the reading stream.
struct RunState {
    /// First reading of the day being accumulated, with its original clock
    /// time: the midnight-continuation rule below needs it.
    reference: DateTime<Utc>,
    value: KilowattHours,
}

/// Re-bucket a reading stream into daily totals for one rule.
///
/// Walks the readings once, in source order. The input is assumed to be
/// chronologically ascending; out-of-order input is undefined and not
/// defended against.
///
/// A reading is accumulated when its clock time falls inside one of the
/// rule's windows and it lies past the dead zone. Day boundaries are detected
/// from the readings themselves rather than from fixed local-time boundaries:
/// a load curve regularly ends a day with a `00:00` sample that carries the
/// next calendar date but semantically closes the previous day, and that
/// sample is folded into the still-open bucket.
pub fn aggregate(
    readings: &[IntervalReading],
    rule: &PricingRule,
    last_persisted_start: Option<DateTime<Utc>>,
) -> DayBuckets {
    let cutoff = last_persisted_start.and_then(|start| start.checked_add_days(DEAD_ZONE));
    let mut buckets = DayBuckets::new();
    let mut open: Option<RunState> = None;

    for reading in readings {
        if !rule.matches(reading.timestamp.time()) {
            continue;
        }
        if cutoff.is_some_and(|cutoff| reading.timestamp <= cutoff) {
            continue;
        }
        let energy = reading.effective_energy();

        match open.as_mut() {
            None => {
                open = Some(RunState { reference: reading.timestamp, value: energy });
            }
            Some(state) if reading.timestamp.date_naive() == state.reference.date_naive() => {
                state.value += energy;
            }
            Some(state)
                if reading.timestamp.time() == NaiveTime::MIN
                    && state.reference.time() != NaiveTime::MIN =>
            {
                // The day's closing sample: belongs to the next calendar
                // date, counts towards the open one.
                state.value += energy;
            }
            Some(state) => {
                let closed =
                    std::mem::replace(state, RunState { reference: reading.timestamp, value: energy });
                finalize(&mut buckets, &closed, &rule.statistic_id);
            }
        }
    }

    // Terminal transition: no implicit flush of an empty bucket.
    if let Some(state) = open
        && state.value.is_positive()
    {
        finalize(&mut buckets, &state, &rule.statistic_id);
    }

    buckets
}

fn finalize(buckets: &mut DayBuckets, state: &RunState, statistic_id: &str) {
    let date = state.reference.date_naive();
    // Re-merge defensively in case an earlier pass already closed this date.
    let total = buckets.entry(date).or_insert(KilowattHours::ZERO);
    *total += state.value;
    debug!(statistic_id, %date, value = %total, "finalized a bucket");
}
