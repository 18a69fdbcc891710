use chrono::{DateTime, Duration, Utc};

use crate::models::history::HistoryEvent;
use crate::models::parcel::Parcel;
use crate::store::ParcelRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionPolicy {
    /// Step index is whole days since creation. Suspension is ignored and
    /// every missed step is written on the next lookup.
    ElapsedDays,
    /// One step per elapsed interval since the last update, and at most one
    /// step per lookup. Suspended parcels stay put.
    Interval { every: Duration },
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        ProgressionPolicy::Interval {
            every: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub should_advance: bool,
    /// Route index of the next unrecorded step.
    pub next_event_index: usize,
    /// Route index the parcel sits at once this evaluation is committed.
    pub current_step: usize,
}

pub fn evaluate(
    policy: ProgressionPolicy,
    parcel: &Parcel,
    recorded_steps: usize,
    now: DateTime<Utc>,
) -> Evaluation {
    let steps = parcel.route.len();
    let current = parcel.current_step.min(steps.saturating_sub(1));

    let idle = Evaluation {
        should_advance: false,
        next_event_index: recorded_steps,
        current_step: current,
    };

    if steps == 0 {
        return idle;
    }

    match policy {
        ProgressionPolicy::ElapsedDays => {
            let target = elapsed_days(parcel.created_at, now).min(steps - 1);
            Evaluation {
                should_advance: recorded_steps <= target,
                next_event_index: recorded_steps,
                current_step: target,
            }
        }
        ProgressionPolicy::Interval { every } => {
            if parcel.suspended || recorded_steps >= steps {
                return idle;
            }

            let since = now - parcel.last_updated.max(parcel.created_at);
            if since < every {
                return idle;
            }

            Evaluation {
                should_advance: true,
                next_event_index: recorded_steps,
                current_step: recorded_steps,
            }
        }
    }
}

/// Commits an evaluation against the record and returns the events appended.
pub fn advance(
    policy: ProgressionPolicy,
    record: &mut ParcelRecord,
    now: DateTime<Utc>,
) -> Vec<HistoryEvent> {
    let evaluation = evaluate(policy, &record.parcel, record.recorded_steps(), now);
    if !evaluation.should_advance {
        return Vec::new();
    }

    let appended: Vec<HistoryEvent> = (evaluation.next_event_index..=evaluation.current_step)
        .map(|idx| step_event(&record.parcel, idx, now))
        .collect();

    let parcel = &mut record.parcel;
    parcel.current_step = evaluation.current_step;
    parcel.current_location = parcel.route[evaluation.current_step].location.clone();
    parcel.touch(now);

    record.history.extend(appended.iter().cloned());
    appended
}

/// History entry for route position `idx`.
pub fn step_event(parcel: &Parcel, idx: usize, at: DateTime<Utc>) -> HistoryEvent {
    let step = &parcel.route[idx];
    HistoryEvent {
        tracking_number: parcel.tracking_number.clone(),
        location: step.location.clone(),
        status: step.status,
        step_number: idx,
        timestamp: at,
    }
}

fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> usize {
    (to - from).num_days().max(0) as usize
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{ProgressionPolicy, advance, evaluate, step_event};
    use crate::engine::route::{DEFAULT_STOPS, generate_route};
    use crate::models::parcel::Parcel;
    use crate::store::ParcelRecord;

    fn seeded_record(now: chrono::DateTime<Utc>) -> ParcelRecord {
        let route = generate_route(
            "Berlin, Germany",
            "Tokyo, Japan",
            DEFAULT_STOPS,
            &mut StdRng::seed_from_u64(11),
        );
        let parcel = Parcel::new(
            "1Z0000000000000001".to_string(),
            "Berlin, Germany".to_string(),
            "Tokyo, Japan".to_string(),
            route,
            now,
        );
        let mut record = ParcelRecord::new(parcel);
        let first = step_event(&record.parcel, 0, now);
        record.append(first);
        record
    }

    #[test]
    fn interval_appends_one_event_then_waits() {
        let policy = ProgressionPolicy::default();
        let start = Utc::now();
        let mut record = seeded_record(start);

        let later = start + Duration::hours(25);
        let appended = advance(policy, &mut record, later);

        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].location, record.parcel.route[1].location);
        assert_eq!(appended[0].step_number, 1);
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.parcel.last_updated, later);
        assert_eq!(record.parcel.current_step, 1);

        let again = advance(policy, &mut record, later + Duration::minutes(5));
        assert!(again.is_empty());
        assert_eq!(record.history.len(), 2);
    }

    #[test]
    fn interval_catches_up_one_step_per_lookup() {
        let policy = ProgressionPolicy::default();
        let start = Utc::now();
        let mut record = seeded_record(start);

        let much_later = start + Duration::days(10);
        assert_eq!(advance(policy, &mut record, much_later).len(), 1);
        assert_eq!(record.recorded_steps(), 2);
    }

    #[test]
    fn exactly_at_interval_boundary_advances() {
        let policy = ProgressionPolicy::default();
        let start = Utc::now();
        let mut record = seeded_record(start);

        assert!(advance(policy, &mut record, start + Duration::hours(23)).is_empty());
        assert_eq!(advance(policy, &mut record, start + Duration::hours(24)).len(), 1);
    }

    #[test]
    fn suspended_parcel_never_advances_under_interval() {
        let policy = ProgressionPolicy::default();
        let start = Utc::now();
        let mut record = seeded_record(start);
        record.parcel.suspended = true;

        for days in [1, 5, 30, 365] {
            let appended = advance(policy, &mut record, start + Duration::days(days));
            assert!(appended.is_empty());
        }
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.parcel.last_updated, start);
    }

    #[test]
    fn interval_stops_at_route_end_and_reports_delivered() {
        let policy = ProgressionPolicy::default();
        let start = Utc::now();
        let mut record = seeded_record(start);
        let steps = record.parcel.route.len();

        let mut now = start;
        for _ in 0..steps * 2 {
            now += Duration::hours(24);
            advance(policy, &mut record, now);
        }

        assert_eq!(record.recorded_steps(), steps);
        assert_eq!(record.parcel.current_step, steps - 1);
        assert!(record.parcel.is_delivered());
        assert_eq!(
            record.parcel.current_location,
            record.parcel.route[steps - 1].location
        );
    }

    #[test]
    fn delivered_flag_tracks_last_index_only() {
        let policy = ProgressionPolicy::default();
        let start = Utc::now();
        let mut record = seeded_record(start);
        let steps = record.parcel.route.len();

        let mut now = start;
        for step in 1..steps {
            assert!(!record.parcel.is_delivered());
            now += Duration::hours(24);
            advance(policy, &mut record, now);
            assert_eq!(record.parcel.current_step, step);
        }
        assert!(record.parcel.is_delivered());
    }

    #[test]
    fn elapsed_days_writes_every_missed_step_and_ignores_suspension() {
        let policy = ProgressionPolicy::ElapsedDays;
        let start = Utc::now();
        let mut record = seeded_record(start);
        record.parcel.suspended = true;

        let appended = advance(policy, &mut record, start + Duration::days(3) + Duration::hours(1));
        let steps: Vec<usize> = appended.iter().map(|e| e.step_number).collect();

        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(record.parcel.current_step, 3);
        assert_eq!(record.recorded_steps(), 4);
    }

    #[test]
    fn elapsed_days_clamps_to_last_step() {
        let policy = ProgressionPolicy::ElapsedDays;
        let start = Utc::now();
        let record = seeded_record(start);
        let steps = record.parcel.route.len();

        let evaluation = evaluate(policy, &record.parcel, 1, start + Duration::days(400));
        assert!(evaluation.should_advance);
        assert_eq!(evaluation.current_step, steps - 1);

        let idle = evaluate(policy, &record.parcel, steps, start + Duration::days(400));
        assert!(!idle.should_advance);
    }

    #[test]
    fn parcel_without_route_is_left_alone() {
        let start = Utc::now();
        let parcel = Parcel::new(
            "1Z0000000000000002".to_string(),
            "a".to_string(),
            "b".to_string(),
            Vec::new(),
            start,
        );
        let mut record = ParcelRecord::new(parcel);

        for policy in [ProgressionPolicy::ElapsedDays, ProgressionPolicy::default()] {
            assert!(advance(policy, &mut record, start + Duration::days(9)).is_empty());
        }
    }
}
