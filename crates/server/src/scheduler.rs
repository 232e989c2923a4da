//! Cancellable job schedule for one session.
//!
//! Time is a `Duration` since the session epoch, supplied by the caller.
//! The scheduler never reads a clock, so the orchestrator can be driven by a
//! tokio timer in production and by plain values in tests.

use std::time::Duration;

/// Named session jobs. At most one instance of each is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {
    PhysicsTick,
    NetworkTick,
    Countdown,
    /// Leave hole review for the next hole or the course end.
    AdvanceHole,
    /// Leave a tournament course end for the next course or the final results.
    AdvanceCourse,
}

/// Jobs that only make sense while a hole is being played.
pub const HOLE_JOBS: [Job; 3] = [Job::PhysicsTick, Job::NetworkTick, Job::Countdown];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    job: Job,
    due: Duration,
    period: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `period`, first at `first_due`. Replaces any existing
    /// schedule for the same job.
    pub fn schedule_every(&mut self, job: Job, first_due: Duration, period: Duration) {
        self.insert(Entry {
            job,
            due: first_due,
            period: Some(period.max(Duration::from_micros(1))),
        });
    }

    /// Run `job` once at `due`. Replaces any existing schedule for the same job.
    pub fn schedule_once(&mut self, job: Job, due: Duration) {
        self.insert(Entry {
            job,
            due,
            period: None,
        });
    }

    pub fn cancel(&mut self, job: Job) {
        self.entries.retain(|e| e.job != job);
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, job: Job) -> bool {
        self.entries.iter().any(|e| e.job == job)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest due time of any scheduled job.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Take the earliest job due at or before `now`.
    ///
    /// Ties resolve in [`Job`] order. Periodic jobs are rescheduled before
    /// they are returned; deadlines already missed by the time of the call
    /// are skipped rather than replayed.
    pub fn pop_due(&mut self, now: Duration) -> Option<Job> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.job))
            .map(|(i, _)| i)?;

        let entry = self.entries[index];
        match entry.period {
            Some(period) => {
                let mut next = entry.due + period;
                if next <= now {
                    next = now + period;
                }
                self.entries[index].due = next;
            }
            None => {
                self.entries.swap_remove(index);
            }
        }
        Some(entry.job)
    }

    fn insert(&mut self, entry: Entry) {
        self.cancel(entry.job);
        self.entries.push(entry);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_nothing_due_before_deadline() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(Job::AdvanceHole, ms(5000));

        assert_eq!(scheduler.pop_due(ms(4999)), None);
        assert_eq!(scheduler.next_deadline(), Some(ms(5000)));
        assert_eq!(scheduler.pop_due(ms(5000)), Some(Job::AdvanceHole));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_periodic_job_reschedules() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(Job::Countdown, ms(1000), ms(1000));

        assert_eq!(scheduler.pop_due(ms(1000)), Some(Job::Countdown));
        assert_eq!(scheduler.next_deadline(), Some(ms(2000)));
        assert_eq!(scheduler.pop_due(ms(1500)), None);
    }

    #[test]
    fn test_missed_periods_are_skipped() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(Job::PhysicsTick, ms(10), ms(10));

        assert_eq!(scheduler.pop_due(ms(95)), Some(Job::PhysicsTick));
        assert_eq!(scheduler.pop_due(ms(95)), None);
        assert_eq!(scheduler.next_deadline(), Some(ms(105)));
    }

    #[test]
    fn test_due_jobs_pop_in_deadline_then_job_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(Job::AdvanceHole, ms(20));
        scheduler.schedule_every(Job::NetworkTick, ms(10), ms(50));
        scheduler.schedule_every(Job::PhysicsTick, ms(10), ms(50));

        assert_eq!(scheduler.pop_due(ms(30)), Some(Job::PhysicsTick));
        assert_eq!(scheduler.pop_due(ms(30)), Some(Job::NetworkTick));
        assert_eq!(scheduler.pop_due(ms(30)), Some(Job::AdvanceHole));
        assert_eq!(scheduler.pop_due(ms(30)), None);
    }

    #[test]
    fn test_cancel_prevents_run() {
        let mut scheduler = Scheduler::new();
        for job in HOLE_JOBS {
            scheduler.schedule_every(job, ms(0), ms(16));
        }
        scheduler.schedule_once(Job::AdvanceCourse, ms(0));

        for job in HOLE_JOBS {
            scheduler.cancel(job);
        }

        assert_eq!(scheduler.pop_due(ms(100)), Some(Job::AdvanceCourse));
        assert_eq!(scheduler.pop_due(ms(100)), None);
    }

    #[test]
    fn test_rescheduling_replaces_existing_entry() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(Job::AdvanceHole, ms(100));
        scheduler.schedule_once(Job::AdvanceHole, ms(300));

        assert_eq!(scheduler.pop_due(ms(200)), None);
        assert!(scheduler.is_scheduled(Job::AdvanceHole));
        scheduler.cancel_all();
        assert!(!scheduler.is_scheduled(Job::AdvanceHole));
    }
}
