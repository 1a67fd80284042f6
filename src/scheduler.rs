//! Dual-rate clock.
//!
//! The CPU and the 60Hz frame clock are independent. Elapsed wall time is
//! poured into one accumulator per clock and drained a period at a time, so
//! irregular polling turns into a fixed logical cadence and nothing is lost
//! after a stall (catch-up events come out back to back instead).
//!
//! Accumulators are kept in nanoseconds x hertz. In those units every period
//! is exactly `NANOS_PER_SEC`, whatever the rate, so 700Hz never rounds.
use crate::config::FRAME_HZ;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// time for one instruction
    CpuStep,
    /// time for one timer tick and one repaint
    Frame,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    cpu_hz: u128,
    cpu_budget: u128,
    frame_budget: u128,
    max_catch_up: Option<Duration>,
}

impl Scheduler {
    pub fn new(cpu_hz: u32) -> Self {
        assert!(cpu_hz > 0, "CPU rate must be non-zero");
        Scheduler {
            cpu_hz: cpu_hz as u128,
            cpu_budget: 0,
            frame_budget: 0,
            max_catch_up: None,
        }
    }

    /// drop elapsed time above `limit` in a single advance
    pub fn with_max_catch_up(mut self, limit: Option<Duration>) -> Self {
        self.max_catch_up = limit;
        self
    }

    pub fn cpu_hz(&self) -> u32 {
        self.cpu_hz as u32
    }

    pub fn cpu_period(&self) -> Duration {
        Duration::from_nanos((NANOS_PER_SEC / self.cpu_hz) as u64)
    }

    pub fn frame_period() -> Duration {
        Duration::from_nanos((NANOS_PER_SEC / FRAME_HZ as u128) as u64)
    }

    /// Account for `elapsed` and hand back every event that is now due, in
    /// the order their deadlines fell.
    pub fn advance(&mut self, elapsed: Duration) -> Events<'_> {
        let elapsed = match self.max_catch_up {
            Some(limit) if elapsed > limit => {
                log::warn!(
                    "dropping {:?} of catch-up time",
                    elapsed.saturating_sub(limit)
                );
                limit
            }
            _ => elapsed,
        };
        let nanos = elapsed.as_nanos();
        self.cpu_budget += nanos * self.cpu_hz;
        self.frame_budget += nanos * FRAME_HZ as u128;
        Events { scheduler: self }
    }

    /// Forget any unspent time; the next advance starts from a clean slate.
    pub fn reset(&mut self) {
        self.cpu_budget = 0;
        self.frame_budget = 0;
    }

    fn next_event(&mut self) -> Option<ClockEvent> {
        let cpu_due = self.cpu_budget >= NANOS_PER_SEC;
        let frame_due = self.frame_budget >= NANOS_PER_SEC;
        let event = match (cpu_due, frame_due) {
            (false, false) => return None,
            (true, false) => ClockEvent::CpuStep,
            (false, true) => ClockEvent::Frame,
            // Both are due. The next deadline of each clock lies
            // (budget - period) / hz before now; the older one goes first,
            // ties to the CPU. Cross-multiplied to stay in integers.
            (true, true) => {
                let cpu_lag = (self.cpu_budget - NANOS_PER_SEC) * FRAME_HZ as u128;
                let frame_lag = (self.frame_budget - NANOS_PER_SEC) * self.cpu_hz;
                if cpu_lag >= frame_lag {
                    ClockEvent::CpuStep
                } else {
                    ClockEvent::Frame
                }
            }
        };
        match event {
            ClockEvent::CpuStep => self.cpu_budget -= NANOS_PER_SEC,
            ClockEvent::Frame => self.frame_budget -= NANOS_PER_SEC,
        }
        Some(event)
    }
}

/// Events drained from one `advance`. Dropping it early leaves the remaining
/// events banked for the next call.
pub struct Events<'a> {
    scheduler: &'a mut Scheduler,
}

impl Iterator for Events<'_> {
    type Item = ClockEvent;

    fn next(&mut self) -> Option<ClockEvent> {
        self.scheduler.next_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(events: &[ClockEvent]) -> (usize, usize) {
        let cpu = events.iter().filter(|e| **e == ClockEvent::CpuStep).count();
        (cpu, events.len() - cpu)
    }

    #[test]
    fn test_three_frames_in_one_tick() {
        let mut s = Scheduler::new(700);
        let events: Vec<_> = s.advance(Duration::from_millis(50)).collect();
        assert_eq!(count(&events), (35, 3));
        // nothing left over
        assert_eq!(s.advance(Duration::ZERO).count(), 0);
    }

    #[test]
    fn test_remainder_carries() {
        let mut s = Scheduler::new(700);
        // 1ms is less than one CPU period (~1.43ms)
        assert_eq!(s.advance(Duration::from_millis(1)).count(), 0);
        let events: Vec<_> = s.advance(Duration::from_millis(1)).collect();
        assert_eq!(events, vec![ClockEvent::CpuStep]);
    }

    #[test]
    fn test_split_ticks_add_up() {
        let mut s = Scheduler::new(700);
        let mut total = Vec::new();
        for _ in 0..1000 {
            total.extend(s.advance(Duration::from_millis(1)));
        }
        // exactly one second
        assert_eq!(count(&total), (700, 60));
    }

    #[test]
    fn test_events_interleave_chronologically() {
        let mut s = Scheduler::new(120);
        // 2 steps per frame: step, step, frame
        let events: Vec<_> = s.advance(Duration::from_millis(50)).collect();
        use ClockEvent::*;
        assert_eq!(
            events,
            vec![CpuStep, CpuStep, Frame, CpuStep, CpuStep, Frame, CpuStep, CpuStep, Frame]
        );
    }

    #[test]
    fn test_slow_cpu() {
        let mut s = Scheduler::new(30);
        let events: Vec<_> = s.advance(Duration::from_millis(100)).collect();
        assert_eq!(count(&events), (3, 6));
        assert_eq!(events[0], ClockEvent::Frame);
    }

    #[test]
    fn test_undrained_events_stay_banked() {
        let mut s = Scheduler::new(700);
        let first: Vec<_> = s.advance(Duration::from_millis(50)).take(10).collect();
        assert_eq!(first.len(), 10);
        let rest = s.advance(Duration::ZERO).count();
        assert_eq!(rest, 28);
    }

    #[test]
    fn test_max_catch_up() {
        let mut s = Scheduler::new(600).with_max_catch_up(Some(Duration::from_millis(100)));
        let events: Vec<_> = s.advance(Duration::from_secs(10)).collect();
        assert_eq!(count(&events), (60, 6));
    }

    #[test]
    fn test_reset_drops_banked_time() {
        let mut s = Scheduler::new(700);
        s.advance(Duration::from_millis(1)).for_each(drop);
        s.reset();
        assert_eq!(s.advance(Duration::from_micros(500)).count(), 0);
    }

    #[test]
    fn test_periods() {
        assert_eq!(Scheduler::new(1000).cpu_period(), Duration::from_millis(1));
        assert_eq!(Scheduler::frame_period(), Duration::from_nanos(16_666_666));
    }

    #[test]
    #[should_panic]
    fn test_zero_rate_panics() {
        let _ = Scheduler::new(0);
    }
}
