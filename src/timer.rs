/// The delay and sound counters. Both count down once per frame and stop at
/// zero; the CPU clock never touches them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn tick_delay(&mut self) {
        self.delay = self.delay.saturating_sub(1);
    }

    pub fn tick_sound(&mut self) {
        self.sound = self.sound.saturating_sub(1);
    }

    /// the tone should be playing while this is true
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_down() {
        let mut t = Timers { delay: 2, sound: 1 };
        t.tick_delay();
        t.tick_sound();
        assert_eq!(t, Timers { delay: 1, sound: 0 });
    }

    #[test]
    fn test_tick_stops_at_zero() {
        let mut t = Timers::default();
        t.tick_delay();
        t.tick_sound();
        assert_eq!(t, Timers { delay: 0, sound: 0 });
        assert!(!t.sound_active());
    }

    #[test]
    fn test_timers_are_independent() {
        let mut t = Timers { delay: 5, sound: 5 };
        t.tick_sound();
        t.tick_sound();
        assert_eq!(t.delay, 5);
        assert_eq!(t.sound, 3);
        assert!(t.sound_active());
    }
}
