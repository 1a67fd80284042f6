use crate::config::Config;
use crate::display::{Display, FrameReady};
use crate::error::VmError;
use crate::input::{Control, Input};
use crate::interpreter::{Chip8Interpreter, StepOutcome};
use crate::scheduler::{ClockEvent, Scheduler};
use crate::sound::{Sound, Speaker};
use std::io;
use std::time::{Duration, Instant};

/// how long the host loop sleeps between polls
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// what one tick got through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// `step()` calls, including ones that only polled a key wait
    pub steps: usize,
    pub frames: usize,
}

/// The environment: an interpreter, its clock, and the collaborators it
/// reports to. Collaborators are injected here and never reach back in.
pub struct Machine {
    interpreter: Chip8Interpreter,
    scheduler: Scheduler,
    display: Box<dyn Display>,
    speaker: Speaker,
    frames: u64,
    dirty: bool,
    last_tick: Option<Instant>,
}

impl Machine {
    pub fn new(config: &Config, display: Box<dyn Display>, sound: Box<dyn Sound>) -> Self {
        Self::with_interpreter(Chip8Interpreter::new(config), config, display, sound)
    }

    pub fn with_interpreter(
        interpreter: Chip8Interpreter,
        config: &Config,
        display: Box<dyn Display>,
        sound: Box<dyn Sound>,
    ) -> Self {
        log::debug!(
            "machine at {}Hz ({:.2} steps per frame)",
            config.cpu_hz,
            config.steps_per_frame()
        );
        Machine {
            interpreter,
            scheduler: Scheduler::new(config.cpu_hz).with_max_catch_up(config.max_catch_up),
            display,
            speaker: Speaker::new(sound),
            frames: 0,
            // the first frame always paints
            dirty: true,
            last_tick: None,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Chip8Interpreter {
        &mut self.interpreter
    }

    /// frames emitted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// load a program and restart the clock
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), VmError> {
        self.interpreter.load_program(program)?;
        self.scheduler.reset();
        self.last_tick = None;
        self.dirty = true;
        Ok(())
    }

    /// Advance the machine by `elapsed`, running every CPU step and frame
    /// that falls inside it. The first error stops the tick; events not yet
    /// run stay banked.
    pub fn tick(&mut self, elapsed: Duration) -> Result<TickReport, VmError> {
        let mut report = TickReport::default();
        for event in self.scheduler.advance(elapsed) {
            match event {
                ClockEvent::CpuStep => {
                    report.steps += 1;
                    if let StepOutcome::Redraw(_) = self.interpreter.step()? {
                        self.dirty = true;
                    }
                }
                ClockEvent::Frame => {
                    report.frames += 1;
                    Self::frame(
                        &mut self.interpreter,
                        self.display.as_mut(),
                        &mut self.speaker,
                        &mut self.frames,
                        &mut self.dirty,
                    )?;
                }
            }
        }
        Ok(report)
    }

    /// tick by however much wall time passed since the last call
    pub fn tick_wall(&mut self) -> Result<TickReport, VmError> {
        let now = Instant::now();
        let elapsed = match self.last_tick {
            Some(then) => now.duration_since(then),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.tick(elapsed)
    }

    /// Poll input and tick in real time until the input asks to quit or
    /// `max_frames` frames have been shown (0 runs forever).
    pub fn main_loop(&mut self, input: &mut dyn Input, max_frames: u64) -> Result<(), VmError> {
        let keypad = self.interpreter.keypad().clone();
        loop {
            if input.poll(&keypad)? == Control::Quit {
                log::debug!("quit after {} frames", self.frames);
                return Ok(());
            }
            self.tick_wall()?;
            if max_frames > 0 && self.frames >= max_frames {
                return Ok(());
            }
            spin_sleep::sleep(POLL_INTERVAL);
        }
    }

    // takes fields rather than &mut self; the scheduler stays borrowed while
    // events drain
    fn frame(
        interpreter: &mut Chip8Interpreter,
        display: &mut dyn Display,
        speaker: &mut Speaker,
        frames: &mut u64,
        dirty: &mut bool,
    ) -> Result<(), VmError> {
        interpreter.tick_timers();
        *frames += 1;
        display.draw(&FrameReady {
            number: *frames,
            buffer: interpreter.display(),
            changed: *dirty,
        })?;
        *dirty = false;
        speaker
            .update(interpreter.timers().sound)
            .map_err(|e| VmError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DummyDisplay, FrameBuffer, RecordingDisplay};
    use crate::input::DummyInput;
    use crate::sound::Mute;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// hands every frame to a shared recorder the test can still see
    struct Shared(Rc<RefCell<RecordingDisplay>>);

    impl Display for Shared {
        fn draw(&mut self, frame: &FrameReady) -> Result<(), io::Error> {
            self.0.borrow_mut().draw(frame)
        }
    }

    fn config(cpu_hz: u32) -> Config {
        Config {
            cpu_hz,
            rng_seed: Some(1),
            ..Config::default()
        }
    }

    fn recorded(cpu_hz: u32) -> (Machine, Rc<RefCell<RecordingDisplay>>) {
        let rec = Rc::new(RefCell::new(RecordingDisplay::default()));
        let m = Machine::new(
            &config(cpu_hz),
            Box::new(Shared(rec.clone())),
            Box::new(Mute),
        );
        (m, rec)
    }

    #[test]
    fn test_three_frame_periods() -> Result<(), VmError> {
        let (mut m, rec) = recorded(700);
        // 200: jp 200
        m.load_program(&[0x12, 0x00])?;
        let report = m.tick(Duration::from_millis(50))?;
        assert_eq!(report, TickReport { steps: 35, frames: 3 });
        assert_eq!(m.interpreter().instructions(), 35);
        let numbers: Vec<u64> = rec.borrow().frames.iter().map(|f| f.0).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_timers_follow_frames_not_steps() -> Result<(), VmError> {
        let (mut m, _) = recorded(6000);
        // 200: ld v0,10; 202: ld dt,v0; 204: jp 204
        m.load_program(&[0x60, 0x0A, 0xF0, 0x15, 0x12, 0x04])?;
        m.tick(Duration::from_nanos(16_666_667 * 4))?;
        // 400 steps ran, but only 4 frames
        assert_eq!(m.interpreter().timers().delay, 6);
        Ok(())
    }

    #[test]
    fn test_changed_flag_tracks_draws() -> Result<(), VmError> {
        let (mut m, rec) = recorded(60);
        // 200: draw glyph 0 at (0,0); 202: jp 202
        m.load_program(&[0xD0, 0x05, 0x12, 0x02])?;
        m.tick(Duration::from_millis(50))?;
        let rec = rec.borrow();
        let frames = &rec.frames;
        assert_eq!(frames.len(), 3);
        // step then frame for each period; only the first frame follows a draw
        assert!(frames[0].1);
        assert!(!frames[1].1);
        assert!(!frames[2].1);
        assert_eq!(frames[0].2.lit_count(), 14);
        Ok(())
    }

    #[test]
    fn test_frames_continue_while_waiting_for_key() -> Result<(), VmError> {
        let (mut m, rec) = recorded(700);
        // 200: ld v1,k; 202: ld v0,1; 204: jp 204
        m.load_program(&[0xF1, 0x0A, 0x60, 0x01, 0x12, 0x04])?;
        let report = m.tick(Duration::from_millis(100))?;
        assert_eq!(report.frames, 6);
        assert_eq!(report.steps, 70);
        assert!(m.interpreter().awaiting_key());
        assert_eq!(m.interpreter().state().program_counter, 0x202);
        assert_eq!(rec.borrow().frames.len(), 6);

        m.interpreter().keypad().press(0xE);
        m.tick(Duration::from_millis(10))?;
        assert_eq!(m.interpreter().state().v(1), 0xE);
        assert_eq!(m.interpreter().state().v(0), 1);
        Ok(())
    }

    #[test]
    fn test_error_stops_tick() {
        let mut m = Machine::new(&config(700), Box::new(DummyDisplay), Box::new(Mute));
        m.load_program(&[0xFF, 0xFF]).unwrap();
        match m.tick(Duration::from_millis(50)) {
            Err(VmError::UnsupportedOpcode { opcode, pc }) => {
                assert_eq!(opcode, 0xFFFF);
                assert_eq!(pc, 0x200);
            }
            other => panic!("expected unsupported opcode, got {:?}", other),
        }
    }

    #[test]
    fn test_main_loop_stops_on_quit() -> Result<(), VmError> {
        let mut m = Machine::new(&config(700), Box::new(DummyDisplay), Box::new(Mute));
        m.load_program(&[0x12, 0x00])?;
        let mut input = DummyInput::new(&[1, 2, 3]);
        m.main_loop(&mut input, 0)?;
        assert!(m.interpreter().keypad().is_pressed(3));
        Ok(())
    }

    #[test]
    fn test_first_frame_is_blank_screen() -> Result<(), VmError> {
        let (mut m, rec) = recorded(700);
        m.load_program(&[0x12, 0x00])?;
        // one nanosecond past a frame period, which is not a whole number
        m.tick(Duration::from_nanos(16_666_667))?;
        let rec = rec.borrow();
        let frames = &rec.frames;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].1);
        assert_eq!(frames[0].2, FrameBuffer::new());
        Ok(())
    }
}
