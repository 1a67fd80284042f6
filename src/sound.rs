use beep::beep;
use std::error::Error;

pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// PC speaker tone; needs access to the console device
pub struct SimpleBeep;

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        beep(SIMPLEBEEP_PITCH)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        beep(0)?;
        Ok(())
    }
}

pub struct Mute;

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

/// Reads the sound timer once per frame and turns the tone on or off only
/// when that changes, so the backend isn't hammered 60 times a second.
pub struct Speaker {
    device: Box<dyn Sound>,
    is_beeping: bool,
}

impl Speaker {
    pub fn new(device: Box<dyn Sound>) -> Self {
        Speaker {
            device,
            is_beeping: false,
        }
    }

    pub fn is_beeping(&self) -> bool {
        self.is_beeping
    }

    pub fn update(&mut self, sound_timer: u8) -> Result<(), Box<dyn Error>> {
        let want = sound_timer > 0;
        if want == self.is_beeping {
            return Ok(());
        }
        if want {
            self.device.beep()?;
        } else {
            self.device.stop()?;
        }
        self.is_beeping = want;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counting(Rc<RefCell<Vec<&'static str>>>);

    impl Sound for Counting {
        fn beep(&mut self) -> Result<(), Box<dyn Error>> {
            self.0.borrow_mut().push("beep");
            Ok(())
        }
        fn stop(&mut self) -> Result<(), Box<dyn Error>> {
            self.0.borrow_mut().push("stop");
            Ok(())
        }
    }

    #[test]
    fn test_speaker_only_acts_on_transitions() -> Result<(), Box<dyn Error>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut s = Speaker::new(Box::new(Counting(log.clone())));
        for t in [0, 3, 2, 1, 0, 0, 5] {
            s.update(t)?;
        }
        assert_eq!(*log.borrow(), vec!["beep", "stop", "beep"]);
        assert!(s.is_beeping());
        Ok(())
    }

    #[test]
    fn test_mute_is_silent() -> Result<(), Box<dyn Error>> {
        let mut s = Speaker::new(Box::new(Mute));
        s.update(10)?;
        assert!(s.is_beeping());
        s.update(0)?;
        assert!(!s.is_beeping());
        Ok(())
    }
}
