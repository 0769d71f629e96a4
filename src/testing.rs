//! Pin that records every level it is driven to into a shared log, so tests can
//! check the order of line changes across pins.

use core::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, OutputPin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Master,
    Select(u8),
}

#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<(Line, bool)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, line: Line) -> RecordingPin {
        RecordingPin {
            line,
            log: Arc::clone(&self.log),
        }
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<(Line, bool)> {
        core::mem::take(&mut *self.log.lock().unwrap())
    }
}

pub struct RecordingPin {
    line: Line,
    log: Arc<Mutex<Vec<(Line, bool)>>>,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push((self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push((self.line, true));
        Ok(())
    }
}
