extern crate std;
use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal::delay::DelayNs;

/// Remembers every millisecond delay requested of it, shared between clones.
#[derive(Clone, Default)]
pub struct RecordingDelay(Rc<RefCell<Vec<u32>>>);

impl RecordingDelay {
    pub fn calls(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(ms);
    }
}
