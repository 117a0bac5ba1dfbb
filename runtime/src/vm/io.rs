//! The VM's only view of the outside world: one integer at a time in, text
//! out. The host wires these to a console, a serial port, or test buffers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Source the INPUT opcode reads from.
pub trait InputSource {
    /// Produce the next integer, or `None` once the source is exhausted.
    fn read_int(&mut self) -> Option<i32>;
}

/// Sink the PRINT opcode writes to.
pub trait OutputSink {
    fn write_text(&mut self, text: &str);
}

/// Reads integers from standard input, skipping lines that do not parse.
pub struct StdInput;

impl InputSource for StdInput {
    fn read_int(&mut self) -> Option<i32> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {
                    if let Ok(value) = line.trim().parse() {
                        return Some(value);
                    }
                }
            }
        }
    }
}

/// Writes program output to standard output.
pub struct StdOutput;

impl OutputSink for StdOutput {
    fn write_text(&mut self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }
}

/// A fixed queue of integers, consumed front to back. Used by tests and by
/// hosts that feed canned input.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    values: VecDeque<i32>,
}

impl ScriptedInput {
    pub fn new(values: &[i32]) -> Self {
        Self {
            values: values.iter().copied().collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn read_int(&mut self) -> Option<i32> {
        self.values.pop_front()
    }
}

/// Collects output into a shared string buffer. Cloning shares the buffer,
/// so a handle kept outside the VM observes everything the program printed.
#[derive(Clone, Debug, Default)]
pub struct BufferSink {
    buffer: Rc<RefCell<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl OutputSink for BufferSink {
    fn write_text(&mut self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }
}
