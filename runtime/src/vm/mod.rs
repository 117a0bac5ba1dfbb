mod error;
pub mod io;
mod machine;
mod value;

pub use error::{VmError, VmResult};
pub use io::{BufferSink, InputSource, OutputSink, ScriptedInput, StdInput, StdOutput};
pub use machine::VirtualMachine;
pub use value::Value;
