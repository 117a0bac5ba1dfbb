use byteorder::{LittleEndian, ReadBytesExt};
use rustc_hash::FxHashMap;

use crate::vm::io::{InputSource, OutputSink, StdInput, StdOutput};
use crate::vm::{Value, VmError, VmResult};
use crate::bytecode::OpCode;

/// Call frame record: where to resume and how deep the stack was at the call.
#[derive(Debug, Clone, Copy)]
struct CallFrame {
    return_address: usize,
    frame_base: usize,
}

/// The stack machine that executes a bytecode buffer.
///
/// `load` resets every piece of state and takes a fresh copy of the buffer;
/// `execute` then runs the fetch-decode-execute loop to completion or to the
/// first runtime failure. Nothing survives from one load to the next.
pub struct VirtualMachine {
    code: Vec<u8>,
    ip: usize,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: FxHashMap<String, Value>,
    input: Box<dyn InputSource>,
    output: Box<dyn OutputSink>,
    trace: bool,
}

impl VirtualMachine {
    /// A machine wired to process stdin/stdout.
    pub fn new() -> Self {
        Self::with_io(Box::new(StdInput), Box::new(StdOutput))
    }

    /// A machine wired to caller-supplied input and output.
    pub fn with_io(input: Box<dyn InputSource>, output: Box<dyn OutputSink>) -> Self {
        Self {
            code: Vec::new(),
            ip: 0,
            stack: Vec::new(),
            frames: Vec::new(),
            globals: FxHashMap::default(),
            input,
            output,
            trace: false,
        }
    }

    /// Print each instruction and the stack while executing.
    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    /// Store a copy of the bytecode buffer and reset all execution state.
    pub fn load(&mut self, bytecode: &[u8]) {
        self.code = bytecode.to_vec();
        self.ip = 0;
        self.stack.clear();
        self.frames.clear();
        self.globals.clear();
    }

    /// Run the loaded program until HALT, the end of the buffer, or a
    /// runtime failure.
    pub fn execute(&mut self) -> VmResult<()> {
        let mut running = true;

        while running && self.ip < self.code.len() {
            let offset = self.ip;
            let byte = self.read_byte()?;
            let opcode = OpCode::from_byte(byte).ok_or(VmError::UnknownOpcode(byte))?;

            if self.trace {
                println!("{:04}  {:<8} stack: {}", offset, opcode.mnemonic(), self.dump_stack());
            }

            match opcode {
                OpCode::Halt => running = false,

                OpCode::Print => {
                    let top = self.peek()?;
                    let text = format!("{}\n", top);
                    self.output.write_text(&text);
                }

                OpCode::Input => {
                    let name = self.read_name()?;
                    let value = self.input.read_int().unwrap_or(0);
                    self.globals.insert(name, Value::Integer(value));
                }

                OpCode::Push => {
                    let value = self.read_i32()?;
                    self.push(Value::Integer(value));
                }

                OpCode::Pop => {
                    self.pop()?;
                }

                OpCode::Add => self.binary_int(|a, b| a.wrapping_add(b))?,
                OpCode::Sub => self.binary_int(|a, b| a.wrapping_sub(b))?,
                OpCode::Mul => self.binary_int(|a, b| a.wrapping_mul(b))?,

                OpCode::Div => {
                    let (a, b) = self.pop_int_pair()?;
                    if b == 0 {
                        return Err(VmError::DivisionByZero);
                    }
                    self.push(Value::Integer(a.wrapping_div(b)));
                }

                OpCode::Mod => {
                    let (a, b) = self.pop_int_pair()?;
                    if b == 0 {
                        return Err(VmError::DivisionByZero);
                    }
                    self.push(Value::Integer(a.wrapping_rem(b)));
                }

                OpCode::Neg => {
                    let a = self.pop()?.as_int();
                    self.push(Value::Integer(a.wrapping_neg()));
                }

                OpCode::Eq => self.compare(|a, b| a == b)?,
                OpCode::Ne => self.compare(|a, b| a != b)?,
                OpCode::Lt => self.compare(|a, b| a < b)?,
                OpCode::Le => self.compare(|a, b| a <= b)?,
                OpCode::Gt => self.compare(|a, b| a > b)?,
                OpCode::Ge => self.compare(|a, b| a >= b)?,

                OpCode::And => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(Value::Boolean(a.is_truthy() && b.is_truthy()));
                }

                OpCode::Or => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(Value::Boolean(a.is_truthy() || b.is_truthy()));
                }

                OpCode::Not => {
                    let a = self.pop()?;
                    self.push(Value::Boolean(!a.is_truthy()));
                }

                OpCode::Load => {
                    let name = self.read_name()?;
                    let value = match self.globals.get(&name) {
                        Some(value) => *value,
                        None => return Err(VmError::UndefinedVariable(name)),
                    };
                    self.push(value);
                }

                OpCode::Store => {
                    let name = self.read_name()?;
                    let value = self.pop()?;
                    self.globals.insert(name, value);
                }

                OpCode::Jmp => {
                    let target = self.read_i32()?;
                    self.jump_to(target)?;
                }

                OpCode::JmpIf => {
                    let target = self.read_i32()?;
                    let condition = self.pop()?;
                    if condition.is_truthy() {
                        self.jump_to(target)?;
                    }
                }

                OpCode::JmpNot => {
                    let target = self.read_i32()?;
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        self.jump_to(target)?;
                    }
                }

                OpCode::Call => {
                    let target = self.read_i32()?;
                    self.frames.push(CallFrame {
                        return_address: self.ip,
                        frame_base: self.stack.len(),
                    });
                    self.jump_to(target)?;
                }

                OpCode::Ret => {
                    let frame = self.frames.pop().ok_or(VmError::InvalidReturn)?;
                    let result = if self.stack.len() > frame.frame_base {
                        self.pop()?
                    } else {
                        Value::Nil
                    };
                    self.stack.truncate(frame.frame_base);
                    if !result.is_nil() {
                        self.push(result);
                    }
                    self.ip = frame.return_address;
                }
            }
        }

        Ok(())
    }

    /// Current operand stack depth.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Current binding of a global, if any.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Render the operand stack, bottom first.
    pub fn dump_stack(&self) -> String {
        let items: Vec<String> = self.stack.iter().map(|v| v.to_string()).collect();
        format!("[{}]", items.join(", "))
    }

    /// Render the global table, sorted by name.
    pub fn dump_globals(&self) -> String {
        let mut entries: Vec<(&String, &Value)> = self.globals.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let items: Vec<String> = entries
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        format!("{{{}}}", items.join(", "))
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> VmResult<Value> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn peek(&self) -> VmResult<Value> {
        self.stack.last().copied().ok_or(VmError::StackUnderflow)
    }

    fn pop_int_pair(&mut self) -> VmResult<(i32, i32)> {
        let b = self.pop()?.as_int();
        let a = self.pop()?.as_int();
        Ok((a, b))
    }

    fn binary_int(&mut self, f: impl Fn(i32, i32) -> i32) -> VmResult<()> {
        let (a, b) = self.pop_int_pair()?;
        self.push(Value::Integer(f(a, b)));
        Ok(())
    }

    fn compare(&mut self, f: impl Fn(i32, i32) -> bool) -> VmResult<()> {
        let (a, b) = self.pop_int_pair()?;
        self.push(Value::Boolean(f(a, b)));
        Ok(())
    }

    fn read_byte(&mut self) -> VmResult<u8> {
        let byte = *self
            .code
            .get(self.ip)
            .ok_or(VmError::InstructionOutOfBounds(self.ip as i64))?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_i32(&mut self) -> VmResult<i32> {
        let mut bytes = self.code.get(self.ip..).unwrap_or(&[]);
        let value = bytes
            .read_i32::<LittleEndian>()
            .map_err(|_| VmError::InstructionOutOfBounds(self.ip as i64))?;
        self.ip += 4;
        Ok(value)
    }

    fn read_name(&mut self) -> VmResult<String> {
        let len = self.read_byte()? as usize;
        let end = self.ip + len;
        let bytes = self
            .code
            .get(self.ip..end)
            .ok_or(VmError::InstructionOutOfBounds(self.ip as i64))?;
        let name = String::from_utf8_lossy(bytes).into_owned();
        self.ip = end;
        Ok(name)
    }

    /// Absolute jumps may land anywhere in the buffer, including one past
    /// the end (which reads as an implicit halt).
    fn jump_to(&mut self, target: i32) -> VmResult<()> {
        if target < 0 || target as usize > self.code.len() {
            return Err(VmError::InstructionOutOfBounds(target as i64));
        }
        self.ip = target as usize;
        Ok(())
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Assembler, Program};
    use crate::vm::io::{BufferSink, ScriptedInput};

    fn capture_machine() -> (VirtualMachine, BufferSink) {
        let sink = BufferSink::new();
        let vm = VirtualMachine::with_io(
            Box::new(ScriptedInput::default()),
            Box::new(sink.clone()),
        );
        (vm, sink)
    }

    fn run(program: &Program) -> (VirtualMachine, BufferSink, VmResult<()>) {
        let (mut vm, sink) = capture_machine();
        vm.load(program.bytes());
        let result = vm.execute();
        (vm, sink, result)
    }

    #[test]
    fn test_add_sub_mul() {
        let mut asm = Assembler::new();
        asm.push_int(10)
            .push_int(3)
            .op(OpCode::Sub)
            .push_int(4)
            .op(OpCode::Mul)
            .push_int(1)
            .op(OpCode::Add)
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "29\n");
    }

    #[test]
    fn test_div_and_mod() {
        let mut asm = Assembler::new();
        asm.push_int(17)
            .push_int(5)
            .op(OpCode::Div)
            .op(OpCode::Print)
            .op(OpCode::Pop)
            .push_int(17)
            .push_int(5)
            .op(OpCode::Mod)
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "3\n2\n");
    }

    #[test]
    fn test_division_by_zero_fails() {
        let mut asm = Assembler::new();
        asm.push_int(10).push_int(0).op(OpCode::Div).op(OpCode::Halt);
        let (_, _, result) = run(&asm.finish().unwrap());
        assert!(matches!(result, Err(VmError::DivisionByZero)));
    }

    #[test]
    fn test_modulo_by_zero_fails() {
        let mut asm = Assembler::new();
        asm.push_int(10).push_int(0).op(OpCode::Mod).op(OpCode::Halt);
        let (_, _, result) = run(&asm.finish().unwrap());
        assert!(matches!(result, Err(VmError::DivisionByZero)));
    }

    #[test]
    fn test_negate() {
        let mut asm = Assembler::new();
        asm.push_int(9).op(OpCode::Neg).op(OpCode::Print).op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "-9\n");
    }

    #[test]
    fn test_comparisons_push_booleans() {
        let mut asm = Assembler::new();
        asm.push_int(1)
            .push_int(2)
            .op(OpCode::Lt)
            .op(OpCode::Print)
            .op(OpCode::Pop)
            .push_int(2)
            .push_int(2)
            .op(OpCode::Ge)
            .op(OpCode::Print)
            .op(OpCode::Pop)
            .push_int(3)
            .push_int(2)
            .op(OpCode::Eq)
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "true\ntrue\nfalse\n");
    }

    #[test]
    fn test_comparison_coerces_booleans_to_ints() {
        // true compares as 1, so (1 < 2) == 1 holds.
        let mut asm = Assembler::new();
        asm.push_int(1)
            .push_int(2)
            .op(OpCode::Lt)
            .push_int(1)
            .op(OpCode::Eq)
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (_, sink, _) = run(&asm.finish().unwrap());
        assert_eq!(sink.contents(), "true\n");
    }

    #[test]
    fn test_logical_ops_use_truthiness() {
        let mut asm = Assembler::new();
        asm.push_int(5)
            .push_int(0)
            .op(OpCode::And)
            .op(OpCode::Print)
            .op(OpCode::Pop)
            .push_int(0)
            .push_int(-3)
            .op(OpCode::Or)
            .op(OpCode::Print)
            .op(OpCode::Pop)
            .push_int(0)
            .op(OpCode::Not)
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "false\ntrue\ntrue\n");
    }

    #[test]
    fn test_pop_on_empty_stack_underflows() {
        let mut asm = Assembler::new();
        asm.op(OpCode::Pop).op(OpCode::Halt);
        let (_, _, result) = run(&asm.finish().unwrap());
        assert!(matches!(result, Err(VmError::StackUnderflow)));
    }

    #[test]
    fn test_print_peeks_without_popping() {
        let mut asm = Assembler::new();
        asm.push_int(5).op(OpCode::Print).op(OpCode::Halt);
        let (vm, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "5\n");
        assert_eq!(vm.stack_depth(), 1);
    }

    #[test]
    fn test_print_on_empty_stack_underflows() {
        let mut asm = Assembler::new();
        asm.op(OpCode::Print).op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(matches!(result, Err(VmError::StackUnderflow)));
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_no_output_after_a_fault() {
        let mut asm = Assembler::new();
        asm.push_int(1)
            .op(OpCode::Print)
            .op(OpCode::Pop)
            .op(OpCode::Pop)
            .push_int(2)
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(matches!(result, Err(VmError::StackUnderflow)));
        assert_eq!(sink.contents(), "1\n");
    }

    #[test]
    fn test_store_and_load_globals() {
        let mut asm = Assembler::new();
        asm.push_int(12)
            .named(OpCode::Store, "count")
            .named(OpCode::Load, "count")
            .op(OpCode::Print)
            .op(OpCode::Halt);
        let (vm, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "12\n");
        assert_eq!(vm.global("count"), Some(Value::Integer(12)));
    }

    #[test]
    fn test_store_overwrites_existing_binding() {
        let mut asm = Assembler::new();
        asm.push_int(1)
            .named(OpCode::Store, "x")
            .push_int(2)
            .named(OpCode::Store, "x")
            .op(OpCode::Halt);
        let (vm, _, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(vm.global("x"), Some(Value::Integer(2)));
    }

    #[test]
    fn test_load_of_unbound_name_fails() {
        let mut asm = Assembler::new();
        asm.named(OpCode::Load, "ghost").op(OpCode::Halt);
        let (_, _, result) = run(&asm.finish().unwrap());
        assert!(matches!(result, Err(VmError::UndefinedVariable(name)) if name == "ghost"));
    }

    #[test]
    fn test_unconditional_jump_skips_code() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Jmp, "after")
            .push_int(1)
            .op(OpCode::Print)
            .bind("after")
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_jmp_if_takes_truthy_branch() {
        let mut asm = Assembler::new();
        asm.push_int(1)
            .jump(OpCode::JmpIf, "taken")
            .push_int(7)
            .op(OpCode::Print)
            .bind("taken")
            .op(OpCode::Halt);
        let (vm, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "");
        // The condition was consumed.
        assert_eq!(vm.stack_depth(), 0);
    }

    #[test]
    fn test_jmp_if_falls_through_on_falsy() {
        let mut asm = Assembler::new();
        asm.push_int(0)
            .jump(OpCode::JmpIf, "taken")
            .push_int(7)
            .op(OpCode::Print)
            .bind("taken")
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "7\n");
    }

    #[test]
    fn test_jmp_not_takes_falsy_branch() {
        let mut asm = Assembler::new();
        asm.push_int(0)
            .jump(OpCode::JmpNot, "taken")
            .push_int(7)
            .op(OpCode::Print)
            .bind("taken")
            .op(OpCode::Halt);
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_call_and_ret_carry_a_return_value() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Call, "answer")
            .op(OpCode::Print)
            .op(OpCode::Halt)
            .bind("answer")
            .push_int(21)
            .op(OpCode::Ret);
        let (vm, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "21\n");
        assert_eq!(vm.stack_depth(), 1);
    }

    #[test]
    fn test_ret_truncates_stack_to_frame_base() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Call, "noisy")
            .op(OpCode::Print)
            .op(OpCode::Halt)
            .bind("noisy")
            .push_int(1)
            .push_int(2)
            .push_int(3)
            .op(OpCode::Ret);
        let (vm, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        // Only the top of the callee's stack survives as the return value.
        assert_eq!(sink.contents(), "3\n");
        assert_eq!(vm.stack_depth(), 1);
    }

    #[test]
    fn test_ret_without_value_leaves_stack_at_base() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Call, "quiet").op(OpCode::Halt).bind("quiet").op(OpCode::Ret);
        let (vm, _, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(vm.stack_depth(), 0);
    }

    #[test]
    fn test_ret_without_frame_fails() {
        let mut asm = Assembler::new();
        asm.op(OpCode::Ret).op(OpCode::Halt);
        let (_, _, result) = run(&asm.finish().unwrap());
        assert!(matches!(result, Err(VmError::InvalidReturn)));
    }

    #[test]
    fn test_input_binds_scripted_values() {
        let sink = BufferSink::new();
        let mut vm = VirtualMachine::with_io(
            Box::new(ScriptedInput::new(&[42, 7])),
            Box::new(sink.clone()),
        );

        let mut asm = Assembler::new();
        asm.named(OpCode::Input, "a").named(OpCode::Input, "b").op(OpCode::Halt);
        let program = asm.finish().unwrap();

        vm.load(program.bytes());
        vm.execute().unwrap();

        assert_eq!(vm.global("a"), Some(Value::Integer(42)));
        assert_eq!(vm.global("b"), Some(Value::Integer(7)));
    }

    #[test]
    fn test_exhausted_input_binds_zero() {
        let mut asm = Assembler::new();
        asm.named(OpCode::Input, "a").op(OpCode::Halt);
        let (vm, _, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(vm.global("a"), Some(Value::Integer(0)));
    }

    #[test]
    fn test_halt_stops_mid_buffer() {
        let mut asm = Assembler::new();
        asm.push_int(1).op(OpCode::Halt).push_int(2).op(OpCode::Print);
        let (vm, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "");
        assert_eq!(vm.stack_depth(), 1);
    }

    #[test]
    fn test_running_off_the_end_halts_implicitly() {
        let mut asm = Assembler::new();
        asm.push_int(3).push_int(4).op(OpCode::Add);
        let (vm, _, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(vm.stack_depth(), 1);
    }

    #[test]
    fn test_unknown_opcode_fails() {
        let (mut vm, _) = capture_machine();
        vm.load(&[0xEE]);
        let result = vm.execute();
        assert!(matches!(result, Err(VmError::UnknownOpcode(0xEE))));
    }

    #[test]
    fn test_truncated_operand_fails() {
        let (mut vm, _) = capture_machine();
        vm.load(&[OpCode::Push.to_byte(), 0x01, 0x02]);
        let result = vm.execute();
        assert!(matches!(result, Err(VmError::InstructionOutOfBounds(_))));
    }

    #[test]
    fn test_truncated_name_operand_fails() {
        let (mut vm, _) = capture_machine();
        vm.load(&[OpCode::Load.to_byte(), 5, b'a', b'b']);
        let result = vm.execute();
        assert!(matches!(result, Err(VmError::InstructionOutOfBounds(_))));
    }

    #[test]
    fn test_wild_jump_target_fails() {
        let mut code = vec![OpCode::Jmp.to_byte()];
        code.extend_from_slice(&1000i32.to_le_bytes());
        let (mut vm, _) = capture_machine();
        vm.load(&code);
        assert!(matches!(
            vm.execute(),
            Err(VmError::InstructionOutOfBounds(1000))
        ));

        let mut code = vec![OpCode::Jmp.to_byte()];
        code.extend_from_slice(&(-4i32).to_le_bytes());
        vm.load(&code);
        assert!(matches!(
            vm.execute(),
            Err(VmError::InstructionOutOfBounds(-4))
        ));
    }

    #[test]
    fn test_jump_to_end_of_buffer_halts() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Jmp, "end").push_int(9).op(OpCode::Print).bind("end");
        let (_, sink, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_load_resets_all_state() {
        let mut asm = Assembler::new();
        asm.push_int(1).named(OpCode::Store, "x").push_int(2).op(OpCode::Halt);
        let program = asm.finish().unwrap();

        let (mut vm, _) = capture_machine();
        vm.load(program.bytes());
        vm.execute().unwrap();
        assert_eq!(vm.stack_depth(), 1);
        assert!(vm.global("x").is_some());

        vm.load(&[OpCode::Halt.to_byte()]);
        assert_eq!(vm.stack_depth(), 0);
        assert!(vm.global("x").is_none());
    }

    #[test]
    fn test_dump_formats() {
        let mut asm = Assembler::new();
        asm.push_int(1)
            .push_int(2)
            .push_int(3)
            .named(OpCode::Store, "b")
            .push_int(4)
            .named(OpCode::Store, "a")
            .op(OpCode::Halt);
        let (vm, _, result) = run(&asm.finish().unwrap());

        assert!(result.is_ok());
        assert_eq!(vm.dump_stack(), "[1, 2]");
        assert_eq!(vm.dump_globals(), "{a: 4, b: 3}");
    }
}
