//! the host-facing call surface: wraps a target function in a synthetic
//! one-instruction frame that gives the dispatch loop somewhere to land
//! on return, mirroring how the teacher's `process_function` pushes a
//! function frame, drives the interpreter to completion, and pops the
//! results back off the stack.

use fibervm_types::{FunctionIndex, Trap};

use crate::fiber::{BlockFrame, CallFrame, CallTarget, Fiber};

impl<'p> Fiber<'p> {
    /// call `fn_index` with `args`, run it to completion, and return its
    /// single result word. `args.len()` must equal the callee's declared
    /// `arg_count`; this is a precondition, not validated here (run
    /// `fibervm_program::validate` ahead of time against untrusted
    /// producers if that matters to the host).
    pub fn invoke(&mut self, fn_index: FunctionIndex, args: &[u64]) -> Result<u64, Trap> {
        let function = self.program.function(fn_index);
        debug_assert_eq!(
            args.len(),
            function.arg_count as usize,
            "wrong argument count for function {}",
            fn_index
        );

        let call_len0 = self.call_stack.len();
        let block_len0 = self.block_stack.len();
        let register_len0 = self.registers.len();

        if self.call_stack.len() + 2 > self.call_stack_capacity
            || self.block_stack.len() + 2 > self.block_stack_capacity
        {
            return Err(Trap::CallOverflow);
        }
        if self.registers.len() + 1 + function.register_count as usize > self.registers_capacity {
            return Err(Trap::StackOverflow);
        }

        let wrapper_register_base = self.registers.len();
        self.registers.push(0);
        let wrapper_block_index = self.block_stack.len();
        self.block_stack.push(BlockFrame {
            start_pointer: 0,
            instruction_pointer: 0,
            out_index: 0,
        });
        self.call_stack.push(CallFrame {
            target: CallTarget::Wrapper,
            block_base: wrapper_block_index,
            register_base: wrapper_register_base,
        });

        let callee_register_base = self.registers.len();
        self.registers.resize(callee_register_base + function.register_count as usize, 0);
        self.registers[callee_register_base..callee_register_base + args.len()].copy_from_slice(args);

        let callee_block_index = self.block_stack.len();
        let start = function.bytecode.block_start(0);
        self.block_stack.push(BlockFrame {
            start_pointer: start,
            instruction_pointer: start,
            out_index: 0,
        });
        self.call_stack.push(CallFrame {
            target: CallTarget::Program(fn_index),
            block_base: callee_block_index,
            register_base: callee_register_base,
        });

        self.call_top = self.call_stack.len() - 1;
        self.block_top = self.block_stack.len() - 1;

        log::debug!("invoke: entering function {}", fn_index);

        match self.run() {
            Ok(()) => {
                let value = self.registers[wrapper_register_base];
                self.rewind_to(call_len0, block_len0, register_len0);
                Ok(value)
            }
            Err(trap) => {
                // the fiber's stacks are left in a bounded but
                // otherwise unspecified state per the trap contract;
                // resetting to the pre-invoke depth is a convenient,
                // always-safe choice a host can rely on before reusing
                // the fiber for another call.
                self.rewind_to(call_len0, block_len0, register_len0);
                Err(trap)
            }
        }
    }

    /// truncate all three stacks back to the given pre-`invoke` lengths
    /// and refresh the cached top indices.
    fn rewind_to(&mut self, call_len: usize, block_len: usize, register_len: usize) {
        self.call_stack.truncate(call_len);
        self.block_stack.truncate(block_len);
        self.registers.truncate(register_len);
        self.call_top = call_len.saturating_sub(1);
        self.block_top = block_len.saturating_sub(1);
    }
}
