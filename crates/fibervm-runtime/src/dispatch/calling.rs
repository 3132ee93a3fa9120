//! `CALL_V`, `TAIL_CALL_V`, `RET_V`. the only opcodes that move the call
//! stack and the register-window base.

use fibervm_binary::codec::{self, Instruction};
use fibervm_types::Trap;

use crate::fiber::{BlockFrame, CallFrame, CallTarget, Fiber};

use super::Step;

/// register-argument blocks are packed `u8` indices, and `arg_count` is
/// itself a `u8`, so 256 bytes is always enough to stage them without an
/// allocation.
const MAX_ARGS: usize = 256;

pub(crate) fn call_v(fiber: &mut Fiber, word: Instruction) -> Step {
    let callee_index = codec::decode_w0(word);
    let out_reg = codec::decode_w1(word);
    let args_start = fiber.block_frame().instruction_pointer;

    let callee = fiber.program.function(callee_index);
    let arg_count = callee.arg_count as usize;
    let slots = codec::arg_slot_count(arg_count) as u32;

    if fiber.call_stack.len() + 1 > fiber.call_stack_capacity
        || fiber.block_stack.len() + 1 > fiber.block_stack_capacity
    {
        return Step::Trap(Trap::CallOverflow);
    }
    if fiber.registers.len() + callee.register_count as usize > fiber.registers_capacity {
        return Step::Trap(Trap::StackOverflow);
    }

    let caller_register_base = fiber.register_base();
    let mut args = [0u8; MAX_ARGS];
    {
        let instructions = fiber.instructions();
        for (i, slot) in args.iter_mut().enumerate().take(arg_count) {
            *slot = codec::read_register_arg(instructions, args_start, i);
        }
    }
    fiber.block_frame_mut().instruction_pointer = args_start + slots;

    let new_register_base = fiber.registers.len();
    fiber.registers.resize(new_register_base + callee.register_count as usize, 0);
    for i in 0..arg_count {
        let value = fiber.registers[caller_register_base + args[i] as usize];
        fiber.registers[new_register_base + i] = value;
    }

    let block_index = fiber.block_stack.len();
    let start = callee.bytecode.block_start(0);
    fiber.block_stack.push(BlockFrame {
        start_pointer: start,
        instruction_pointer: start,
        out_index: out_reg,
    });
    fiber.block_top = block_index;

    fiber.call_stack.push(CallFrame {
        target: CallTarget::Program(callee_index),
        block_base: block_index,
        register_base: new_register_base,
    });
    fiber.call_top = fiber.call_stack.len() - 1;

    log::debug!("call_v -> function {} (out r{})", callee_index, out_reg);
    Step::Continue
}

pub(crate) fn tail_call_v(fiber: &mut Fiber, word: Instruction) -> Step {
    let callee_index = codec::decode_w0(word);
    let args_start = fiber.block_frame().instruction_pointer;

    let callee = fiber.program.function(callee_index);
    let arg_count = callee.arg_count as usize;
    let callee_register_count = callee.register_count as usize;
    let caller_register_count = fiber.register_count();

    if callee_register_count > caller_register_count {
        let growth = callee_register_count - caller_register_count;
        if fiber.registers.len() + growth > fiber.registers_capacity {
            return Step::Trap(Trap::StackOverflow);
        }
    }

    let register_base = fiber.register_base();
    let mut scratch = [0u64; MAX_ARGS];
    {
        let instructions = fiber.instructions();
        for i in 0..arg_count {
            let r = codec::read_register_arg(instructions, args_start, i);
            scratch[i] = fiber.registers[register_base + r as usize];
        }
    }
    for (i, value) in scratch.iter().enumerate().take(arg_count) {
        fiber.registers[register_base + i] = *value;
    }
    fiber.registers.resize(register_base + callee_register_count, 0);

    fiber.call_stack[fiber.call_top].target = CallTarget::Program(callee_index);

    let block_base = fiber.call_frame().block_base;
    fiber.block_stack.truncate(block_base + 1);
    fiber.block_top = block_base;
    let start = callee.bytecode.block_start(0);
    let root = fiber.block_frame_mut();
    root.start_pointer = start;
    root.instruction_pointer = start;

    log::debug!("tail_call_v -> function {}", callee_index);
    Step::Continue
}

pub(crate) fn ret_v(fiber: &mut Fiber, word: Instruction) -> Step {
    let src = codec::decode_a(word);
    let value = fiber.read_register(src);

    let callee_register_base = fiber.register_base();
    let callee_block_base = fiber.call_frame().block_base;
    let out_index = fiber.block_stack[callee_block_base].out_index;

    fiber.call_stack.truncate(fiber.call_top);
    fiber.call_top = fiber.call_stack.len() - 1;

    fiber.block_stack.truncate(callee_block_base);
    fiber.block_top = fiber.block_stack.len() - 1;

    fiber.registers.truncate(callee_register_base);

    let caller_base = fiber.register_base();
    fiber.registers[caller_base + out_index as usize] = value;

    log::debug!("ret_v -> r{} = {:#x}", out_index, value);
    Step::Continue
}

#[cfg(test)]
mod tests {
    use fibervm_binary::InstructionWriter;
    use fibervm_program::{Bytecode, Function, GlobalTable, Program};
    use fibervm_types::Opcode;
    use pretty_assertions::assert_eq;

    #[test]
    fn call_v_copies_args_and_ret_v_writes_the_caller_out_register() {
        let mut callee_w = InstructionWriter::new();
        callee_w.write_3(Opcode::i_add_64, 0, 0, 0);
        callee_w.write_1(Opcode::ret_v, 0);
        let callee = Function::new(1, 1, Bytecode::new(vec![0], callee_w.finish()));

        let mut caller_w = InstructionWriter::new();
        caller_w.write_1(Opcode::copy_im_64, 0);
        caller_w.write_im64(5);
        caller_w.write_w1(Opcode::call_v, 0, 1);
        caller_w.write_registers(&[0]);
        caller_w.write_1(Opcode::ret_v, 1);
        let caller = Function::new(0, 2, Bytecode::new(vec![0], caller_w.finish()));

        let program = Program::new(vec![callee, caller], GlobalTable::new());
        let mut fiber = crate::Fiber::new(&program, 64, 8, 8);

        assert_eq!(fiber.invoke(1, &[]), Ok(10));
    }

    #[test]
    fn tail_call_v_rebinds_the_current_frame_instead_of_pushing_one() {
        let mut target_w = InstructionWriter::new();
        target_w.write_3(Opcode::i_add_64, 0, 0, 0);
        target_w.write_1(Opcode::ret_v, 0);
        let target = Function::new(1, 1, Bytecode::new(vec![0], target_w.finish()));

        let mut source_w = InstructionWriter::new();
        source_w.write_w0(Opcode::tail_call_v, 0);
        source_w.write_registers(&[0]);
        let source = Function::new(1, 1, Bytecode::new(vec![0], source_w.finish()));

        let program = Program::new(vec![target, source], GlobalTable::new());
        let mut fiber = crate::Fiber::new(&program, 64, 8, 8);

        assert_eq!(fiber.invoke(1, &[7]), Ok(14));
    }
}
