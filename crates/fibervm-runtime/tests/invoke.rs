//! end-to-end `invoke` scenarios built directly against `InstructionWriter`,
//! the way this workspace's own bytecode producer would assemble them
//! (there is no text-format assembler here to load these from a file).

use std::sync::Once;

use fibervm_binary::InstructionWriter;
use fibervm_program::{Bytecode, Function, GlobalTable, Program};
use fibervm_runtime::Fiber;
use fibervm_types::{Opcode, Trap};
use pretty_assertions::assert_eq;

static LOGGING: Once = Once::new();

/// install `env_logger` once per test binary so the dispatch loop's
/// `log::trace!`/`log::debug!` records (opcode dispatched, frame pushed/
/// popped, trap raised) surface under `RUST_LOG=trace cargo test -- --nocapture`.
fn init_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::try_init();
    });
}

fn f64_bits(value: f64) -> u64 {
    value.to_bits()
}

/// `fib(n)`: `n < 2` returns `n`; otherwise `fib(n - 1) + fib(n - 2)`.
/// registers: 0=n, 1=scratch immediate, 2=cond, 3=n-1, 4=fib(n-1),
/// 5=n-2, 6=fib(n-2), 7=sum.
fn fib_program() -> Program {
    let mut w = InstructionWriter::new();

    let entry = w.next_offset();
    w.write_1(Opcode::copy_im_64, 1);
    w.write_im64(2);
    w.write_3(Opcode::s_lt_64, 2, 0, 1);
    w.write_3(Opcode::if_nz, 1, 2, 2);

    let then_block = w.next_offset();
    w.write_1(Opcode::ret_v, 0);

    let else_block = w.next_offset();
    w.write_1(Opcode::copy_im_64, 1);
    w.write_im64(1);
    w.write_3(Opcode::i_sub_64, 3, 0, 1);
    w.write_w1(Opcode::call_v, 0, 4);
    w.write_registers(&[3]);
    w.write_1(Opcode::copy_im_64, 1);
    w.write_im64(2);
    w.write_3(Opcode::i_sub_64, 5, 0, 1);
    w.write_w1(Opcode::call_v, 0, 6);
    w.write_registers(&[5]);
    w.write_3(Opcode::i_add_64, 7, 4, 6);
    w.write_1(Opcode::ret_v, 7);

    let bytecode = Bytecode::new(vec![entry, then_block, else_block], w.finish());
    let function = Function::new(1, 8, bytecode);
    Program::new(vec![function], GlobalTable::new())
}

#[test]
fn fib_of_32_is_2178309() {
    init_logging();
    let program = fib_program();
    let mut fiber = Fiber::new(&program, 1 << 16, 256, 1024);
    let result = fiber.invoke(0, &[32]);
    assert_eq!(result, Ok(2178309));
}

/// `ack(m, n)`: `m == 0` returns `n + 1`; `n == 0` tail-calls `ack(m - 1, 1)`;
/// otherwise tail-calls `ack(m - 1, ack(m, n - 1))`. registers: 0=m, 1=n,
/// 2=cond, 3=m-1, 4=n-1 (and the inner call result). recurses through
/// `ack_index`, its own slot in the enclosing program's function table.
fn ackermann_function(ack_index: u16) -> Function {
    let mut w = InstructionWriter::new();
    let zero = f64_bits(0.0);
    let one = f64_bits(1.0);

    let entry = w.next_offset();
    w.write_2(Opcode::f_eq_im_64, 2, 0);
    w.write_im64(zero);
    w.write_2(Opcode::when_nz, 1, 2);
    w.write_2(Opcode::f_eq_im_64, 2, 1);
    w.write_im64(zero);
    w.write_2(Opcode::when_nz, 2, 2);
    w.write_2(Opcode::f_sub_im_b_64, 3, 0);
    w.write_im64(one);
    w.write_2(Opcode::f_sub_im_b_64, 4, 1);
    w.write_im64(one);
    w.write_w1(Opcode::call_v, ack_index, 4);
    w.write_registers(&[0, 4]);
    w.write_w0(Opcode::tail_call_v, ack_index);
    w.write_registers(&[3, 4]);

    let m_is_zero = w.next_offset();
    w.write_2(Opcode::f_add_im_64, 1, 1);
    w.write_im64(one);
    w.write_1(Opcode::ret_v, 1);

    let n_is_zero = w.next_offset();
    w.write_2(Opcode::f_sub_im_b_64, 0, 0);
    w.write_im64(one);
    w.write_1(Opcode::copy_im_64, 1);
    w.write_im64(one);
    w.write_w0(Opcode::tail_call_v, ack_index);
    w.write_registers(&[0, 1]);

    let bytecode = Bytecode::new(vec![entry, m_is_zero, n_is_zero], w.finish());
    Function::new(2, 5, bytecode)
}

fn ackermann_program() -> Program {
    Program::new(vec![ackermann_function(0)], GlobalTable::new())
}

#[test]
fn tail_called_ackermann_of_3_8_is_2045() {
    init_logging();
    let program = ackermann_program();
    let mut fiber = Fiber::new(&program, 1 << 20, 1 << 16, 1 << 17);
    let result = fiber.invoke(0, &[f64_bits(3.0), f64_bits(8.0)]);
    assert_eq!(result.map(f64::from_bits), Ok(2045.0));
}

/// `loop_ack(m, n)`: accumulate `ack(m, n)` ten times, calling the sibling
/// `ack` function at index 0. registers: 0=m, 1=n, 2=i, 3=a (accumulator),
/// 4=b (per-iteration call result), 5=cond.
fn loop_ackermann_function(ack_index: u16) -> Function {
    let mut w = InstructionWriter::new();
    let zero = f64_bits(0.0);
    let one = f64_bits(1.0);
    let loop_count = f64_bits(10.0);

    let entry = w.next_offset();
    w.write_1(Opcode::copy_im_64, 2);
    w.write_im64(zero);
    w.write_1(Opcode::copy_im_64, 3);
    w.write_im64(zero);
    w.write_1(Opcode::block, 1);
    w.write_1(Opcode::ret_v, 3);

    let loop_block = w.next_offset();
    w.write_2(Opcode::f_eq_im_64, 5, 2);
    w.write_im64(loop_count);
    w.write_2(Opcode::br_nz, 0, 5);
    w.write_w1(Opcode::call_v, ack_index, 4);
    w.write_registers(&[0, 1]);
    w.write_3(Opcode::f_add_64, 3, 3, 4);
    w.write_2(Opcode::f_add_im_64, 2, 2);
    w.write_im64(one);
    w.write_1(Opcode::re, 0);

    let bytecode = Bytecode::new(vec![entry, loop_block], w.finish());
    Function::new(2, 6, bytecode)
}

fn loop_ackermann_program() -> Program {
    let ack_index = 0;
    let functions = vec![ackermann_function(ack_index), loop_ackermann_function(ack_index)];
    Program::new(functions, GlobalTable::new())
}

#[test]
fn loop_ackermann_accumulates_ten_calls() {
    init_logging();
    let program = loop_ackermann_program();
    let mut fiber = Fiber::new(&program, 1 << 20, 1 << 16, 1 << 17);
    let result = fiber.invoke(1, &[f64_bits(3.0), f64_bits(8.0)]);
    assert_eq!(result.map(f64::from_bits), Ok(20450.0));
}

#[test]
fn unreachable_instruction_traps() {
    init_logging();
    let mut w = InstructionWriter::new();
    let entry = w.next_offset();
    w.write_0(Opcode::unreachable);
    let bytecode = Bytecode::new(vec![entry], w.finish());
    let function = Function::new(0, 1, bytecode);
    let program = Program::new(vec![function], GlobalTable::new());

    let mut fiber = Fiber::new(&program, 256, 16, 16);
    assert_eq!(fiber.invoke(0, &[]), Err(Trap::Unreachable));
}

#[test]
fn unbounded_recursion_traps_with_call_overflow() {
    init_logging();
    let mut w = InstructionWriter::new();
    let entry = w.next_offset();
    w.write_w1(Opcode::call_v, 0, 0);
    w.write_registers(&[]);
    w.write_1(Opcode::ret_v, 0);
    let bytecode = Bytecode::new(vec![entry], w.finish());
    let function = Function::new(0, 1, bytecode);
    let program = Program::new(vec![function], GlobalTable::new());

    let mut fiber = Fiber::new(&program, 4096, 32, 64);
    assert_eq!(fiber.invoke(0, &[]), Err(Trap::CallOverflow));
}

#[test]
fn globals_are_read_and_summed() {
    init_logging();
    let mut globals = GlobalTable::new();
    globals.push_64(1);
    globals.push_64(2);

    let mut w = InstructionWriter::new();
    let entry = w.next_offset();
    w.write_w1(Opcode::read_global_64, 0, 0);
    w.write_w1(Opcode::read_global_64, 1, 1);
    w.write_3(Opcode::i_add_64, 2, 0, 1);
    w.write_1(Opcode::ret_v, 2);
    let bytecode = Bytecode::new(vec![entry], w.finish());
    let function = Function::new(0, 3, bytecode);
    let program = Program::new(vec![function], globals);

    let mut fiber = Fiber::new(&program, 256, 16, 16);
    assert_eq!(fiber.invoke(0, &[]), Ok(3));
}
