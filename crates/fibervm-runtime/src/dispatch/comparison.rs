//! comparisons. the boolean result is written as `0`/`1` to the
//! destination register; only the low byte is part of the contract (§7
//! of the design notes) -- callers must not depend on the remaining
//! bytes of the destination cell.

use fibervm_binary::codec::{self, Instruction};

use crate::fiber::Fiber;

use super::Step;

fn as_f32(cell: u64) -> f32 {
    f32::from_bits(cell as u32)
}

fn as_f64(cell: u64) -> f64 {
    f64::from_bits(cell)
}

fn as_i64(cell: u64) -> i64 {
    cell as i64
}

fn as_u64(cell: u64) -> u64 {
    cell
}

fn from_bool(value: bool) -> u64 {
    value as u64
}

macro_rules! register_compare {
    ($name:ident, $read:ident, $op:expr) => {
        pub(crate) fn $name(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let lhs = $read(fiber.read_register(codec::decode_b(word)));
            let rhs = $read(fiber.read_register(codec::decode_c(word)));
            fiber.write_register(dst, from_bool($op(lhs, rhs)));
            Step::Continue
        }
    };
}

macro_rules! commutative_im32_compare {
    ($name:ident, $op:expr) => {
        pub(crate) fn $name(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f32(fiber.read_register(codec::decode_b(word)));
            let imm = f32::from_bits(codec::decode_im32(word));
            fiber.write_register(dst, from_bool($op(src, imm)));
            Step::Continue
        }
    };
}

macro_rules! ordered_im32_compare {
    ($name_a:ident, $name_b:ident, $op:expr) => {
        pub(crate) fn $name_a(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f32(fiber.read_register(codec::decode_b(word)));
            let imm = f32::from_bits(codec::decode_im32(word));
            fiber.write_register(dst, from_bool($op(imm, src)));
            Step::Continue
        }

        pub(crate) fn $name_b(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f32(fiber.read_register(codec::decode_b(word)));
            let imm = f32::from_bits(codec::decode_im32(word));
            fiber.write_register(dst, from_bool($op(src, imm)));
            Step::Continue
        }
    };
}

macro_rules! commutative_im64_compare {
    ($name:ident, $op:expr) => {
        pub(crate) fn $name(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f64(fiber.read_register(codec::decode_b(word)));
            let imm = f64::from_bits(fiber.fetch_extra_word());
            fiber.write_register(dst, from_bool($op(src, imm)));
            Step::Continue
        }
    };
}

macro_rules! ordered_im64_compare {
    ($name_a:ident, $name_b:ident, $op:expr) => {
        pub(crate) fn $name_a(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f64(fiber.read_register(codec::decode_b(word)));
            let imm = f64::from_bits(fiber.fetch_extra_word());
            fiber.write_register(dst, from_bool($op(imm, src)));
            Step::Continue
        }

        pub(crate) fn $name_b(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f64(fiber.read_register(codec::decode_b(word)));
            let imm = f64::from_bits(fiber.fetch_extra_word());
            fiber.write_register(dst, from_bool($op(src, imm)));
            Step::Continue
        }
    };
}

fn eq32(a: f32, b: f32) -> bool {
    a == b
}

fn lt32(a: f32, b: f32) -> bool {
    a < b
}

fn eq64(a: f64, b: f64) -> bool {
    a == b
}

fn lt64(a: f64, b: f64) -> bool {
    a < b
}

register_compare!(f_eq_32, as_f32, eq32);
register_compare!(f_lt_32, as_f32, lt32);
register_compare!(f_eq_64, as_f64, eq64);
register_compare!(f_lt_64, as_f64, lt64);
register_compare!(s_eq_64, as_i64, |a: i64, b: i64| a == b);
// the "S" prefix is nominal: the reference interpreter compares these
// cells as raw `uint64_t`, so `s_lt_64` is an unsigned comparison.
register_compare!(s_lt_64, as_u64, |a: u64, b: u64| a < b);

commutative_im32_compare!(f_eq_im_32, eq32);
ordered_im32_compare!(f_lt_im_a_32, f_lt_im_b_32, lt32);

commutative_im64_compare!(f_eq_im_64, eq64);
ordered_im64_compare!(f_lt_im_a_64, f_lt_im_b_64, lt64);

pub(crate) fn s_eq_im_64(fiber: &mut Fiber, word: Instruction) -> Step {
    let dst = codec::decode_a(word);
    let src = as_i64(fiber.read_register(codec::decode_b(word)));
    let imm = fiber.fetch_extra_word() as i64;
    fiber.write_register(dst, from_bool(src == imm));
    Step::Continue
}
