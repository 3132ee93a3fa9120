//! float and integer arithmetic. every opcode here writes its result to
//! register `a`; the 3-register form reads operands from `b` (lhs) and
//! `c` (rhs). the `_IM_32`/`_IM_64` forms read one operand from register
//! `b` and carry the other inline; addition is commutative and has a
//! single immediate form, subtraction has `IM_A` (immediate on the left)
//! and `IM_B` (immediate on the right) variants.

use fibervm_binary::codec::{self, Instruction};

use crate::fiber::Fiber;

use super::Step;

macro_rules! binary_register_op {
    ($name:ident, $read:ident, $write:ident, $op:expr) => {
        pub(crate) fn $name(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let lhs = $read(fiber.read_register(codec::decode_b(word)));
            let rhs = $read(fiber.read_register(codec::decode_c(word)));
            fiber.write_register(dst, $write($op(lhs, rhs)));
            Step::Continue
        }
    };
}

macro_rules! commutative_im32_op {
    ($name:ident, $op:expr) => {
        pub(crate) fn $name(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f32(fiber.read_register(codec::decode_b(word)));
            let imm = f32::from_bits(codec::decode_im32(word));
            fiber.write_register(dst, from_f32($op(src, imm)));
            Step::Continue
        }
    };
}

macro_rules! ordered_im32_op {
    ($name_a:ident, $name_b:ident, $op:expr) => {
        pub(crate) fn $name_a(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f32(fiber.read_register(codec::decode_b(word)));
            let imm = f32::from_bits(codec::decode_im32(word));
            fiber.write_register(dst, from_f32($op(imm, src)));
            Step::Continue
        }

        pub(crate) fn $name_b(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f32(fiber.read_register(codec::decode_b(word)));
            let imm = f32::from_bits(codec::decode_im32(word));
            fiber.write_register(dst, from_f32($op(src, imm)));
            Step::Continue
        }
    };
}

macro_rules! commutative_im64_op {
    ($name:ident, $op:expr) => {
        pub(crate) fn $name(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f64(fiber.read_register(codec::decode_b(word)));
            let imm = f64::from_bits(fiber.fetch_extra_word());
            fiber.write_register(dst, from_f64($op(src, imm)));
            Step::Continue
        }
    };
}

macro_rules! ordered_im64_op {
    ($name_a:ident, $name_b:ident, $op:expr) => {
        pub(crate) fn $name_a(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f64(fiber.read_register(codec::decode_b(word)));
            let imm = f64::from_bits(fiber.fetch_extra_word());
            fiber.write_register(dst, from_f64($op(imm, src)));
            Step::Continue
        }

        pub(crate) fn $name_b(fiber: &mut Fiber, word: Instruction) -> Step {
            let dst = codec::decode_a(word);
            let src = as_f64(fiber.read_register(codec::decode_b(word)));
            let imm = f64::from_bits(fiber.fetch_extra_word());
            fiber.write_register(dst, from_f64($op(src, imm)));
            Step::Continue
        }
    };
}

fn as_f32(cell: u64) -> f32 {
    f32::from_bits(cell as u32)
}

fn from_f32(value: f32) -> u64 {
    value.to_bits() as u64
}

fn as_f64(cell: u64) -> f64 {
    f64::from_bits(cell)
}

fn from_f64(value: f64) -> u64 {
    value.to_bits()
}

fn as_i64(cell: u64) -> i64 {
    cell as i64
}

fn from_i64(value: i64) -> u64 {
    value as u64
}

fn add32(a: f32, b: f32) -> f32 {
    a + b
}

fn sub32(a: f32, b: f32) -> f32 {
    a - b
}

fn add64(a: f64, b: f64) -> f64 {
    a + b
}

fn sub64(a: f64, b: f64) -> f64 {
    a - b
}

binary_register_op!(f_add_32, as_f32, from_f32, add32);
binary_register_op!(f_sub_32, as_f32, from_f32, sub32);
binary_register_op!(f_add_64, as_f64, from_f64, add64);
binary_register_op!(f_sub_64, as_f64, from_f64, sub64);
binary_register_op!(i_add_64, as_i64, from_i64, |a: i64, b: i64| a.wrapping_add(b));
binary_register_op!(i_sub_64, as_i64, from_i64, |a: i64, b: i64| a.wrapping_sub(b));

commutative_im32_op!(f_add_im_32, add32);
ordered_im32_op!(f_sub_im_a_32, f_sub_im_b_32, sub32);

commutative_im64_op!(f_add_im_64, add64);
ordered_im64_op!(f_sub_im_a_64, f_sub_im_b_64, sub64);
