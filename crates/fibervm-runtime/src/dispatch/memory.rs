//! globals and immediates: `READ_GLOBAL_32`/`READ_GLOBAL_64` and
//! `COPY_IM_64`.

use fibervm_binary::codec::{self, Instruction};

use crate::fiber::Fiber;

use super::Step;

pub(crate) fn read_global_32(fiber: &mut Fiber, word: Instruction) -> Step {
    let global = codec::decode_w0(word);
    let dst = codec::decode_w1(word);
    let value = fiber.program.globals.read_32(global);
    fiber.write_register(dst, value);
    Step::Continue
}

pub(crate) fn read_global_64(fiber: &mut Fiber, word: Instruction) -> Step {
    let global = codec::decode_w0(word);
    let dst = codec::decode_w1(word);
    let value = fiber.program.globals.read_64(global);
    fiber.write_register(dst, value);
    Step::Continue
}

pub(crate) fn copy_im_64(fiber: &mut Fiber, word: Instruction) -> Step {
    let dst = codec::decode_a(word);
    let imm = fiber.fetch_extra_word();
    fiber.write_register(dst, imm);
    Step::Continue
}
