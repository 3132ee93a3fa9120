//! the interpreter's dispatch loop, split into per-concern handler
//! modules the way the teacher's `interpreter/{control_flow,math,
//! comparison,funcall}.rs` split its own opcode set. each handler takes
//! the still-opcode-tagged instruction word and returns a [`Step`]; the
//! loop in [`run`] owns fetch/advance and the top-level `match`.

mod arithmetic;
mod calling;
mod comparison;
mod control_flow;
mod memory;

use fibervm_binary::codec::{self, Instruction};
use fibervm_types::{Opcode, Trap};

use crate::fiber::Fiber;

/// the result of dispatching a single instruction.
pub(crate) enum Step {
    Continue,
    Halt,
    Trap(Trap),
}

impl<'p> Fiber<'p> {
    /// run until `HALT` or a trap. the caller (`invoke`) is responsible
    /// for setting up the frames this loop walks and for interpreting the
    /// `Ok(())` result.
    pub(crate) fn run(&mut self) -> Result<(), Trap> {
        loop {
            let word = self.fetch();
            let opcode_byte = codec::decode_opcode(word);
            let opcode = Opcode::from_u8(opcode_byte).unwrap_or_else(|| {
                panic!(
                    "unknown opcode byte {} (run fibervm_program::validate before invoke on untrusted bytecode)",
                    opcode_byte
                )
            });

            log::trace!("dispatch {:?}", opcode);

            let step = match opcode {
                Opcode::halt => Step::Halt,
                Opcode::unreachable => Step::Trap(Trap::Unreachable),

                Opcode::if_nz => control_flow::if_nz(self, word),
                Opcode::when_nz => control_flow::when_nz(self, word),
                Opcode::block => control_flow::block(self, word),
                Opcode::br => control_flow::br(self, word),
                Opcode::br_nz => control_flow::br_nz(self, word),
                Opcode::re => control_flow::re(self, word),
                Opcode::re_nz => control_flow::re_nz(self, word),

                Opcode::read_global_32 => memory::read_global_32(self, word),
                Opcode::read_global_64 => memory::read_global_64(self, word),
                Opcode::copy_im_64 => memory::copy_im_64(self, word),

                Opcode::f_add_32 => arithmetic::f_add_32(self, word),
                Opcode::f_add_im_32 => arithmetic::f_add_im_32(self, word),
                Opcode::f_sub_32 => arithmetic::f_sub_32(self, word),
                Opcode::f_sub_im_a_32 => arithmetic::f_sub_im_a_32(self, word),
                Opcode::f_sub_im_b_32 => arithmetic::f_sub_im_b_32(self, word),
                Opcode::f_add_64 => arithmetic::f_add_64(self, word),
                Opcode::f_add_im_64 => arithmetic::f_add_im_64(self, word),
                Opcode::f_sub_64 => arithmetic::f_sub_64(self, word),
                Opcode::f_sub_im_a_64 => arithmetic::f_sub_im_a_64(self, word),
                Opcode::f_sub_im_b_64 => arithmetic::f_sub_im_b_64(self, word),
                Opcode::i_add_64 => arithmetic::i_add_64(self, word),
                Opcode::i_sub_64 => arithmetic::i_sub_64(self, word),

                Opcode::f_eq_32 => comparison::f_eq_32(self, word),
                Opcode::f_eq_im_32 => comparison::f_eq_im_32(self, word),
                Opcode::f_lt_32 => comparison::f_lt_32(self, word),
                Opcode::f_lt_im_a_32 => comparison::f_lt_im_a_32(self, word),
                Opcode::f_lt_im_b_32 => comparison::f_lt_im_b_32(self, word),
                Opcode::f_eq_64 => comparison::f_eq_64(self, word),
                Opcode::f_eq_im_64 => comparison::f_eq_im_64(self, word),
                Opcode::f_lt_64 => comparison::f_lt_64(self, word),
                Opcode::f_lt_im_a_64 => comparison::f_lt_im_a_64(self, word),
                Opcode::f_lt_im_b_64 => comparison::f_lt_im_b_64(self, word),
                Opcode::s_eq_64 => comparison::s_eq_64(self, word),
                Opcode::s_eq_im_64 => comparison::s_eq_im_64(self, word),
                Opcode::s_lt_64 => comparison::s_lt_64(self, word),

                Opcode::call_v => calling::call_v(self, word),
                Opcode::tail_call_v => calling::tail_call_v(self, word),
                Opcode::ret_v => calling::ret_v(self, word),
            };

            match step {
                Step::Continue => {}
                Step::Halt => return Ok(()),
                Step::Trap(trap) => {
                    log::debug!("trap: {}", trap);
                    return Err(trap);
                }
            }
        }
    }

    /// read the instruction word at the current block's IP and advance it
    /// by one word.
    fn fetch(&mut self) -> Instruction {
        let ip = self.block_frame().instruction_pointer;
        let word = self.instructions()[ip as usize];
        self.block_frame_mut().instruction_pointer = ip + 1;
        word
    }

    /// read one further word (a trailing 64-bit immediate) and advance
    /// the IP past it. used by `COPY_IM_64` and the `_IM_64` arithmetic
    /// and comparison variants.
    pub(crate) fn fetch_extra_word(&mut self) -> Instruction {
        self.fetch()
    }
}
