use crate::codec::{self, Instruction};
use fibervm_types::{Opcode, RegisterIndex};

/// an append-only buffer of instruction words, used to build the
/// `instructions` stream of a `Bytecode` unit (tests and embedders that
/// construct programs directly; this workspace defines no text-format
/// assembler).
pub struct InstructionWriter {
    words: Vec<Instruction>,
}

impl Default for InstructionWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionWriter {
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// the offset (in instruction words) of the next word to be written --
    /// i.e. where the instruction about to be written will land.
    pub fn next_offset(&self) -> u32 {
        self.words.len() as u32
    }

    fn push(&mut self, word: Instruction) -> u32 {
        let offset = self.next_offset();
        self.words.push(word);
        offset
    }

    pub fn write_0(&mut self, opcode: Opcode) -> u32 {
        self.push(codec::encode_0(opcode))
    }

    pub fn write_1(&mut self, opcode: Opcode, a: u8) -> u32 {
        self.push(codec::encode_1(opcode, a))
    }

    pub fn write_2(&mut self, opcode: Opcode, a: u8, b: u8) -> u32 {
        self.push(codec::encode_2(opcode, a, b))
    }

    pub fn write_3(&mut self, opcode: Opcode, a: u8, b: u8, c: u8) -> u32 {
        self.push(codec::encode_3(opcode, a, b, c))
    }

    pub fn write_w0(&mut self, opcode: Opcode, w0: u16) -> u32 {
        self.push(codec::encode_w0(opcode, w0))
    }

    pub fn write_w1(&mut self, opcode: Opcode, w0: u16, w1: u8) -> u32 {
        self.push(codec::encode_w1(opcode, w0, w1))
    }

    pub fn write_1_im32(&mut self, opcode: Opcode, a: u8, im32: u32) -> u32 {
        self.push(codec::encode_1_im32(opcode, a, im32))
    }

    pub fn write_2_im32(&mut self, opcode: Opcode, a: u8, b: u8, im32: u32) -> u32 {
        self.push(codec::encode_2_im32(opcode, a, b, im32))
    }

    /// write a following 64-bit immediate word. must immediately follow
    /// the opcode word it belongs to.
    pub fn write_im64(&mut self, imm: u64) -> u32 {
        self.push(codec::encode_im64(imm))
    }

    /// append a packed register-index argument block, zero-padded to a
    /// whole instruction word, as required after `call_v`/`tail_call_v`.
    pub fn write_registers(&mut self, indices: &[RegisterIndex]) -> u32 {
        let start = self.next_offset();
        let slots = codec::arg_slot_count(indices.len());
        let mut bytes = vec![0u8; slots * 8];
        bytes[..indices.len()].copy_from_slice(indices);
        for chunk in bytes.chunks_exact(8) {
            let word = u64::from_le_bytes(chunk.try_into().unwrap());
            self.words.push(word);
        }
        start
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_opcode;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_block_is_zero_padded_to_a_word() {
        let mut w = InstructionWriter::new();
        w.write_0(Opcode::halt);
        let start = w.write_registers(&[1, 2, 3]);
        assert_eq!(start, 1);
        let words = w.finish();
        assert_eq!(words.len(), 2);
        let bytes = words[1].to_le_bytes();
        assert_eq!(&bytes, &[1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn nine_registers_span_two_words() {
        let mut w = InstructionWriter::new();
        let indices: Vec<RegisterIndex> = (0..9).collect();
        w.write_registers(&indices);
        let words = w.finish();
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn offsets_advance_by_one_word_per_call() {
        let mut w = InstructionWriter::new();
        let a = w.write_0(Opcode::halt);
        let b = w.write_1(Opcode::ret_v, 0);
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(decode_opcode(w.finish()[0]), Opcode::halt as u8);
    }
}
