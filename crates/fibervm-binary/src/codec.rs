//! pack/unpack a 64-bit instruction word into an opcode byte plus operand
//! fields, and optionally an attached 32- or 64-bit immediate.
//!
//! field layout (bit positions, word is little-endian in memory):
//!
//! ```text
//! byte 0        opcode
//! byte 1        C            \ also readable as W1 (bits[8:16])
//! byte 2        B
//! byte 3..5     A / W0        A is W0's low byte; W0 spans bytes 3-4
//! byte 4..8     IM32          mutually exclusive with W0: an opcode
//!                             carries W0 xor a 32-bit immediate, never both
//! ```
//!
//! a 64-bit immediate does not fit in a single word at all; it occupies
//! the *next* instruction word in its entirety, bit-identical to the
//! source value (no further endianness conversion beyond the word's own
//! little-endian byte order).

use fibervm_types::Opcode;

/// one instruction word. instruction-pointer arithmetic throughout this
/// workspace is in units of whole words, never bytes.
pub type Instruction = u64;

#[inline]
pub fn encode_0(opcode: Opcode) -> Instruction {
    opcode as u64
}

#[inline]
pub fn encode_1(opcode: Opcode, a: u8) -> Instruction {
    encode_0(opcode) | ((a as u64) << 24)
}

#[inline]
pub fn encode_2(opcode: Opcode, a: u8, b: u8) -> Instruction {
    encode_1(opcode, a) | ((b as u64) << 16)
}

#[inline]
pub fn encode_3(opcode: Opcode, a: u8, b: u8, c: u8) -> Instruction {
    encode_2(opcode, a, b) | ((c as u64) << 8)
}

#[inline]
pub fn encode_w0(opcode: Opcode, w0: u16) -> Instruction {
    encode_0(opcode) | ((w0 as u64) << 24)
}

#[inline]
pub fn encode_w1(opcode: Opcode, w0: u16, w1: u8) -> Instruction {
    encode_w0(opcode, w0) | ((w1 as u64) << 8)
}

/// OR a 32-bit immediate into the upper half of a word built by
/// [`encode_0`]/[`encode_1`]/[`encode_2`]/[`encode_3`]. never call this on
/// a word built by [`encode_w0`]/[`encode_w1`]: the two encodings occupy
/// the same bits and would corrupt each other.
#[inline]
pub fn with_im32(word: Instruction, im32: u32) -> Instruction {
    word | ((im32 as u64) << 32)
}

#[inline]
pub fn encode_0_im32(opcode: Opcode, im32: u32) -> Instruction {
    with_im32(encode_0(opcode), im32)
}

#[inline]
pub fn encode_1_im32(opcode: Opcode, a: u8, im32: u32) -> Instruction {
    with_im32(encode_1(opcode, a), im32)
}

#[inline]
pub fn encode_2_im32(opcode: Opcode, a: u8, b: u8, im32: u32) -> Instruction {
    with_im32(encode_2(opcode, a, b), im32)
}

/// bit-identical wrap of a 64-bit immediate as its own trailing word.
#[inline]
pub fn encode_im64(imm: u64) -> Instruction {
    imm
}

#[inline]
pub fn decode_opcode(word: Instruction) -> u8 {
    (word & 0xFF) as u8
}

#[inline]
pub fn decode_a(word: Instruction) -> u8 {
    ((word >> 24) & 0xFF) as u8
}

#[inline]
pub fn decode_b(word: Instruction) -> u8 {
    ((word >> 16) & 0xFF) as u8
}

#[inline]
pub fn decode_c(word: Instruction) -> u8 {
    ((word >> 8) & 0xFF) as u8
}

#[inline]
pub fn decode_w0(word: Instruction) -> u16 {
    ((word >> 24) & 0xFFFF) as u16
}

#[inline]
pub fn decode_w1(word: Instruction) -> u8 {
    ((word >> 8) & 0xFF) as u8
}

#[inline]
pub fn decode_im32(word: Instruction) -> u32 {
    ((word >> 32) & 0xFFFF_FFFF) as u32
}

#[inline]
pub fn decode_im32_f32(word: Instruction) -> f32 {
    f32::from_bits(decode_im32(word))
}

#[inline]
pub fn decode_im64(word: Instruction) -> u64 {
    word
}

#[inline]
pub fn decode_im64_f64(word: Instruction) -> f64 {
    f64::from_bits(word)
}

/// number of instruction words consumed by `n` packed register-index
/// bytes, zero-padded to a whole word: `ceil(n / 8)`.
#[inline]
pub fn arg_slot_count(n: usize) -> usize {
    (n + 7) / 8
}

/// read the `i`-th packed register-index byte out of a register-argument
/// block that starts at word offset `start_word`, without materializing
/// the whole block. mirrors how `call_v`/`tail_call_v` read their
/// trailing argument bytes directly out of the instruction stream.
#[inline]
pub fn read_register_arg(words: &[Instruction], start_word: u32, i: usize) -> u8 {
    let word = words[start_word as usize + i / 8];
    word.to_le_bytes()[i % 8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn three_register_form_round_trips() {
        let word = encode_3(Opcode::i_add_64, 10, 20, 30);
        assert_eq!(decode_opcode(word), Opcode::i_add_64 as u8);
        assert_eq!(decode_a(word), 10);
        assert_eq!(decode_b(word), 20);
        assert_eq!(decode_c(word), 30);
    }

    #[test]
    fn w0_w1_form_round_trips() {
        let word = encode_w1(Opcode::call_v, 0xBEEF, 7);
        assert_eq!(decode_opcode(word), Opcode::call_v as u8);
        assert_eq!(decode_w0(word), 0xBEEF);
        assert_eq!(decode_w1(word), 7);
    }

    #[test]
    fn im32_form_round_trips() {
        let word = encode_2_im32(Opcode::f_add_im_32, 3, 4, 1.5f32.to_bits());
        assert_eq!(decode_a(word), 3);
        assert_eq!(decode_b(word), 4);
        assert_eq!(decode_im32_f32(word), 1.5f32);
    }

    #[test]
    fn im64_occupies_the_whole_word() {
        let word = encode_im64(0.5f64.to_bits());
        assert_eq!(decode_im64_f64(word), 0.5f64);
    }

    #[test]
    fn read_register_arg_reads_across_word_boundaries() {
        let words = vec![0x0706_0504_0302_0100u64, 0x0000_0000_0000_0009u64];
        assert_eq!(read_register_arg(&words, 0, 0), 0x00);
        assert_eq!(read_register_arg(&words, 0, 7), 0x07);
        assert_eq!(read_register_arg(&words, 0, 8), 0x09);
    }

    #[test]
    fn arg_slot_count_rounds_up() {
        assert_eq!(arg_slot_count(0), 0);
        assert_eq!(arg_slot_count(1), 1);
        assert_eq!(arg_slot_count(8), 1);
        assert_eq!(arg_slot_count(9), 2);
        assert_eq!(arg_slot_count(16), 2);
        assert_eq!(arg_slot_count(17), 3);
    }
}
