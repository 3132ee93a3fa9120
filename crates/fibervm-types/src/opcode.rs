// the index of a function within a Program's function table.
pub type FunctionIndex = u16;

// the index of a global within a Program's global table.
pub type GlobalIndex = u16;

// the index of a block within a Function's block table, or a relative
// nesting depth used by `br`/`br_nz`/`re`/`re_nz`.
pub type BlockIndex = u8;

// the index of a 64-bit cell within the currently-executing call's
// register window.
pub type RegisterIndex = u8;

pub const MAX_OPCODE_NUMBER: usize = 40;

/// note:
///
/// - instructions are a fixed 64-bit word, little-endian in memory.
/// - the field layout per opcode is fixed and documented alongside each
///   variant; not every opcode uses every field, and a handler only reads
///   the fields its own opcode defines.
/// - a handful of opcodes (`copy_im_64`, the `_im_64` arithmetic variants)
///   consume a second instruction word immediately following as a 64-bit
///   immediate.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum Opcode {
    // control
    halt = 0,
    unreachable,

    // memory and constants
    read_global_32,
    read_global_64,
    copy_im_64,

    // structured control flow
    if_nz,
    when_nz,
    block,
    br,
    br_nz,
    re,
    re_nz,

    // 32-bit float arithmetic
    f_add_32,
    f_add_im_32,
    f_sub_32,
    f_sub_im_a_32,
    f_sub_im_b_32,

    // 64-bit float arithmetic
    f_add_64,
    f_add_im_64,
    f_sub_64,
    f_sub_im_a_64,
    f_sub_im_b_64,

    // 64-bit integer arithmetic
    i_add_64,
    i_sub_64,

    // 32-bit float comparison
    f_eq_32,
    f_eq_im_32,
    f_lt_32,
    f_lt_im_a_32,
    f_lt_im_b_32,

    // 64-bit float comparison
    f_eq_64,
    f_eq_im_64,
    f_lt_64,
    f_lt_im_a_64,
    f_lt_im_b_64,

    // 64-bit integer comparison
    s_eq_64,
    s_eq_im_64,
    s_lt_64,

    // calls
    call_v,
    tail_call_v,
    ret_v,
}

impl Opcode {
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < MAX_OPCODE_NUMBER {
            // SAFETY: `Opcode` is `repr(u8)` and every discriminant in
            // `0..MAX_OPCODE_NUMBER` is assigned above, so this is a
            // valid transmute from a value we just bounds-checked.
            Some(unsafe { std::mem::transmute::<u8, Opcode>(value) })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_value_round_trips() {
        for raw in 0..MAX_OPCODE_NUMBER as u8 {
            let op = Opcode::from_u8(raw).unwrap();
            assert_eq!(op as u8, raw);
        }
    }

    #[test]
    fn out_of_range_byte_is_rejected() {
        assert_eq!(Opcode::from_u8(MAX_OPCODE_NUMBER as u8), None);
        assert_eq!(Opcode::from_u8(255), None);
    }
}
