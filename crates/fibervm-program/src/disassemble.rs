//! a debug-only text rendering of a function's bytecode, one line per
//! instruction, grouped by block. not used by the dispatch engine; it
//! exists for diagnosing a `Program` a host has constructed, the same way
//! the reference interpreter's `disas()` exists purely to eyeball hand
//! assembled bytecode before running it.

use std::fmt::Write as _;

use fibervm_binary::codec;
use fibervm_types::Opcode;

use crate::bytecode::Function;
use crate::program::Program;

pub fn disassemble(program: &Program, function_index: u16) -> String {
    let function = program.function(function_index);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "function {} (args={}, registers={})",
        function_index, function.arg_count, function.register_count
    );

    for (block_index, _) in function.bytecode.block_table.iter().enumerate() {
        let _ = writeln!(out, "block {}:", block_index);
        disassemble_block(program, function, block_index as u8, &mut out);
    }

    out
}

fn disassemble_block(program: &Program, function: &Function, block_index: u8, out: &mut String) {
    let words = &function.bytecode.instructions;
    let mut ip = function.bytecode.block_start(block_index);

    loop {
        if ip as usize >= words.len() {
            let _ = writeln!(out, "  {:>4}  <end of stream>", ip);
            return;
        }
        let word = words[ip as usize];
        let opcode_byte = codec::decode_opcode(word);
        let Some(opcode) = Opcode::from_u8(opcode_byte) else {
            let _ = writeln!(out, "  {:>4}  <unknown opcode {}>", ip, opcode_byte);
            return;
        };

        let mut next_ip = ip + 1;
        let mut block_done = false;
        let _ = write!(out, "  {:>4}  {}", ip, opcode_name(opcode));

        match opcode {
            Opcode::halt | Opcode::unreachable => {
                block_done = true;
            }
            Opcode::read_global_32 | Opcode::read_global_64 => {
                let _ = write!(out, " g{}, r{}", codec::decode_w0(word), codec::decode_w1(word));
            }
            Opcode::copy_im_64 => {
                let imm = words[ip as usize + 1];
                let _ = write!(out, " r{}, {:#018x}", codec::decode_a(word), imm);
                next_ip += 1;
            }
            Opcode::if_nz => {
                let _ = write!(
                    out,
                    " then=block{}, else=block{}, r{}",
                    codec::decode_a(word),
                    codec::decode_b(word),
                    codec::decode_c(word)
                );
                block_done = true;
            }
            Opcode::when_nz | Opcode::block => {
                let _ = write!(out, " block{}", codec::decode_a(word));
                if opcode == Opcode::when_nz {
                    let _ = write!(out, ", r{}", codec::decode_b(word));
                }
            }
            Opcode::br | Opcode::re => {
                let _ = write!(out, " {}", codec::decode_a(word));
                block_done = true;
            }
            Opcode::br_nz | Opcode::re_nz => {
                let _ = write!(out, " {}, r{}", codec::decode_a(word), codec::decode_b(word));
            }
            Opcode::f_add_32
            | Opcode::f_sub_32
            | Opcode::f_add_64
            | Opcode::f_sub_64
            | Opcode::i_add_64
            | Opcode::i_sub_64
            | Opcode::f_eq_32
            | Opcode::f_lt_32
            | Opcode::f_eq_64
            | Opcode::f_lt_64
            | Opcode::s_eq_64
            | Opcode::s_lt_64 => {
                let _ = write!(
                    out,
                    " r{}, r{}, r{}",
                    codec::decode_a(word),
                    codec::decode_b(word),
                    codec::decode_c(word)
                );
            }
            Opcode::f_add_im_32
            | Opcode::f_sub_im_a_32
            | Opcode::f_sub_im_b_32
            | Opcode::f_eq_im_32
            | Opcode::f_lt_im_a_32
            | Opcode::f_lt_im_b_32 => {
                let _ = write!(
                    out,
                    " r{}, r{}, {}",
                    codec::decode_a(word),
                    codec::decode_b(word),
                    codec::decode_im32_f32(word)
                );
            }
            Opcode::f_add_im_64
            | Opcode::f_sub_im_a_64
            | Opcode::f_sub_im_b_64
            | Opcode::f_eq_im_64
            | Opcode::f_lt_im_a_64
            | Opcode::f_lt_im_b_64
            | Opcode::s_eq_im_64 => {
                let imm = words[ip as usize + 1];
                let _ = write!(out, " r{}, r{}, {:#018x}", codec::decode_a(word), codec::decode_b(word), imm);
                next_ip += 1;
            }
            Opcode::call_v | Opcode::tail_call_v => {
                let callee_index = codec::decode_w0(word);
                if opcode == Opcode::call_v {
                    let _ = write!(out, " fn{} -> r{}", callee_index, codec::decode_w1(word));
                } else {
                    let _ = write!(out, " fn{}", callee_index);
                }
                if let Some(callee) = program.functions.get(callee_index as usize) {
                    let slots = codec::arg_slot_count(callee.arg_count as usize) as u32;
                    let _ = write!(out, " (");
                    for i in 0..callee.arg_count as usize {
                        if i > 0 {
                            let _ = write!(out, ", ");
                        }
                        let _ = write!(out, "r{}", codec::read_register_arg(words, next_ip, i));
                    }
                    let _ = write!(out, ")");
                    next_ip += slots;
                } else {
                    let _ = write!(out, " <unknown callee>");
                }
                block_done = opcode == Opcode::tail_call_v;
            }
            Opcode::ret_v => {
                let _ = write!(out, " r{}", codec::decode_a(word));
                block_done = true;
            }
        }

        let _ = writeln!(out);
        if block_done {
            return;
        }
        ip = next_ip;
    }
}

fn opcode_name(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::halt => "halt",
        Opcode::unreachable => "unreachable",
        Opcode::read_global_32 => "read_global_32",
        Opcode::read_global_64 => "read_global_64",
        Opcode::copy_im_64 => "copy_im_64",
        Opcode::if_nz => "if_nz",
        Opcode::when_nz => "when_nz",
        Opcode::block => "block",
        Opcode::br => "br",
        Opcode::br_nz => "br_nz",
        Opcode::re => "re",
        Opcode::re_nz => "re_nz",
        Opcode::f_add_32 => "f_add_32",
        Opcode::f_add_im_32 => "f_add_im_32",
        Opcode::f_sub_32 => "f_sub_32",
        Opcode::f_sub_im_a_32 => "f_sub_im_a_32",
        Opcode::f_sub_im_b_32 => "f_sub_im_b_32",
        Opcode::f_add_64 => "f_add_64",
        Opcode::f_add_im_64 => "f_add_im_64",
        Opcode::f_sub_64 => "f_sub_64",
        Opcode::f_sub_im_a_64 => "f_sub_im_a_64",
        Opcode::f_sub_im_b_64 => "f_sub_im_b_64",
        Opcode::i_add_64 => "i_add_64",
        Opcode::i_sub_64 => "i_sub_64",
        Opcode::f_eq_32 => "f_eq_32",
        Opcode::f_eq_im_32 => "f_eq_im_32",
        Opcode::f_lt_32 => "f_lt_32",
        Opcode::f_lt_im_a_32 => "f_lt_im_a_32",
        Opcode::f_lt_im_b_32 => "f_lt_im_b_32",
        Opcode::f_eq_64 => "f_eq_64",
        Opcode::f_eq_im_64 => "f_eq_im_64",
        Opcode::f_lt_64 => "f_lt_64",
        Opcode::f_lt_im_a_64 => "f_lt_im_a_64",
        Opcode::f_lt_im_b_64 => "f_lt_im_b_64",
        Opcode::s_eq_64 => "s_eq_64",
        Opcode::s_eq_im_64 => "s_eq_im_64",
        Opcode::s_lt_64 => "s_lt_64",
        Opcode::call_v => "call_v",
        Opcode::tail_call_v => "tail_call_v",
        Opcode::ret_v => "ret_v",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;
    use crate::globals::GlobalTable;
    use fibervm_binary::InstructionWriter;

    #[test]
    fn disassembles_a_trivial_function() {
        let mut w = InstructionWriter::new();
        let entry = w.next_offset();
        w.write_1(Opcode::ret_v, 0);
        let f = Function::new(1, 1, Bytecode::new(vec![entry], w.finish()));
        let program = Program::new(vec![f], GlobalTable::new());

        let text = disassemble(&program, 0);
        assert!(text.contains("ret_v"));
        assert!(text.contains("block 0:"));
    }
}
