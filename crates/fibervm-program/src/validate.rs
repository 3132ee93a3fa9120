//! an independent, optional pass over a constructed [`Program`] that
//! rejects malformed bytecode before any fiber ever calls `invoke` on it.
//!
//! the dispatch engine itself trusts its input (§7 of the spec treats
//! out-of-range indices as undefined behavior at the hot-path level,
//! matching how the reference interpreter trusts its own tables). this
//! module is the "should provide" half of that design: a host that does
//! not trust its bytecode producer can run `validate` once, up front, and
//! skip the cost on every subsequent `invoke`.

use std::collections::{HashMap, VecDeque};

use fibervm_binary::codec::{self, Instruction};
use fibervm_types::Opcode;

use crate::error::ValidationError;
use crate::program::Program;

pub fn validate(program: &Program) -> Result<(), ValidationError> {
    log::debug!("validating {} function(s)", program.function_count());
    for (index, function) in program.functions.iter().enumerate() {
        validate_function(program, index as u16, function).map_err(|e| {
            log::debug!("{}", e);
            e
        })?;
    }
    Ok(())
}

fn err(function_index: u16, offset: u32, message: impl Into<String>) -> ValidationError {
    ValidationError::new(function_index, offset, message)
}

fn validate_function(
    program: &Program,
    function_index: u16,
    function: &crate::bytecode::Function,
) -> Result<(), ValidationError> {
    if function.register_count < function.arg_count {
        return Err(err(
            function_index,
            0,
            format!(
                "register_count ({}) is smaller than arg_count ({})",
                function.register_count, function.arg_count
            ),
        ));
    }

    let block_count = function.bytecode.block_count();
    if block_count == 0 {
        return Err(err(function_index, 0, "function has no blocks"));
    }

    let words = &function.bytecode.instructions;
    for (block_index, &offset) in function.bytecode.block_table.iter().enumerate() {
        if offset as usize >= words.len() {
            return Err(err(
                function_index,
                offset,
                format!("block {} starts past the end of the instruction stream", block_index),
            ));
        }
    }

    let register_count = function.register_count as u32;

    // block 0 (the entry block) is always reachable at depth 1: the
    // function's own root block frame is already on the block stack by
    // the time any of its instructions run.
    let mut visited: HashMap<u8, u32> = HashMap::new();
    let mut worklist: VecDeque<(u8, u32)> = VecDeque::new();
    worklist.push_back((0, 1));

    while let Some((block_index, depth)) = worklist.pop_front() {
        if block_index as usize >= block_count {
            return Err(err(
                function_index,
                function.bytecode.block_start(0),
                format!("block index {} is out of range", block_index),
            ));
        }
        if let Some(&seen) = visited.get(&block_index) {
            if seen >= depth {
                continue;
            }
        }
        visited.insert(block_index, depth);

        walk_block(
            program,
            function_index,
            function,
            words,
            register_count,
            block_index,
            depth,
            &mut worklist,
        )?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn walk_block(
    program: &Program,
    function_index: u16,
    function: &crate::bytecode::Function,
    words: &[Instruction],
    register_count: u32,
    block_index: u8,
    depth: u32,
    worklist: &mut VecDeque<(u8, u32)>,
) -> Result<(), ValidationError> {
    let mut ip = function.bytecode.block_start(block_index);

    loop {
        if ip as usize >= words.len() {
            return Err(err(function_index, ip, "block runs off the end of the instruction stream"));
        }
        let word = words[ip as usize];
        let opcode_byte = codec::decode_opcode(word);
        let opcode = Opcode::from_u8(opcode_byte)
            .ok_or_else(|| err(function_index, ip, format!("unknown opcode byte {}", opcode_byte)))?;

        let mut next_ip = ip + 1;
        let mut block_done = false;

        let check_register = |r: u8, at: u32| -> Result<(), ValidationError> {
            if (r as u32) >= register_count {
                Err(err(
                    function_index,
                    at,
                    format!("register r{} is out of range (register_count = {})", r, register_count),
                ))
            } else {
                Ok(())
            }
        };

        match opcode {
            Opcode::halt | Opcode::unreachable => {
                block_done = true;
            }
            Opcode::read_global_32 | Opcode::read_global_64 => {
                let global_index = codec::decode_w0(word);
                let dst = codec::decode_w1(word);
                if global_index as usize >= program.globals.len() {
                    return Err(err(function_index, ip, format!("global index {} is out of range", global_index)));
                }
                check_register(dst, ip)?;
            }
            Opcode::copy_im_64 => {
                let dst = codec::decode_a(word);
                check_register(dst, ip)?;
                next_ip += 1;
            }
            Opcode::if_nz => {
                let then_block = codec::decode_a(word);
                let else_block = codec::decode_b(word);
                let cond = codec::decode_c(word);
                check_register(cond, ip)?;
                worklist.push_back((then_block, depth + 1));
                worklist.push_back((else_block, depth + 1));
                block_done = true;
            }
            Opcode::when_nz => {
                let target = codec::decode_a(word);
                let cond = codec::decode_b(word);
                check_register(cond, ip)?;
                worklist.push_back((target, depth + 1));
            }
            Opcode::block => {
                let target = codec::decode_a(word);
                worklist.push_back((target, depth + 1));
            }
            Opcode::br => {
                let k = codec::decode_a(word) as u32;
                if k + 1 > depth {
                    return Err(err(function_index, ip, format!("br {} would pop past the function's own root block", k)));
                }
                block_done = true;
            }
            Opcode::br_nz => {
                let k = codec::decode_a(word) as u32;
                let cond = codec::decode_b(word);
                check_register(cond, ip)?;
                if k + 1 > depth {
                    return Err(err(function_index, ip, format!("br_nz {} would pop past the function's own root block", k)));
                }
            }
            Opcode::re => {
                let k = codec::decode_a(word) as u32;
                if k >= depth {
                    return Err(err(function_index, ip, format!("re {} targets a block that isn't on the stack", k)));
                }
                block_done = true;
            }
            Opcode::re_nz => {
                let k = codec::decode_a(word) as u32;
                let cond = codec::decode_b(word);
                check_register(cond, ip)?;
                if k >= depth {
                    return Err(err(function_index, ip, format!("re_nz {} targets a block that isn't on the stack", k)));
                }
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
                check_register(codec::decode_a(word), ip)?;
                check_register(codec::decode_b(word), ip)?;
                check_register(codec::decode_c(word), ip)?;
            }
            Opcode::f_add_im_32
            | Opcode::f_sub_im_a_32
            | Opcode::f_sub_im_b_32
            | Opcode::f_eq_im_32
            | Opcode::f_lt_im_a_32
            | Opcode::f_lt_im_b_32 => {
                check_register(codec::decode_a(word), ip)?;
                check_register(codec::decode_b(word), ip)?;
            }
            Opcode::f_add_im_64
            | Opcode::f_sub_im_a_64
            | Opcode::f_sub_im_b_64
            | Opcode::f_eq_im_64
            | Opcode::f_lt_im_a_64
            | Opcode::f_lt_im_b_64
            | Opcode::s_eq_im_64 => {
                check_register(codec::decode_a(word), ip)?;
                check_register(codec::decode_b(word), ip)?;
                next_ip += 1;
            }
            Opcode::call_v | Opcode::tail_call_v => {
                let callee_index = codec::decode_w0(word);
                if callee_index as usize >= program.function_count() {
                    return Err(err(function_index, ip, format!("call to out-of-range function {}", callee_index)));
                }
                if opcode == Opcode::call_v {
                    check_register(codec::decode_w1(word), ip)?;
                }
                let callee = program.function(callee_index);
                let slots = codec::arg_slot_count(callee.arg_count as usize) as u32;
                if (next_ip + slots) as usize > words.len() {
                    return Err(err(
                        function_index,
                        ip,
                        "call's register-argument block runs off the end of the instruction stream",
                    ));
                }
                for i in 0..callee.arg_count as usize {
                    let r = codec::read_register_arg(words, next_ip, i);
                    check_register(r, ip)?;
                }
                next_ip += slots;
                if opcode == Opcode::tail_call_v {
                    block_done = true;
                }
            }
            Opcode::ret_v => {
                check_register(codec::decode_a(word), ip)?;
                block_done = true;
            }
        }

        if block_done {
            break;
        }
        ip = next_ip;
    }

    Ok(())
}
