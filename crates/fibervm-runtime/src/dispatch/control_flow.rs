//! structured control flow: conditional/unconditional block entry
//! (`IF_NZ`/`WHEN_NZ`/`BLOCK`), structured break (`BR`/`BR_NZ`), and
//! structured loop-restart (`RE`/`RE_NZ`).

use fibervm_binary::codec::{self, Instruction};
use fibervm_types::{RegisterIndex, Trap};

use crate::fiber::{BlockFrame, Fiber};

use super::Step;

fn is_truthy(cell: u64) -> bool {
    (cell & 0xFF) != 0
}

/// push a new block frame at `block_index`'s start, checking block-stack
/// capacity first. block overflow has no dedicated trap code; it is
/// folded into `TRAP_STACK_OVERFLOW`, the same as data-stack exhaustion.
fn push_block(fiber: &mut Fiber, block_index: u8, out_index: RegisterIndex) -> Step {
    if fiber.block_stack.len() + 1 > fiber.block_stack_capacity {
        return Step::Trap(Trap::StackOverflow);
    }
    let start = fiber.current_function().bytecode.block_start(block_index);
    fiber.block_stack.push(BlockFrame {
        start_pointer: start,
        instruction_pointer: start,
        out_index,
    });
    fiber.block_top = fiber.block_stack.len() - 1;
    Step::Continue
}

pub(crate) fn if_nz(fiber: &mut Fiber, word: Instruction) -> Step {
    let then_block = codec::decode_a(word);
    let else_block = codec::decode_b(word);
    let cond = codec::decode_c(word);
    let target = if is_truthy(fiber.read_register(cond)) { then_block } else { else_block };
    push_block(fiber, target, 0)
}

pub(crate) fn when_nz(fiber: &mut Fiber, word: Instruction) -> Step {
    let target = codec::decode_a(word);
    let cond = codec::decode_b(word);
    if is_truthy(fiber.read_register(cond)) {
        push_block(fiber, target, 0)
    } else {
        Step::Continue
    }
}

pub(crate) fn block(fiber: &mut Fiber, word: Instruction) -> Step {
    let target = codec::decode_a(word);
    push_block(fiber, target, 0)
}

pub(crate) fn br(fiber: &mut Fiber, word: Instruction) -> Step {
    let k = codec::decode_a(word) as usize;
    fiber.pop_blocks(k + 1);
    Step::Continue
}

pub(crate) fn br_nz(fiber: &mut Fiber, word: Instruction) -> Step {
    let k = codec::decode_a(word) as usize;
    let cond = codec::decode_b(word);
    if is_truthy(fiber.read_register(cond)) {
        fiber.pop_blocks(k + 1);
    }
    Step::Continue
}

/// reset the IP of the block `k` levels down from the top to its own
/// `start_pointer`. unlike `BR`, the block stack itself is untouched --
/// the currently-executing (deeper) frames stay on the stack and keep
/// running; only the targeted ancestor's IP is rewound.
fn restart_block(fiber: &mut Fiber, k: usize) {
    let index = fiber.block_top - k;
    let start = fiber.block_stack[index].start_pointer;
    fiber.block_stack[index].instruction_pointer = start;
}

pub(crate) fn re(fiber: &mut Fiber, word: Instruction) -> Step {
    let k = codec::decode_a(word) as usize;
    restart_block(fiber, k);
    Step::Continue
}

pub(crate) fn re_nz(fiber: &mut Fiber, word: Instruction) -> Step {
    let k = codec::decode_a(word) as usize;
    let cond = codec::decode_b(word);
    if is_truthy(fiber.read_register(cond)) {
        restart_block(fiber, k);
    }
    Step::Continue
}
