use fibervm_binary::Instruction;

/// a function's code: an ordered block table (instruction-word offsets,
/// block 0 is the entry block) plus the flat instruction stream the
/// offsets index into.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub block_table: Vec<u32>,
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    pub fn new(block_table: Vec<u32>, instructions: Vec<Instruction>) -> Self {
        Self {
            block_table,
            instructions,
        }
    }

    pub fn block_count(&self) -> usize {
        self.block_table.len()
    }

    /// the instruction-word offset the given block starts at.
    pub fn block_start(&self, block_index: u8) -> u32 {
        self.block_table[block_index as usize]
    }
}

/// { arg_count, register_count, bytecode }. `register_count` is the
/// number of 64-bit cells this function reserves on the data stack; the
/// first `arg_count` cells receive arguments on entry.
#[derive(Debug, Clone)]
pub struct Function {
    pub arg_count: u8,
    pub register_count: u8,
    pub bytecode: Bytecode,
}

impl Function {
    pub fn new(arg_count: u8, register_count: u8, bytecode: Bytecode) -> Self {
        debug_assert!(
            register_count >= arg_count,
            "register_count must be at least arg_count"
        );
        Self {
            arg_count,
            register_count,
            bytecode,
        }
    }
}
