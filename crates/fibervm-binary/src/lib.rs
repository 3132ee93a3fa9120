pub mod codec;
pub mod writer;

pub use codec::Instruction;
pub use writer::InstructionWriter;
