pub mod error;
pub mod opcode;
pub mod trap;

pub use error::VmError;
pub use opcode::{BlockIndex, FunctionIndex, GlobalIndex, Opcode, RegisterIndex};
pub use trap::Trap;
