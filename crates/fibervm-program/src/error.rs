use std::any::Any;
use std::fmt::{self, Display};

use fibervm_types::VmError;

/// a rejection from the load-time validation pass (§4.4). carries enough
/// context to locate the offending instruction without needing a
/// disassembly pass first.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub function_index: u16,
    pub instruction_offset: u32,
    message: String,
}

impl ValidationError {
    pub fn new(function_index: u16, instruction_offset: u32, message: impl Into<String>) -> Self {
        Self {
            function_index,
            instruction_offset,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation error in function {} at instruction {}: {}",
            self.function_index, self.instruction_offset, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

impl VmError for ValidationError {
    fn message(&self) -> &str {
        &self.message
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
