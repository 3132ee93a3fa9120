/// a terminal, non-recoverable condition surfaced from the dispatch engine
/// to `invoke`'s caller. traps are the engine's only error channel: there
/// is no panic and no exception unwinding across the fiber boundary.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Trap {
    /// the `unreachable` instruction was executed. this is a
    /// programmer-intent trap: the producer of the bytecode asserted this
    /// point could not be reached.
    Unreachable = 1,

    /// pushing another call frame would exceed the fiber's call-stack
    /// budget. checked before any mutation.
    CallOverflow = 2,

    /// pushing another register window (or growing one via a tail call)
    /// would exceed the fiber's data-stack budget. checked before any
    /// mutation.
    StackOverflow = 3,
}

impl Trap {
    /// the exit-code mapping a CLI demo would use; 0 is reserved for the
    /// non-trap `Okay` outcome of `invoke`, which this type does not model
    /// (a successful `invoke` returns `Ok(())`, not a `Trap`).
    pub fn exit_code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Trap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Trap::Unreachable => "UNREACHABLE",
            Trap::CallOverflow => "CALL_OVERFLOW",
            Trap::StackOverflow => "STACK_OVERFLOW",
        };
        write!(f, "{}", name)
    }
}

impl std::error::Error for Trap {}
