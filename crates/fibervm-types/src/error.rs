use std::any::Any;
use std::fmt::{Debug, Display};

/// shared shape for the hand-rolled error types used at crate boundaries
/// in this workspace (`ValidationError` in `fibervm-program`, and any
/// future load-time error types). there is no `thiserror`/`anyhow` in this
/// workspace; every error is a plain struct implementing this trait.
pub trait VmError: Debug + Display {
    fn message(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}
