mod dispatch;
mod fiber;
mod invoke;

pub use fiber::Fiber;
