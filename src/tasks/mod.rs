pub mod dispatch;
pub mod poll_worker;
pub mod pool;

pub use dispatch::DispatchLoop;
pub use poll_worker::PollPolicy;
pub use pool::WorkerPool;
