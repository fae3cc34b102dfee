// Deterministic layout engine: pre-measured text, absolute placement on a
// fixed canvas. CPU-bound solving runs inside tokio::task::spawn_blocking.

pub mod positioned;
pub mod solvers;
pub mod text_measure;
pub mod theme;
pub mod units;
