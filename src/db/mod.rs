pub mod models;
pub mod repository;
pub mod write_tx;

pub use repository::*;
pub use write_tx::WriteTx;
