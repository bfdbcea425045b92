pub mod capture;
pub mod store;

pub use capture::{CaptureError, Captured, capture_fragments, capture_line};
pub use store::{BoardStats, Repair, Store, StoreError};
