//! Domain types for the car-buying analysis service.
//!
//! Everything here is synchronous and free of I/O: the validated request,
//! the job record with its status machine, and the report formatter.

pub mod error;
pub mod job;
pub mod report;
pub mod request;
pub mod types;
