pub mod gate;

pub use gate::{AdmissionGate, Permit};
