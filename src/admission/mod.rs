//! Admission control: token buckets, the per-route controller, and policy
//! reloading.

mod bucket;
mod controller;
mod reload;

pub use bucket::TokenBucket;
pub use controller::AdmissionController;
pub use reload::PolicyReloader;
