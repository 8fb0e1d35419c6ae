//! Region, partition, and the per-service configuration bundle.

mod config;
mod partition;
mod region;

pub use config::{Protocol, ServiceConfig, ServiceOptions};
pub use partition::Partition;
pub use region::Region;
