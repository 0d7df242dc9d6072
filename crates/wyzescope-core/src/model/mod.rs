// Domain model: devices, snapshots, diff output.

pub mod device;
pub mod diff;
pub mod snapshot;

pub use device::DeviceRecord;
pub use diff::{ChangeKind, DiffEntry, DiffReport, Namespace};
pub use snapshot::{FetchFailure, FetchOptions, FetchStage, Snapshot};
