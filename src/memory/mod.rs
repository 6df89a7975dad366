mod list;
mod partition;
mod policy;

pub use list::{PartitionList, PartitionView, Partitions};
pub use partition::{Partition, PartitionId, PartitionState, TaskId};
pub use policy::Policy;

use thiserror::Error;

/// Recoverable failures of the two public operations. A
/// failed call leaves the partition list exactly as it was
/// before; there is no partially applied state to observe.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("no free partition can hold {size} KB")]
    NoFit { size: u64 },
    #[error("task {0} does not hold a partition")]
    TaskNotFound(TaskId),
}
