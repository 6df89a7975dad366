use super::partition::{Partition, PartitionId, PartitionState, TaskId};
use super::policy::Policy;
use super::MemoryError;

use std::collections::HashMap;
use log::debug;

/// Ordered list of the partitions tiling a fixed address
/// space. The list owns every node: partitions live in an
/// id-keyed map and point to their neighbors through ids,
/// never through references, so splitting and merging can
/// not leave a dangling link behind.
pub struct PartitionList {
    capacity: u64,
    partitions: HashMap<PartitionId, Partition>,
    head: PartitionId,
    id_counter: PartitionId,
    allocated: u64,
}

/// Read-only record of one partition, detached from the
/// node map so presentation code never sees the links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionView {
    pub address: u64,
    pub size: u64,
    pub state: PartitionState,
}

impl PartitionList {
    /// Creates a list over `capacity` KB of memory, covered
    /// by a single free partition at address 0. A positive
    /// capacity is the only precondition of the whole
    /// subsystem, checked here once.
    pub fn new(capacity: u64) -> Self {
        assert!(capacity > 0, "memory capacity must be positive");

        let id = 1;
        let mut partitions = HashMap::new();
        partitions.insert(
            id, Partition {
                id,
                address: 0,
                size: capacity,
                state: PartitionState::Free,
                prev: None,
                next: None,
            }
        );

        Self {
            capacity,
            partitions,
            head: id,
            id_counter: id + 1,
            allocated: 0,
        }
    }

    /// Total extent of the address space, in KB.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// KB currently held by tasks.
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Iterates over the partitions in ascending address
    /// order by walking the links from the head. The
    /// iterator never mutates and can be restarted at will
    /// by calling `iter` again.
    pub fn iter(&self) -> Partitions<'_> {
        Partitions {
            list: self,
            next: Some(self.head),
        }
    }

    /// Captures the current partition layout as a sequence
    /// of plain records, in address order.
    pub fn snapshot(&self) -> Vec<PartitionView> {
        self.iter()
            .map(|partition| PartitionView {
                address: partition.address,
                size: partition.size,
                state: partition.state,
            })
            .collect()
    }

    /// Gives `size` KB of memory to `task`, in the free
    /// partition chosen by `policy`. An exact fit is marked
    /// allocated as-is; a larger fit is split first, so the
    /// request occupies the front of it and the rest stays
    /// free right after. Fails with [`MemoryError::NoFit`]
    /// when no free partition is large enough, leaving the
    /// list untouched.
    pub fn allocate(
        &mut self,
        task: TaskId,
        size: u64,
        policy: Policy,
    ) -> Result<(), MemoryError> {
        assert!(task != 0, "task numbers start at 1");
        assert!(size > 0, "allocation size must be positive");
        debug_assert!(
            self.iter().all(|p| p.owner() != Some(task)),
            "task {task} already holds a partition"
        );

        // Ask the policy for a free partition able to hold
        // the request. If there is none, report the failure
        // without having touched anything.
        let fit = match policy.select(self, size) {
            Some(fit) => fit,
            None => return Err(MemoryError::NoFit { size }),
        };

        // If the chosen partition is larger than the
        // request, split it and take the head; the policy
        // already guaranteed it cannot be smaller.
        let fit_size = self.partitions.get(&fit).unwrap().size;
        let target = if fit_size > size {
            self.split(fit, size)
        } else {
            fit
        };

        let partition = self.partitions.get_mut(&target).unwrap();
        partition.state = PartitionState::Allocated(task);
        self.allocated += size;

        debug!(
            "task {} takes {} KB at address {}",
            task, size, partition.address,
        );
        Ok(())
    }

    /// Releases the partition held by `task` and coalesces
    /// it with its free neighbors. Fails with
    /// [`MemoryError::TaskNotFound`] when the task holds
    /// nothing, leaving the list untouched.
    pub fn deallocate(&mut self, task: TaskId) -> Result<(), MemoryError> {
        // Find the partition the task holds. Owners are
        // unique, so the first match is the only one.
        let freed = match self.iter().find(|p| p.owner() == Some(task)) {
            Some(partition) => partition.id,
            None => return Err(MemoryError::TaskNotFound(task)),
        };

        let partition = self.partitions.get_mut(&freed).unwrap();
        partition.state = PartitionState::Free;
        self.allocated -= partition.size;

        // Coalesce with the neighbors, predecessor side
        // first. No two adjacent partitions were both free
        // before this call, so one merge per side is always
        // enough; a chain can never form.
        let mut current = freed;
        let prev = self.partitions.get(&current).unwrap().prev;
        if let Some(prev) = prev {
            if self.partitions.get(&prev).unwrap().is_free() {
                self.merge_into(prev, current);
                current = prev;
            }
        }
        let next = self.partitions.get(&current).unwrap().next;
        if let Some(next) = next {
            if self.partitions.get(&next).unwrap().is_free() {
                self.merge_into(current, next);
            }
        }

        debug!("task {} released its partition", task);
        Ok(())
    }

    /// Splits a free partition into a head of `head_size`
    /// KB and a free remainder holding the rest. The head
    /// is a fresh node slotted in at the partition's
    /// address; the original node is shifted up and shrunk
    /// into the remainder, which keeps its link to the
    /// successor untouched. Returns the id of the head.
    fn split(&mut self, id: PartitionId, head_size: u64) -> PartitionId {
        let head_id = self.id_counter;
        self.id_counter += 1;

        let remainder = self.partitions.get_mut(&id).unwrap();
        debug_assert!(remainder.is_free() && remainder.size > head_size);

        // The head takes over the front of the partition...
        let head = Partition {
            id: head_id,
            address: remainder.address,
            size: head_size,
            state: PartitionState::Free,
            prev: remainder.prev,
            next: Some(id),
        };

        // ...and the remainder moves up right behind it.
        remainder.address += head_size;
        remainder.size -= head_size;
        remainder.prev = Some(head_id);

        // Relink the predecessor to the new head, or the
        // list head if the split partition was the first.
        match head.prev {
            Some(prev) => {
                self.partitions.get_mut(&prev).unwrap().next = Some(head_id);
            }
            None => self.head = head_id,
        }

        debug!(
            "split {} KB off the free partition at address {}",
            head_size, head.address,
        );
        self.partitions.insert(head_id, head);
        head_id
    }

    /// Absorbs `right` into `left`, its immediate free
    /// predecessor. The right node is removed from the map
    /// and its size folded into the left one; the
    /// successor of the removed node, if any, is relinked
    /// to the survivor.
    fn merge_into(&mut self, left: PartitionId, right: PartitionId) {
        let right = self.partitions.remove(&right).unwrap();

        let survivor = self.partitions.get_mut(&left).unwrap();
        debug_assert!(survivor.address + survivor.size == right.address);
        debug_assert!(survivor.is_free() && right.is_free());

        survivor.size += right.size;
        survivor.next = right.next;
        debug!(
            "merged {} KB at address {} into the partition at address {}",
            right.size, right.address, survivor.address,
        );

        if let Some(next) = right.next {
            self.partitions.get_mut(&next).unwrap().prev = Some(left);
        }
    }
}

/// Iterator over the partitions of a list, in ascending
/// address order.
pub struct Partitions<'a> {
    list: &'a PartitionList,
    next: Option<PartitionId>,
}

impl<'a> Iterator for Partitions<'a> {
    type Item = &'a Partition;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let partition = self.list.partitions.get(&id).unwrap();
        self.next = partition.next;
        Some(partition)
    }
}
