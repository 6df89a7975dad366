use super::list::PartitionList;
use super::partition::PartitionId;

use std::fmt;

/// Placement policy deciding which free partition serves a
/// new allocation. The set is closed: a policy is always
/// one of the three classic fits, dispatched by a plain
/// match rather than an open-ended function value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The first free partition large enough, in address
    /// order.
    FirstFit,
    /// The smallest free partition large enough.
    BestFit,
    /// The largest free partition large enough.
    WorstFit,
}

impl Policy {
    /// Selects a free partition able to hold `size` KB, or
    /// `None` when no free partition is large enough. The
    /// scan is a single left-to-right pass over the list;
    /// best and worst fit replace their candidate only on
    /// a strict improvement, so partitions of exactly equal
    /// size resolve to the lowest address.
    pub(super) fn select(
        self,
        list: &PartitionList,
        size: u64,
    ) -> Option<PartitionId> {
        let mut candidates = list
            .iter()
            .filter(|partition| partition.is_free() && partition.size() >= size);

        let fit = match self {
            Self::FirstFit => candidates.next(),
            Self::BestFit => candidates.reduce(|best, partition| {
                if partition.size() < best.size() {
                    partition
                } else {
                    best
                }
            }),
            Self::WorstFit => candidates.reduce(|worst, partition| {
                if partition.size() > worst.size() {
                    partition
                } else {
                    worst
                }
            }),
        };

        fit.map(|partition| partition.id)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FirstFit => "first-fit",
            Self::BestFit => "best-fit",
            Self::WorstFit => "worst-fit",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lay out a list with two equal 3000 KB holes and
    // nothing else free: [A1][hole][A3][hole][A5], built by
    // filling the space exactly and releasing tasks 2 and 4.
    fn two_equal_holes() -> PartitionList {
        let mut list = PartitionList::new(12000);
        list.allocate(1, 2000, Policy::FirstFit).unwrap();
        list.allocate(2, 3000, Policy::FirstFit).unwrap();
        list.allocate(3, 2000, Policy::FirstFit).unwrap();
        list.allocate(4, 3000, Policy::FirstFit).unwrap();
        list.allocate(5, 2000, Policy::FirstFit).unwrap();
        list.deallocate(2).unwrap();
        list.deallocate(4).unwrap();
        list
    }

    // Address of the partition a policy would pick.
    fn selected_address(list: &PartitionList, policy: Policy, size: u64) -> Option<u64> {
        let id = policy.select(list, size)?;
        list.iter().find(|p| p.id == id).map(|p| p.address())
    }

    #[test]
    fn first_fit_takes_the_earliest_hole() {
        let mut list = PartitionList::new(65536);
        list.allocate(1, 10000, Policy::FirstFit).unwrap();
        list.allocate(2, 10000, Policy::FirstFit).unwrap();
        list.allocate(3, 10000, Policy::FirstFit).unwrap();
        list.deallocate(2).unwrap();

        // Both the released hole and the tail are large
        // enough; first fit stops at the hole.
        assert_eq!(selected_address(&list, Policy::FirstFit, 4000), Some(10000));
    }

    #[test]
    fn best_and_worst_fit_pick_by_size_not_address() {
        let mut list = PartitionList::new(65536);
        list.allocate(1, 10000, Policy::FirstFit).unwrap();
        list.allocate(2, 4000, Policy::FirstFit).unwrap();
        list.allocate(3, 12000, Policy::FirstFit).unwrap();
        list.allocate(4, 39536, Policy::FirstFit).unwrap();
        list.deallocate(1).unwrap();
        list.deallocate(3).unwrap();

        // Task 4 pins the tail, leaving exactly two holes:
        // 10000 KB at 0 and 12000 KB at 14000. Both fit the
        // request, so only size decides.
        assert_eq!(selected_address(&list, Policy::BestFit, 9000), Some(0));
        assert_eq!(selected_address(&list, Policy::WorstFit, 9000), Some(14000));
        assert_eq!(selected_address(&list, Policy::FirstFit, 11000), Some(14000));
    }

    #[test]
    fn selection_fails_when_every_hole_is_too_small() {
        let list = two_equal_holes();

        for policy in [Policy::FirstFit, Policy::BestFit, Policy::WorstFit] {
            assert_eq!(policy.select(&list, 3001), None);
        }
    }

    #[test]
    fn equal_holes_resolve_to_the_lowest_address() {
        let list = two_equal_holes();

        // The two 3000 KB holes sit at 2000 and 7000; every
        // policy must settle on the first one.
        for policy in [Policy::FirstFit, Policy::BestFit, Policy::WorstFit] {
            assert_eq!(selected_address(&list, policy, 1000), Some(2000));
        }
    }
}
