use crate::memory::{PartitionState, PartitionView};

use comfy_table::{Cell, Color, Table};

/// Renders a snapshot as the classic four-column partition
/// table, one row per partition in address order. Free rows
/// are painted blue and allocated rows green, so holes
/// stand out when the table is printed to a terminal.
pub fn render_table(snapshot: &[PartitionView]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Address", "Size (KB)", "State", "Task"]);

    for view in snapshot {
        let (state, task, color) = match view.state {
            PartitionState::Free => ("free", "-".to_string(), Color::Blue),
            PartitionState::Allocated(task) => {
                ("allocated", task.to_string(), Color::Green)
            }
        };

        table.add_row(vec![
            Cell::new(view.address),
            Cell::new(view.size),
            Cell::new(state).fg(color),
            Cell::new(task),
        ]);
    }

    table
}
