//! # inspect
//!
//! why: print a readable per-node overview of a cluster while debugging a test
//! relations: rows built by aggregate.rs, returned by Cluster::inspect
//! what: NodeSummary rows and a plain-text table rendering

use serde::{Deserialize, Serialize};
use std::fmt;

const HEADERS: [&str; 3] = ["addr", "entries", "committed"];

/// log overview of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub addr: String,
    /// number of entries the node holds
    pub entries: usize,
    pub commit_index: u64,
}

/// per-node overview of a cluster, in cluster order
///
/// renders as a table when displayed:
///
/// ```text
/// addr            entries  committed
/// --------------  -------  ---------
/// 127.0.0.1:5000  3        2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub rows: Vec<NodeSummary>,
}

impl Summary {
    pub fn new(rows: Vec<NodeSummary>) -> Self {
        Self { rows }
    }

    fn cells(&self) -> Vec<[String; 3]> {
        self.rows
            .iter()
            .map(|row| {
                [
                    row.addr.clone(),
                    row.entries.to_string(),
                    row.commit_index.to_string(),
                ]
            })
            .collect()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells();
        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        write_row(f, &HEADERS[..], &widths)?;
        let rule = widths.map(|w| "-".repeat(w));
        write_row(f, &rule[..], &widths)?;
        for row in &cells {
            write_row(f, &row[..], &widths)?;
        }
        Ok(())
    }
}

fn write_row<S: AsRef<str>>(
    f: &mut fmt::Formatter<'_>,
    cells: &[S],
    widths: &[usize],
) -> fmt::Result {
    let last = cells.len().saturating_sub(1);
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i == last {
            // no trailing padding on the last column
            write!(f, "{}", cell.as_ref())?;
        } else {
            write!(f, "{:<width$}  ", cell.as_ref(), width = width)?;
        }
    }
    writeln!(f)
}
