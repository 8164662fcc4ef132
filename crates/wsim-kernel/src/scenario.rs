//! Node placement loading.
//!
//! Scenario files are plain CSV with a header row:
//!
//! ```text
//! node_id,x,y
//! 0,0.0,0.0
//! 1,120.5,40.0
//! ```
//!
//! Ids must be sequential from zero — they double as indices into the
//! kernel's node table.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use wsim_core::Position;

use crate::error::{KernelError, KernelResult};

#[derive(Debug, Deserialize)]
struct NodeRow {
    node_id: u32,
    x: f64,
    y: f64,
}

/// Load node positions from a CSV scenario file.
pub fn load_positions(path: impl AsRef<Path>) -> KernelResult<Vec<Position>> {
    let file = File::open(path).map_err(wsim_core::WsimError::from)?;
    read_positions(file)
}

/// Load node positions from any CSV reader.
pub fn read_positions(reader: impl Read) -> KernelResult<Vec<Position>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut positions = Vec::new();
    for (row, record) in csv_reader.deserialize::<NodeRow>().enumerate() {
        let record = record?;
        let expected = positions.len() as u32;
        if record.node_id != expected {
            return Err(KernelError::ScenarioOrder { row, expected, found: record.node_id });
        }
        positions.push(Position::new(record.x, record.y));
    }
    Ok(positions)
}
