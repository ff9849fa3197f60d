//! n-tuple network value approximator.
//!
//! The value of a board is a sum of table lookups: for every tuple pattern and
//! every one of the 8 board isomorphisms, the tuple's cells are read through
//! the isomorphism, packed 4 bits per cell into an index, and used to look up
//! the tuple's weight table. All isomorphisms of a pattern share one table, so
//! a weight learned in one orientation applies to every orientation.
//!
//! ## Weight file layout
//!
//! Little-endian: `count: u32`, then for each table `len: u64` followed by
//! `len` `f32` weights.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::constants::{BITS_PER_CELL, DEFAULT_TUPLES, ISOMORPHISMS, THREES_CELLS};
use crate::error::WeightError;
use crate::threes::{Board, REFLECT_SRC, ROTATE_SRC};

/// Weights shared by all isomorphisms of one tuple pattern.
pub type WeightTable = Vec<f32>;

/// A set of tuple patterns and their weight tables.
#[derive(Clone, Debug, PartialEq)]
pub struct NTupleNetwork {
    /// Cell lists of every isomorphism, per pattern.
    isomorphisms: Vec<[Vec<usize>; ISOMORPHISMS]>,
    tables: Vec<WeightTable>,
}

impl Default for NTupleNetwork {
    fn default() -> Self {
        Self::new(DEFAULT_TUPLES.iter().map(|t| t.to_vec()).collect())
    }
}

impl NTupleNetwork {
    /// A zero-initialised network over the given patterns.
    pub fn new(patterns: Vec<Vec<usize>>) -> Self {
        let isomorphisms = patterns.iter().map(|p| isomorphisms_of(p)).collect();
        let tables = patterns.iter().map(|p| vec![0.0; table_size(p.len())]).collect();
        Self {
            isomorphisms,
            tables,
        }
    }

    /// Number of tuple patterns.
    pub fn tuples(&self) -> usize {
        self.tables.len()
    }

    pub fn tables(&self) -> &[WeightTable] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [WeightTable] {
        &mut self.tables
    }

    /// Table indices read for `board`: one per pattern per isomorphism.
    fn indices<'a>(&'a self, board: &'a Board) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.isomorphisms.iter().enumerate().flat_map(move |(t, isos)| {
            isos.iter().map(move |cells| (t, encode(board, cells)))
        })
    }

    /// Estimated value of `board`.
    pub fn value(&self, board: &Board) -> f32 {
        self.indices(board).map(|(t, i)| self.tables[t][i]).sum()
    }

    /// Add `delta` to every entry [`NTupleNetwork::value`] reads for `board`.
    ///
    /// An entry reached by several isomorphisms is adjusted once per hit.
    pub fn adjust(&mut self, board: &Board, delta: f32) {
        let hits: Vec<(usize, usize)> = self.indices(board).collect();
        for (t, i) in hits {
            self.tables[t][i] += delta;
        }
    }

    /// Write all tables to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WeightError> {
        let path = path.as_ref();
        let io_err = |source| WeightError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut out = BufWriter::new(file);
        out.write_all(&(self.tables.len() as u32).to_le_bytes())
            .map_err(io_err)?;
        for table in &self.tables {
            out.write_all(&(table.len() as u64).to_le_bytes())
                .map_err(io_err)?;
            for w in table {
                out.write_all(&w.to_le_bytes()).map_err(io_err)?;
            }
        }
        out.flush().map_err(io_err)?;
        Ok(())
    }

    /// Replace all tables with the contents of `path`.
    ///
    /// The file must match this network's patterns exactly; on any error the
    /// current weights are left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), WeightError> {
        let path = path.as_ref();
        let io_err = |source| WeightError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut input = BufReader::new(file);

        let mut word = [0u8; 4];
        input.read_exact(&mut word).map_err(io_err)?;
        let count = u32::from_le_bytes(word) as usize;
        if count != self.tables.len() {
            return Err(WeightError::TableCount {
                expected: self.tables.len(),
                found: count,
            });
        }

        let mut tables = Vec::with_capacity(count);
        for (index, expected) in self.tables.iter().map(Vec::len).enumerate() {
            let mut len = [0u8; 8];
            input.read_exact(&mut len).map_err(io_err)?;
            let len = u64::from_le_bytes(len) as usize;
            if len != expected {
                return Err(WeightError::TableSize {
                    index,
                    expected,
                    found: len,
                });
            }

            let mut bytes = vec![0u8; len * 4];
            input.read_exact(&mut bytes).map_err(io_err)?;
            let table: WeightTable = bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            tables.push(table);
        }

        self.tables = tables;
        Ok(())
    }
}

/// Entries in a table for a tuple of `k` cells.
fn table_size(k: usize) -> usize {
    1 << (BITS_PER_CELL as usize * k)
}

/// Pack the tuple's cell values, first cell in the most significant nibble.
#[inline]
fn encode(board: &Board, cells: &[usize]) -> usize {
    cells
        .iter()
        .fold(0, |acc, &c| (acc << BITS_PER_CELL) | board.cell(c) as usize)
}

/// The 8 isomorphic cell lists of a pattern: 4 rotations, then the same 4
/// rotations of the mirrored pattern.
fn isomorphisms_of(pattern: &[usize]) -> [Vec<usize>; ISOMORPHISMS] {
    debug_assert!(pattern.iter().all(|&c| c < THREES_CELLS));
    let mut cells = pattern.to_vec();
    std::array::from_fn(|k| {
        if k == ISOMORPHISMS / 2 {
            cells = cells.iter().map(|&c| REFLECT_SRC[c]).collect();
        }
        let current = cells.clone();
        cells = cells.iter().map(|&c| ROTATE_SRC[c]).collect();
        current
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_network() -> NTupleNetwork {
        NTupleNetwork::new(vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]])
    }

    fn asymmetric_board() -> Board {
        Board::from_cells([1, 2, 3, 4, 0, 5, 0, 6, 7, 0, 0, 0, 0, 0, 0, 8])
    }

    #[test]
    fn test_table_sizes() {
        let net = small_network();
        assert_eq!(net.tuples(), 2);
        assert!(net.tables().iter().all(|t| t.len() == 65536));
    }

    #[test]
    fn test_encode_packs_nibbles_in_order() {
        let board = asymmetric_board();
        assert_eq!(encode(&board, &[0, 1, 2, 3]), 0x1234);
        assert_eq!(encode(&board, &[3, 2]), 0x43);
    }

    #[test]
    fn test_isomorphisms_are_distinct_patterns() {
        let isos = isomorphisms_of(&[0, 1, 2, 3]);
        assert_eq!(isos[0], vec![0, 1, 2, 3]);
        assert_eq!(isos[1], vec![12, 8, 4, 0]);
        assert_eq!(isos[4], vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_adjust_moves_value_by_all_hits() {
        let mut net = small_network();
        let board = asymmetric_board();
        assert_eq!(net.value(&board), 0.0);
        net.adjust(&board, 0.5);
        // 2 tuples x 8 isomorphisms, each entry read back once per hit.
        assert_eq!(net.value(&board), 8.0);
    }

    #[test]
    fn test_adjust_on_symmetric_board_hits_shared_entries() {
        let mut net = small_network();
        let empty = Board::new();
        net.adjust(&empty, 1.0);
        // Every isomorphism reads entry 0 of each table.
        assert_eq!(net.tables()[0][0], 8.0);
        assert_eq!(net.value(&empty), 2.0 * 8.0 * 8.0);
    }
}
