//! Block decomposition and the row-permutation transform.
//!
//! A frame of height `H` is split top to bottom into one block per set bit of
//! `H`, largest first. Each block permutes only its own rows, so the inverse
//! of a whole-frame transform is the per-block inverse.

use crate::permutation::PermutationTable;
use crate::types::{Block, Frame, Key, Mode, ScrambleDirection};

/// Iterator over the power-of-two blocks covering `height` rows.
#[derive(Debug, Clone)]
pub struct Blocks {
    start: usize,
    remaining: usize,
}

pub fn blocks(height: usize) -> Blocks {
    Blocks {
        start: 0,
        remaining: height,
    }
}

impl Iterator for Blocks {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.remaining == 0 {
            return None;
        }
        let size = 1usize << self.remaining.ilog2();
        let block = Block {
            start: self.start,
            size,
        };
        self.start += size;
        self.remaining -= size;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Blocks {}

pub fn transform(input: &Frame, key: Key, direction: ScrambleDirection) -> Frame {
    let mut output = Frame::new(input.height(), input.width(), input.channels());
    transform_into(input, &mut output, key, direction);
    output
}

/// Writes the transform of `input` into `output`, leaving `input` untouched.
///
/// # Panics
///
/// If the two frames differ in height or row stride.
pub fn transform_into(
    input: &Frame,
    output: &mut Frame,
    key: Key,
    direction: ScrambleDirection,
) {
    assert_eq!(input.height(), output.height(), "frame height mismatch");
    assert_eq!(input.stride(), output.stride(), "row stride mismatch");

    for block in blocks(input.height()) {
        let table = directed_table(block.size, key, direction);
        for i in 0..block.size {
            output
                .row_mut(block.start + table.get(i))
                .copy_from_slice(input.row(block.start + i));
        }
    }
}

/// Table moving local row `i` to `get(i)`. Inverse uses the inverse mapping,
/// so row `perm(i)` lands on row `i`.
fn directed_table(size: usize, key: Key, direction: ScrambleDirection) -> PermutationTable {
    let table = PermutationTable::build(size, key);
    match direction {
        ScrambleDirection::Forward => table,
        ScrambleDirection::Inverse => table.inverse(),
    }
}

/// Applies the frame mode; `Passthrough` returns an exact copy.
pub fn apply_mode(input: &Frame, mode: Mode, key: Key) -> Frame {
    match mode.direction() {
        Some(direction) => transform(input, key, direction),
        None => input.clone(),
    }
}

/// Fills `sources` so that output row `y` of the transform is input row `sources[y]`.
///
/// Lets the key search score a candidate without copying any row bytes.
pub fn row_sources(
    height: usize,
    key: Key,
    direction: ScrambleDirection,
    sources: &mut Vec<usize>,
) {
    sources.clear();
    sources.resize(height, 0);

    for block in blocks(height) {
        let table = directed_table(block.size, key, direction);
        for i in 0..block.size {
            sources[block.start + table.get(i)] = block.start + i;
        }
    }
}
