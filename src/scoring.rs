//! Row-continuity disorder score.
//!
//! Natural images change little from one row to the next; scrambling rows
//! breaks that. The score sums the Euclidean distance between every pair of
//! vertically adjacent rows, so lower means smoother.

use crate::types::Frame;

pub fn disorder_score(frame: &Frame) -> f64 {
    (1..frame.height())
        .map(|y| row_distance(frame.row(y - 1), frame.row(y)))
        .sum()
}

/// Score of the frame whose row `y` would be `frame.row(order[y])`.
pub fn disorder_score_ordered(frame: &Frame, order: &[usize]) -> f64 {
    order
        .windows(2)
        .map(|pair| row_distance(frame.row(pair[0]), frame.row(pair[1])))
        .sum()
}

#[inline]
pub fn row_distance(a: &[u8], b: &[u8]) -> f64 {
    let sum_sq: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum();
    (sum_sq as f64).sqrt()
}
