//! Parallel histogram accumulation.
//!
//! Splits the pixel buffer into fixed-size runs of whole pixels and counts
//! each run on a rayon worker; the partial counts are then summed. Counting
//! is an order-independent reduction, so the result is identical to the
//! sequential path.
//!
//! This module is compiled only with the `rayon` feature.

use ::rayon::{iter::ParallelIterator, slice::ParallelSlice};

use crate::histogram::accumulate;

/// Pixels handed to one worker at a time.
const PIXELS_PER_TASK: usize = 64 * 1024;

/// Count an interleaved RGB buffer into a joint histogram in parallel.
pub(crate) fn accumulate_parallel(data: &[u8], bins_per_channel: usize) -> Vec<u64> {
    let bin_count = bins_per_channel.pow(3);

    data.par_chunks(PIXELS_PER_TASK * 3)
        .fold(
            || vec![0_u64; bin_count],
            |mut counts, chunk| {
                accumulate(chunk, bins_per_channel, &mut counts);
                counts
            },
        )
        .reduce(
            || vec![0_u64; bin_count],
            |mut left, right| {
                for (total, partial) in left.iter_mut().zip(right) {
                    *total += partial;
                }
                left
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_counts_match_sequential() {
        // Three full tasks plus a partial one.
        let pixels = PIXELS_PER_TASK * 3 + 1234;
        let data: Vec<u8> = (0..pixels * 3)
            .map(|index| (index.wrapping_mul(2_654_435_761) >> 7) as u8)
            .collect();

        let mut sequential = vec![0_u64; 8 * 8 * 8];
        accumulate(&data, 8, &mut sequential);
        let parallel = accumulate_parallel(&data, 8);

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.iter().sum::<u64>(), pixels as u64);
    }
}
