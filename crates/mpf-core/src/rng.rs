//! Seeded RNG streams
//!
//! Every random stream of a run derives from the same base seed. Paths get
//! stream `path + i`; the resampler gets a stream with the top bit set, so
//! it can never coincide with a path stream.

use mpf_draws::PathId;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Stream bit reserved for importance resampling
pub const RESAMPLE_STREAM_TAG: u64 = 1 << 63;

/// Seed and stream identifying one RNG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSeed {
    /// Base seed
    pub seed: u64,
    /// Stream within the seed
    pub stream: u64,
}

impl PathSeed {
    /// Seed for path `path_id` given the run's stream offset
    #[inline]
    #[must_use]
    pub fn for_path(random_seed: u64, path_offset: u32, path_id: PathId) -> Self {
        Self {
            seed: random_seed,
            stream: u64::from(path_offset) + u64::from(path_id.0),
        }
    }

    /// Seed for the resampling stage
    #[inline]
    #[must_use]
    pub fn for_resample(random_seed: u64, path_offset: u32) -> Self {
        Self {
            seed: random_seed,
            stream: RESAMPLE_STREAM_TAG | u64::from(path_offset),
        }
    }

    /// Build the RNG for this seed
    #[inline]
    #[must_use]
    pub fn rng(self) -> ChaCha20Rng {
        create_rng(self)
    }
}

/// Create a ChaCha20 generator positioned on `seed.stream`
#[must_use]
pub fn create_rng(seed: PathSeed) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed.seed);
    rng.set_stream(seed.stream);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn first_draws(seed: PathSeed) -> Vec<u64> {
        let mut rng = seed.rng();
        (0..8).map(|_| rng.gen()).collect()
    }

    #[test]
    fn same_seed_same_sequence() {
        let seed = PathSeed::for_path(11, 2, PathId(3));
        assert_eq!(first_draws(seed), first_draws(seed));
    }

    #[test]
    fn path_stream_is_offset_plus_index() {
        assert_eq!(PathSeed::for_path(1, 10, PathId(4)).stream, 14);
    }

    #[test]
    fn paths_get_distinct_streams() {
        let a = PathSeed::for_path(5, 0, PathId(0));
        let b = PathSeed::for_path(5, 0, PathId(1));
        assert_ne!(first_draws(a), first_draws(b));
    }

    #[test]
    fn resample_stream_disjoint_from_paths() {
        let resample = PathSeed::for_resample(5, 0);
        for i in 0..64 {
            let path = PathSeed::for_path(5, 0, PathId(i));
            assert_ne!(path.stream, resample.stream);
        }
        assert_ne!(
            first_draws(resample),
            first_draws(PathSeed::for_path(5, 0, PathId(0)))
        );
    }

    #[test]
    fn largest_path_stream_stays_below_tag() {
        let seed = PathSeed::for_path(0, u32::MAX, PathId(u32::MAX));
        assert_eq!(seed.stream & RESAMPLE_STREAM_TAG, 0);
    }
}
