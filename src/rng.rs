use rand::Rng;

use crate::errors::DatasetError;

#[derive(Debug, Clone)]
/// Small deterministic RNG used for reproducible resampling.
///
/// Splitmix64 keeps draws stable for a given seed regardless of which
/// algorithm `rand` picks for `StdRng`.
pub(crate) struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut offset = 0;
        while offset < dest.len() {
            let value = self.next_u64_internal();
            let bytes = value.to_le_bytes();
            let remaining = dest.len() - offset;
            let copy_len = remaining.min(bytes.len());
            dest[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
            offset += copy_len;
        }
    }
}

/// Draw `count` indices in `0..population` with replacement.
pub(crate) fn sample_with_replacement(
    population: usize,
    count: usize,
    seed: u64,
) -> Result<Vec<usize>, DatasetError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if population == 0 {
        return Err(DatasetError::Configuration(format!(
            "cannot draw {count} rows from an empty population"
        )));
    }
    let mut rng = DeterministicRng::new(seed);
    Ok((0..count)
        .map(|_| rng.random_range(0..population))
        .collect())
}
