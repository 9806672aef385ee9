#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed ^ Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        // FNV alone leaves the low bits poorly mixed for small sequential inputs.
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

/// Deterministic hash of `(seed, a, b)` mapped to `[0, 1)`.
pub(crate) fn hash_unit(seed: u64, a: u64, b: u64) -> f64 {
    let mut h = Fnv1a64::new(seed);
    h.write_u64(a);
    h.write_u64(b);
    (h.finish() >> 11) as f64 / (1u64 << 53) as f64
}

/// Deterministic hash of `(seed, a, b)` mapped to `[-0.5, 0.5)`.
pub(crate) fn hash_centered(seed: u64, a: u64, b: u64) -> f64 {
    hash_unit(seed, a, b) - 0.5
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
