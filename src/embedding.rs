//! Feature extraction for vector search and document ingestion.

use crate::config::ConfigError;

/// Text to fixed-length feature vector.
pub trait FeatureExtractor: Send + Sync + std::fmt::Debug {
    /// Length of every vector this extractor produces.
    fn dimensions(&self) -> usize;

    fn extract(&self, text: &str) -> Vec<f32>;
}

pub const DEFAULT_DIMENSIONS: usize = 128;

/// Deterministic placeholder extractor.
///
/// Component `i` is `(h(text + "_" + i) % 1000) / 1000`, where `h` is the
/// 32-bit shift-subtract string hash over UTF-16 code units. Values fall in
/// `(-1, 1)`. Carries no semantic signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingExtractor {
    dimensions: usize,
}

impl HashingExtractor {
    pub fn new(dimensions: usize) -> Result<Self, ConfigError> {
        if dimensions == 0 {
            return Err(ConfigError::InvalidDimensions { provided: dimensions });
        }
        Ok(Self { dimensions })
    }
}

impl Default for HashingExtractor {
    fn default() -> Self {
        Self { dimensions: DEFAULT_DIMENSIONS }
    }
}

fn string_hash(units: impl Iterator<Item = u16>) -> i32 {
    units.fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit)))
}

impl FeatureExtractor for HashingExtractor {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn extract(&self, text: &str) -> Vec<f32> {
        (0..self.dimensions)
            .map(|i| {
                let salted = format!("{}_{}", text, i);
                let h = string_hash(salted.encode_utf16());
                (h % 1000) as f32 / 1000.0
            })
            .collect()
    }
}
