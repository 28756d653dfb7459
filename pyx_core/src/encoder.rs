//! Text → feature vector encoding.
//!
//! Text is lowercased and broken into character unigrams, character bigrams
//! and whitespace-separated words. Each feature is hashed into a fixed number
//! of buckets and counted, and the counts are L2-normalised. The hash is
//! xxh64 with a fixed seed, so a given string maps to the same vector in
//! every process and saved weights stay meaningful.

use ndarray::Array1;
use xxhash_rust::xxh64::xxh64;

/// Fixed-length numeric encoding of a string.
pub type FeatureVector = Array1<f32>;

const HASH_SEED: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureKind {
    Char = 1,
    Bigram = 2,
    Word = 3,
}

/// Hashed bag-of-features encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEncoder {
    dimensions: usize,
}

impl FeatureEncoder {
    /// Creates an encoder producing vectors of length `dimensions` (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Encodes `text`. Total over all strings; empty text yields the zero vector.
    pub fn encode(&self, text: &str) -> FeatureVector {
        let mut features = Array1::zeros(self.dimensions);
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for &c in &chars {
            let mut buf = [0u8; 4];
            self.bump(&mut features, FeatureKind::Char, c.encode_utf8(&mut buf).as_bytes());
        }

        for pair in chars.windows(2) {
            let bigram: String = pair.iter().collect();
            self.bump(&mut features, FeatureKind::Bigram, bigram.as_bytes());
        }

        for word in lowered.split_whitespace() {
            self.bump(&mut features, FeatureKind::Word, word.as_bytes());
        }

        let norm = features.dot(&features).sqrt();
        if norm > 0.0 {
            features /= norm;
        }
        features
    }

    fn bump(&self, features: &mut FeatureVector, kind: FeatureKind, bytes: &[u8]) {
        let mut tagged = Vec::with_capacity(bytes.len() + 1);
        tagged.push(kind as u8);
        tagged.extend_from_slice(bytes);
        let bucket = (xxh64(&tagged, HASH_SEED) % self.dimensions as u64) as usize;
        features[bucket] += 1.0;
    }
}
