//! Hashing text vectorizer.

/// Maps text to a fixed-width vector by hashing lowercase word tokens.
///
/// Each token lands in bucket `h mod dimensions` with sign taken from one
/// bit of the same hash, so collisions tend to cancel rather than pile up.
/// The result is L2-normalised; empty text maps to the zero vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingVectorizer {
    dimensions: usize,
}

impl HashingVectorizer {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut row = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut head = [0u8; 8];
            head.copy_from_slice(&bytes[..8]);
            let h = u64::from_le_bytes(head);
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            row[bucket] += sign;
        }
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|v| *v /= norm);
        }
        row
    }

    pub fn transform_all<'a, I>(&self, texts: I) -> Vec<Vec<f32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|t| self.transform(t)).collect()
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
