//! Question-answer examples and split containers.
//!
//! A split keeps two parallel lists: tokenized examples and visual feature
//! vectors, index-aligned. The pairing is an invariant every operation
//! preserves, including the joint shuffle.

use crate::rng::SimpleRng;

/// One tokenized question with its gold answer label.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Whitespace-split question tokens, in question order.
    pub tokens: Vec<String>,
    /// Gold answer label.
    pub label: String,
}

impl Example {
    /// Builds an example by whitespace-tokenizing the question text.
    ///
    /// # Example
    ///
    /// ```
    /// use glance_core::Example;
    ///
    /// let example = Example::new("is  this red", "yes");
    /// assert_eq!(example.tokens, vec!["is", "this", "red"]);
    /// assert_eq!(example.label, "yes");
    /// ```
    pub fn new(question: &str, label: &str) -> Self {
        Self {
            tokens: question.split_whitespace().map(str::to_string).collect(),
            label: label.to_string(),
        }
    }
}

/// One data split: examples and their visual features as index-aligned
/// lists.
///
/// The only way to add entries is [`SplitData::push`], which takes both
/// halves of a pair, so the lists can never drift apart.
#[derive(Debug, Clone, Default)]
pub struct SplitData {
    examples: Vec<Example>,
    features: Vec<Vec<f32>>,
}

impl SplitData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one example together with its visual feature vector.
    pub fn push(&mut self, example: Example, features: Vec<f32>) {
        self.examples.push(example);
        self.features.push(features);
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn features(&self) -> &[Vec<f32>] {
        &self.features
    }

    /// Iterates over (example, features) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Example, &[f32])> {
        self.examples
            .iter()
            .zip(self.features.iter().map(Vec::as_slice))
    }

    /// Returns a copy holding the leading `floor(fraction * len)` pairs.
    ///
    /// A fraction at or above 1.0 keeps everything; at or below 0.0 keeps
    /// nothing.
    pub fn take_fraction(&self, fraction: f32) -> SplitData {
        let keep = ((fraction * self.len() as f32) as usize).min(self.len());
        SplitData {
            examples: self.examples[..keep].to_vec(),
            features: self.features[..keep].to_vec(),
        }
    }

    /// Returns a jointly shuffled copy. Each example stays paired with its
    /// own feature vector.
    pub fn shuffled(&self, rng: &mut SimpleRng) -> SplitData {
        let mut pairs: Vec<(Example, Vec<f32>)> = self
            .examples
            .iter()
            .cloned()
            .zip(self.features.iter().cloned())
            .collect();
        // Fisher-Yates over the zipped pairs.
        for i in (1..pairs.len()).rev() {
            let j = rng.next_below(i + 1);
            pairs.swap(i, j);
        }
        let mut shuffled = SplitData::new();
        for (example, features) in pairs {
            shuffled.push(example, features);
        }
        shuffled
    }
}

/// Histogram of question lengths across splits.
///
/// Index `i` counts questions with `i` tokens; lengths at or beyond
/// `buckets` land in the last bucket.
pub fn sentence_length_histogram(splits: &[&SplitData], buckets: usize) -> Vec<usize> {
    let mut histogram = vec![0usize; buckets];
    if buckets == 0 {
        return histogram;
    }
    for split in splits {
        for example in split.examples() {
            let bucket = example.tokens.len().min(buckets - 1);
            histogram[bucket] += 1;
        }
    }
    histogram
}
