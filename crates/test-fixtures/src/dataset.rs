//! Small deterministic datasets.

use quarry_core::models::Dataset;

/// Coarse question classes used by [`question_dataset`].
pub const QUESTION_LABELS: [&str; 4] = ["DESC", "ENTY", "HUM", "LOC"];

/// `size` rows over `classes` well-separated classes. Row `i` belongs to
/// class `i % classes`; its feature vector has a strong component on the
/// class axis and a weak one that varies by row.
pub fn synthetic_dataset(size: usize, classes: usize, dims: usize) -> Dataset {
    assert!(classes > 0 && dims >= classes, "need at least one axis per class");
    let mut texts = Vec::with_capacity(size);
    let mut features = Vec::with_capacity(size);
    let mut labels = Vec::with_capacity(size);
    for i in 0..size {
        let class = i % classes;
        let mut row = vec![0.0f32; dims];
        row[class] = 1.0;
        row[(i / classes) % dims] += 0.1;
        texts.push(format!("sample {i} of class {class}"));
        features.push(row);
        labels.push(Some(class));
    }
    let names = (0..classes).map(|c| format!("class-{c}")).collect();
    Dataset::new(texts, features, labels, names).unwrap()
}

/// Question texts with their coarse class, for vectorizer and loader tests.
pub fn question_dataset() -> Vec<(&'static str, &'static str)> {
    vec![
        ("How did serfdom develop in and then leave Russia ?", "DESC"),
        ("What is the definition of a cascade ?", "DESC"),
        ("Why do heavier objects travel downhill faster ?", "DESC"),
        ("What films featured the character Popeye Doyle ?", "ENTY"),
        ("What fowl grabs the spotlight after the Chinese Year of the Monkey ?", "ENTY"),
        ("What is the oldest profession ?", "ENTY"),
        ("Who was Galileo ?", "HUM"),
        ("What team did baseball 's St. Louis Browns become ?", "HUM"),
        ("Who killed Gandhi ?", "HUM"),
        ("What is the capital of Peru ?", "LOC"),
        ("Where is the Loop of the river ?", "LOC"),
        ("What sprawling U.S. state boasts the most airports ?", "LOC"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_rows_cycle_through_classes() {
        let dataset = synthetic_dataset(10, 4, 8);
        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.num_classes(), 4);
        assert_eq!(dataset.label(5), Some(1));
        assert_eq!(dataset.features(5).map(<[f32]>::len), Some(8));
    }
}
