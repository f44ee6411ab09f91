//! Turns the classifier's raw probability vector into a [`Prediction`].

use thiserror::Error;

use crate::models::{ClassLabels, Condition, LabelScore, Prediction};

pub const TOP_K: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum PostProcessError {
    #[error("model returned an empty probability vector")]
    Empty,
    #[error("model returned {scores} scores but {labels} labels are loaded")]
    LengthMismatch { scores: usize, labels: usize },
    #[error("model returned a non-finite score at index {0}")]
    NonFinite(usize),
}

/// Picks the best class (lowest index wins ties), derives its condition and
/// ranks the top [`TOP_K`] classes. Percentages are rounded to 2 decimals.
pub fn summarize(scores: &[f32], labels: &ClassLabels) -> Result<Prediction, PostProcessError> {
    if scores.is_empty() {
        return Err(PostProcessError::Empty);
    }
    if scores.len() != labels.len() {
        return Err(PostProcessError::LengthMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(PostProcessError::NonFinite(index));
    }

    let labels = labels.as_slice();

    let mut best = 0;
    for (index, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = index;
        }
    }

    // Stable sort keeps equal scores in index order, agreeing with `best`.
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let top3 = ranked
        .into_iter()
        .take(TOP_K)
        .map(|index| LabelScore {
            label: labels[index].clone(),
            confidence: percent(scores[index]),
        })
        .collect();

    let predicted_class = labels[best].clone();
    Ok(Prediction {
        condition: Condition::from_label(&predicted_class),
        confidence: percent(scores[best]),
        predicted_class,
        top3,
    })
}

fn percent(probability: f32) -> f64 {
    (f64::from(probability) * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> ClassLabels {
        ClassLabels::new(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    #[test]
    fn summarizes_apple_example() {
        let labels = labels(&["apple_fresh", "apple_rotten", "banana_fresh"]);
        let prediction = summarize(&[0.7, 0.2, 0.1], &labels).unwrap();

        assert_eq!(prediction.predicted_class, "apple_fresh");
        assert_eq!(prediction.condition, Condition::Fresh);
        assert_eq!(prediction.confidence, 70.0);

        let top3: Vec<(&str, f64)> = prediction
            .top3
            .iter()
            .map(|s| (s.label.as_str(), s.confidence))
            .collect();
        assert_eq!(
            top3,
            vec![("apple_fresh", 70.0), ("apple_rotten", 20.0), ("banana_fresh", 10.0)]
        );
    }

    #[test]
    fn rotten_label_yields_rotten_condition() {
        let labels = labels(&["apple_fresh", "apple_rotten"]);
        let prediction = summarize(&[0.1, 0.9], &labels).unwrap();
        assert_eq!(prediction.predicted_class, "apple_rotten");
        assert_eq!(prediction.condition, Condition::Rotten);
    }

    #[test]
    fn ties_pick_the_lowest_index() {
        let labels = labels(&["a_rotten", "b_fresh", "c_fresh", "d_rotten"]);
        let prediction = summarize(&[0.1, 0.4, 0.4, 0.1], &labels).unwrap();
        assert_eq!(prediction.predicted_class, "b_fresh");
        assert_eq!(prediction.top3[0].label, "b_fresh");
        assert_eq!(prediction.top3[1].label, "c_fresh");
        assert_eq!(prediction.top3[2].label, "a_rotten");
    }

    #[test]
    fn top3_is_descending_and_capped() {
        let labels = labels(&["a", "b", "c", "d", "e"]);
        let scores = [0.05, 0.3, 0.1, 0.4, 0.15];
        let prediction = summarize(&scores, &labels).unwrap();

        assert_eq!(prediction.top3.len(), 3);
        assert!(prediction
            .top3
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));
        assert_eq!(prediction.top3[0].label, "d");
        assert_eq!(prediction.confidence, prediction.top3[0].confidence);
    }

    #[test]
    fn fewer_than_three_classes_shortens_top3() {
        let labels = labels(&["only_fresh", "only_rotten"]);
        let prediction = summarize(&[0.25, 0.75], &labels).unwrap();
        assert_eq!(prediction.top3.len(), 2);

        let single = summarize(&[1.0], &self::labels(&["solo"])).unwrap();
        assert_eq!(single.top3.len(), 1);
        assert_eq!(single.confidence, 100.0);
    }

    #[test]
    fn confidence_is_rounded_to_two_decimals() {
        let labels = labels(&["x_fresh", "y_rotten"]);
        let prediction = summarize(&[0.123456, 0.876544], &labels).unwrap();
        assert_eq!(prediction.confidence, 87.65);
        assert_eq!(prediction.top3[1].confidence, 12.35);
    }

    #[test]
    fn empty_vector_is_rejected() {
        let labels = labels(&["a"]);
        assert_eq!(summarize(&[], &labels), Err(PostProcessError::Empty));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let labels = labels(&["a", "b", "c"]);
        assert_eq!(
            summarize(&[0.5, 0.5], &labels),
            Err(PostProcessError::LengthMismatch { scores: 2, labels: 3 })
        );
    }

    #[test]
    fn nan_scores_are_rejected() {
        let labels = labels(&["a", "b"]);
        assert_eq!(
            summarize(&[0.5, f32::NAN], &labels),
            Err(PostProcessError::NonFinite(1))
        );
    }
}
