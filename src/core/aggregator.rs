// Prediction count aggregation

use crate::core::format::{LabeledBucket, PredictionCounts, Rgb};

/// Color of labels missing from the table.
pub const DEFAULT_COLOR: Rgb = Rgb(0xcc, 0xcc, 0xcc);

const COLOR_TABLE: &[(&str, Rgb)] = &[
    ("!", Rgb(0x88, 0x84, 0xd8)),
    ("F", Rgb(0x82, 0xca, 0x9d)),
    ("N", Rgb(0xff, 0xc6, 0x58)),
    ("V", Rgb(0xff, 0x73, 0x00)),
    ("f", Rgb(0xd0, 0xed, 0x57)),
];

pub fn color_for(label: &str) -> Rgb {
    COLOR_TABLE
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, c)| *c)
        .unwrap_or(DEFAULT_COLOR)
}

/// One bucket per label, in the order of `counts`.
pub fn aggregate(counts: &PredictionCounts) -> Vec<LabeledBucket> {
    counts
        .iter()
        .map(|(label, &count)| LabeledBucket {
            label: label.clone(),
            count,
            color: color_for(label),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_keeps_order_and_colors() {
        let mut counts = PredictionCounts::new();
        counts.insert("N".to_string(), 120);
        counts.insert("V".to_string(), 5);

        let buckets = aggregate(&counts);
        assert_eq!(
            buckets,
            vec![
                LabeledBucket { label: "N".into(), count: 120, color: color_for("N") },
                LabeledBucket { label: "V".into(), count: 5, color: color_for("V") },
            ]
        );
        assert_eq!(buckets[0].color, Rgb(0xff, 0xc6, 0x58));
    }

    #[test]
    fn test_aggregate_does_not_sort() {
        let counts: PredictionCounts =
            [("V", 1), ("!", 2), ("N", 3)].into_iter().map(|(l, c)| (l.to_string(), c)).collect();
        let labels: Vec<_> = aggregate(&counts).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, ["V", "!", "N"]);
    }

    #[test]
    fn test_unknown_label_is_gray() {
        assert_eq!(color_for("Q"), DEFAULT_COLOR);
        // labels are case sensitive
        assert_ne!(color_for("f"), color_for("F"));
    }

    #[test]
    fn test_empty_counts() {
        assert!(aggregate(&PredictionCounts::new()).is_empty());
    }
}
