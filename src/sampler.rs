//! Class-balanced review sampling.
//!
//! App-store review streams skew heavily Positive, so showing the newest N
//! reviews would bury the rare Neutral/Negative voices. The sampler takes an
//! even per-class quota first, tops the result up from whatever is left, and
//! shuffles for display.

use rand::seq::SliceRandom;

use crate::classifier::{ClassifiedReview, Sentiment};

/// Select up to `target_count` reviews, best-effort evenly split across the
/// three sentiment classes.
///
/// Per class the first `target_count / 3` members are taken in stream order
/// (a deterministic prefix, not a random pick). If a class runs short, or the
/// target is not divisible by 3, the gap is filled with not-yet-selected
/// reviews in original order. Selection is by position, so two reviews with
/// identical text are independently eligible. The result is shuffled; only
/// its class counts are meaningful, never its order.
pub fn balanced_sample(
    classified: &[ClassifiedReview],
    target_count: usize,
) -> Vec<ClassifiedReview> {
    let per_class_limit = target_count / 3;

    let mut selected: Vec<usize> = Vec::with_capacity(target_count.min(classified.len()));
    let mut taken = vec![false; classified.len()];

    // 1. Per-class quota: first `per_class_limit` seen of each class.
    for class in Sentiment::ALL {
        let mut picked = 0;
        for (i, review) in classified.iter().enumerate() {
            if picked == per_class_limit {
                break;
            }
            if review.sentiment == class {
                selected.push(i);
                taken[i] = true;
                picked += 1;
            }
        }
    }

    // 2. Fallback fill: top up with unselected reviews in original order.
    if selected.len() < target_count {
        let mut remaining_needed = target_count - selected.len();
        for i in 0..classified.len() {
            if remaining_needed == 0 {
                break;
            }
            if !taken[i] {
                selected.push(i);
                taken[i] = true;
                remaining_needed -= 1;
            }
        }
    }

    // 3. Shuffle for display fairness.
    let mut sample: Vec<ClassifiedReview> =
        selected.into_iter().map(|i| classified[i].clone()).collect();
    sample.shuffle(&mut rand::thread_rng());
    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playstore::Review;
    use std::collections::HashSet;

    fn review(i: usize, sentiment: Sentiment) -> ClassifiedReview {
        review_with_content(i, sentiment, &format!("review {}", i))
    }

    fn review_with_content(i: usize, sentiment: Sentiment, content: &str) -> ClassifiedReview {
        ClassifiedReview {
            review: Review {
                review_id: format!("gp:rev-{}", i),
                user_name: format!("user{}", i),
                content: content.to_string(),
                score: 3,
                at: None,
            },
            cleaned_text: crate::text::clean_text(content),
            sentiment,
        }
    }

    fn count_class(sample: &[ClassifiedReview], class: Sentiment) -> usize {
        sample.iter().filter(|r| r.sentiment == class).count()
    }

    /// 300 Positive / 150 Neutral / 50 Negative, target 60 -> 20 of each.
    #[test]
    fn test_balanced_when_all_classes_are_plentiful() {
        let mut classified = Vec::new();
        for i in 0..500 {
            let sentiment = match i % 10 {
                0..=5 => Sentiment::Positive,
                6..=8 => Sentiment::Neutral,
                _ => Sentiment::Negative,
            };
            classified.push(review(i, sentiment));
        }

        let sample = balanced_sample(&classified, 60);
        assert_eq!(sample.len(), 60);
        assert_eq!(count_class(&sample, Sentiment::Positive), 20);
        assert_eq!(count_class(&sample, Sentiment::Neutral), 20);
        assert_eq!(count_class(&sample, Sentiment::Negative), 20);
    }

    /// Only 5 Negative exist: quota yields 20+20+5, fill adds 15 more.
    #[test]
    fn test_scarce_class_triggers_fallback_fill() {
        let mut classified = Vec::new();
        for i in 0..300 {
            classified.push(review(i, Sentiment::Positive));
        }
        for i in 300..450 {
            classified.push(review(i, Sentiment::Neutral));
        }
        for i in 450..455 {
            classified.push(review(i, Sentiment::Negative));
        }

        let sample = balanced_sample(&classified, 60);
        assert_eq!(sample.len(), 60);
        assert_eq!(count_class(&sample, Sentiment::Negative), 5);
        assert!(count_class(&sample, Sentiment::Positive) >= 20);
        assert!(count_class(&sample, Sentiment::Neutral) >= 20);
    }

    #[test]
    fn test_quota_takes_first_seen_per_class() {
        // Negatives sit at positions 0, 10, 20, ...; quota must take the
        // earliest ones, not a random pick.
        let mut classified = Vec::new();
        for i in 0..60 {
            let sentiment = if i % 10 == 0 {
                Sentiment::Negative
            } else {
                Sentiment::Positive
            };
            classified.push(review(i, sentiment));
        }

        let sample = balanced_sample(&classified, 9); // per-class limit 3
        let negatives: HashSet<String> = sample
            .iter()
            .filter(|r| r.sentiment == Sentiment::Negative)
            .map(|r| r.review.review_id.clone())
            .collect();
        assert_eq!(negatives.len(), 3);
        for id in ["gp:rev-0", "gp:rev-10", "gp:rev-20"] {
            assert!(negatives.contains(id), "missing {}", id);
        }
    }

    #[test]
    fn test_size_bound_never_exceeded() {
        for total in [0usize, 1, 5, 59, 60, 200] {
            for target in [0usize, 1, 2, 10, 60, 1000] {
                let classified: Vec<_> =
                    (0..total).map(|i| review(i, Sentiment::Positive)).collect();
                let sample = balanced_sample(&classified, target);
                assert!(sample.len() <= target);
                assert!(sample.len() <= classified.len());
            }
        }
    }

    #[test]
    fn test_no_duplicates_by_identity() {
        // Same text everywhere: every review must still be independently
        // eligible, and none selected twice.
        let classified: Vec<_> = (0..30)
            .map(|i| {
                review_with_content(
                    i,
                    Sentiment::ALL[i % 3],
                    "mantap", // identical content on purpose
                )
            })
            .collect();

        let sample = balanced_sample(&classified, 30);
        assert_eq!(sample.len(), 30);
        let ids: HashSet<_> = sample.iter().map(|r| r.review.review_id.clone()).collect();
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn test_target_not_divisible_by_three_is_topped_up() {
        let classified: Vec<_> = (0..30).map(|i| review(i, Sentiment::ALL[i % 3])).collect();
        // per-class limit 3 -> quota 9, fill brings it to 10
        let sample = balanced_sample(&classified, 10);
        assert_eq!(sample.len(), 10);
    }

    #[test]
    fn test_fewer_reviews_than_target_is_a_partial_sample() {
        let classified: Vec<_> = (0..10).map(|i| review(i, Sentiment::ALL[i % 3])).collect();
        let sample = balanced_sample(&classified, 60);
        assert_eq!(sample.len(), 10);
    }

    #[test]
    fn test_target_zero_yields_empty_sample() {
        let classified: Vec<_> = (0..10).map(|i| review(i, Sentiment::Positive)).collect();
        assert!(balanced_sample(&classified, 0).is_empty());
        assert!(balanced_sample(&[], 60).is_empty());
    }

    #[test]
    fn test_fairness_floor_per_class() {
        // Every class contributes at least min(per_class_limit, available).
        let mut classified = Vec::new();
        for i in 0..40 {
            classified.push(review(i, Sentiment::Positive));
        }
        for i in 40..52 {
            classified.push(review(i, Sentiment::Neutral));
        }
        for i in 52..54 {
            classified.push(review(i, Sentiment::Negative));
        }

        let target = 30; // per-class limit 10
        let sample = balanced_sample(&classified, target);
        assert!(count_class(&sample, Sentiment::Positive) >= 10);
        assert!(count_class(&sample, Sentiment::Neutral) >= 10);
        assert!(count_class(&sample, Sentiment::Negative) >= 2);
        assert_eq!(sample.len(), 30);
    }
}
