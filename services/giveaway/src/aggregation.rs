//! Per-user comment counting

use std::collections::BTreeMap;

use crate::models::{CommentSummary, CommentUser, RawComment};

/// Group comments by author, sorted by username ascending
pub fn aggregate_comments(comments: &[RawComment]) -> Vec<CommentUser> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for comment in comments {
        *counts.entry(comment.username.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(username, comment_count)| CommentUser {
            username: username.to_string(),
            comment_count,
        })
        .collect()
}

/// Aggregate and attach the raw total
pub fn summarize(comments: &[RawComment]) -> CommentSummary {
    CommentSummary {
        users: aggregate_comments(comments),
        total_comments: comments.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use proptest::prelude::*;

    fn comment(username: &str, text: &str, ts: i64) -> RawComment {
        RawComment {
            username: username.to_string(),
            text: text.to_string(),
            timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty() {
        assert!(aggregate_comments(&[]).is_empty());
        assert_eq!(summarize(&[]).total_comments, 0);
    }

    #[test]
    fn test_counts_and_sorts() {
        let comments = [
            comment("alice", "hi", 1),
            comment("alice", "yo", 2),
            comment("bob", "hey", 3),
        ];

        let summary = summarize(&comments);

        assert_eq!(
            summary.users,
            vec![
                CommentUser {
                    username: "alice".to_string(),
                    comment_count: 2
                },
                CommentUser {
                    username: "bob".to_string(),
                    comment_count: 1
                },
            ]
        );
        assert_eq!(summary.total_comments, 3);
    }

    #[test]
    fn test_sorted_by_username() {
        let comments = [comment("zara", "hi", 1), comment("alice", "hello", 2)];
        let names: Vec<_> = aggregate_comments(&comments)
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["alice", "zara"]);
    }

    fn comments_and_permutation() -> impl Strategy<Value = (Vec<RawComment>, Vec<RawComment>)> {
        prop::collection::vec(("[a-e]{1,3}", "[a-z ]{0,8}", 0i64..10_000), 0..40)
            .prop_map(|rows| {
                rows.into_iter()
                    .map(|(user, text, ts)| comment(&user, &text, ts))
                    .collect::<Vec<_>>()
            })
            .prop_flat_map(|comments| (Just(comments.clone()), Just(comments).prop_shuffle()))
    }

    proptest! {
        #[test]
        fn prop_order_independent((original, shuffled) in comments_and_permutation()) {
            let a = aggregate_comments(&original);
            let b = aggregate_comments(&shuffled);
            prop_assert_eq!(&a, &b);

            prop_assert!(a.windows(2).all(|w| w[0].username < w[1].username));
            prop_assert!(a.iter().all(|u| u.comment_count >= 1));
            let total: u32 = a.iter().map(|u| u.comment_count).sum();
            prop_assert_eq!(total as usize, original.len());
        }
    }
}
