//! Random winner selection

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{GiveawayError, GiveawayResult};
use crate::models::CommentUser;

/// Users with at least `min_comments` comments
pub fn filter_eligible(users: &[CommentUser], min_comments: u32) -> Vec<&CommentUser> {
    users
        .iter()
        .filter(|user| user.comment_count >= min_comments)
        .collect()
}

/// Draw `num_winners` distinct eligible usernames at random
pub fn pick_winners(
    users: &[CommentUser],
    num_winners: usize,
    min_comments: u32,
) -> GiveawayResult<Vec<String>> {
    pick_winners_with_rng(users, num_winners, min_comments, &mut rand::thread_rng())
}

/// [`pick_winners`] with a caller-supplied random source
pub fn pick_winners_with_rng<R: Rng + ?Sized>(
    users: &[CommentUser],
    num_winners: usize,
    min_comments: u32,
    rng: &mut R,
) -> GiveawayResult<Vec<String>> {
    let mut eligible = filter_eligible(users, min_comments);

    if eligible.len() < num_winners {
        return Err(GiveawayError::InsufficientEligibleUsers {
            eligible: eligible.len(),
            min_comments,
            requested: num_winners,
        });
    }

    // Partial Fisher-Yates: every eligible user is equally likely, none twice
    let (selected, _) = eligible.partial_shuffle(rng, num_winners);
    Ok(selected.iter().map(|user| user.username.clone()).collect())
}
