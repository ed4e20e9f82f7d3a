//! Paired synthetic review generation.
//!
//! Every record is drawn once and rendered twice: a rich form with nested
//! comments for the document backend, and a flat form where the comments are
//! folded into the review text for the relational backend. Both forms share
//! rating, user id, book id and timestamps so the two backends store
//! equivalent content.

use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reviewdb_core::{Candidates, Comment};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Header separating the main text from folded comments.
pub const COMMENTS_HEADER: &str = "\n\nComments:\n";

/// Most nested comments a rich record carries.
pub const MAX_COMMENTS: usize = 5;

const MAIN_PHRASES: &[&str] = &[
    "An excellent read from start to finish.",
    "A good book, though the middle drags.",
    "Honestly a bad translation of a great story.",
    "I would recommend this to anyone new to the genre.",
    "An interesting take on a familiar premise.",
    "The characters felt flat.",
    "Beautifully written and well paced.",
    "Not what the cover promised.",
    "The ending surprised me.",
    "Worth it for the second half alone.",
];

const COMMENT_PHRASES: &[&str] = &[
    "Totally agree, excellent pick.",
    "Good point about the pacing.",
    "I thought it was bad too.",
    "Would you recommend the sequel?",
    "Interesting, I read it differently.",
    "Thanks for the review.",
    "Adding this to my list.",
    "The audiobook is better.",
];

/// Review in document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichReview {
    pub user_id: i64,
    pub book_id: i64,
    pub rating: u8,
    pub main_review: String,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub helpful_votes: u32,
}

/// Review in relational shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatReview {
    pub user_id: i64,
    pub book_id: i64,
    pub rating: u8,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl From<&RichReview> for FlatReview {
    fn from(rich: &RichReview) -> Self {
        Self {
            user_id: rich.user_id,
            book_id: rich.book_id,
            rating: rich.rating,
            review_text: fold_comments(&rich.main_review, &rich.comments),
            created_at: rich.created_at,
            updated_at: rich.updated_at,
            is_deleted: rich.is_deleted,
        }
    }
}

/// The two renderings of one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPair {
    pub rich: RichReview,
    pub flat: FlatReview,
}

/// Fold comments into review text.
///
/// The header is always present; each comment becomes one
/// `User <user_id>: <comment>` line.
pub fn fold_comments(main: &str, comments: &[Comment]) -> String {
    let lines: Vec<String> = comments
        .iter()
        .map(|c| format!("User {}: {}", c.user_id, c.comment))
        .collect();
    format!("{}{}{}", main, COMMENTS_HEADER, lines.join("\n"))
}

/// Seeded source of paired review records.
///
/// Generators are restartable: each call to [`generate`](Self::generate)
/// starts the same sequence over.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    candidates: Arc<Candidates>,
    seed: u64,
    anchor: DateTime<Utc>,
}

impl WorkloadGenerator {
    /// Create a generator over a candidate snapshot.
    ///
    /// Timestamps are drawn backwards from the current time, truncated to the
    /// millisecond.
    pub fn new(candidates: Arc<Candidates>, seed: u64) -> Result<Self> {
        if candidates.is_empty() {
            return Err(BenchError::EmptyCandidates);
        }
        let now = Utc::now();
        let anchor = now.duration_trunc(Duration::milliseconds(1)).unwrap_or(now);
        Ok(Self {
            candidates,
            seed,
            anchor,
        })
    }

    /// Draw timestamps backwards from `anchor` instead of the current time.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Iterate `n` pairs from the start of the sequence.
    pub fn generate(&self, n: usize) -> Workload<'_> {
        Workload {
            generator: self,
            rng: StdRng::seed_from_u64(self.seed),
            remaining: n,
        }
    }

    /// Collect `n` pairs.
    pub fn pairs(&self, n: usize) -> Vec<ReviewPair> {
        self.generate(n).collect()
    }

    fn draw(&self, rng: &mut StdRng) -> ReviewPair {
        let user_id = self.pick_user(rng);
        let book_id = self.pick_book(rng);
        let rating = rng.gen_range(1..=5u8);

        let created_at = self.anchor - Duration::seconds(rng.gen_range(0..365 * 86_400));
        let updated_at = created_at + Duration::seconds(rng.gen_range(0..30 * 86_400));

        let sentences = rng.gen_range(1..=3);
        let main_review = MAIN_PHRASES
            .choose_multiple(rng, sentences)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let comment_count = rng.gen_range(0..=MAX_COMMENTS);
        let comments = (0..comment_count)
            .map(|_| Comment {
                user_id: self.pick_user(rng),
                comment: COMMENT_PHRASES[rng.gen_range(0..COMMENT_PHRASES.len())].to_string(),
                created_at: created_at + Duration::seconds(rng.gen_range(0..7 * 86_400)),
            })
            .collect();

        let rich = RichReview {
            user_id,
            book_id,
            rating,
            main_review,
            comments,
            created_at,
            updated_at,
            is_deleted: false,
            helpful_votes: rng.gen_range(0..=100),
        };
        let flat = FlatReview::from(&rich);
        ReviewPair { rich, flat }
    }

    fn pick_user(&self, rng: &mut StdRng) -> i64 {
        let ids = &self.candidates.user_ids;
        ids[rng.gen_range(0..ids.len())]
    }

    fn pick_book(&self, rng: &mut StdRng) -> i64 {
        let ids = &self.candidates.book_ids;
        ids[rng.gen_range(0..ids.len())]
    }
}

/// Finite iterator over generated pairs.
pub struct Workload<'a> {
    generator: &'a WorkloadGenerator,
    rng: StdRng,
    remaining: usize,
}

impl Iterator for Workload<'_> {
    type Item = ReviewPair;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.generator.draw(&mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Workload<'_> {}
