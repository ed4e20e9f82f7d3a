//! Idempotent review upserts.

use crate::error::Result;
use crate::model::{ReviewDocument, ReviewId};
use crate::store::Collection;

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    /// No document had the key; one was inserted.
    Inserted,
    /// The document with the key was replaced in full.
    Replaced,
}

/// Key-based insert-or-replace of review documents.
///
/// Replaying `upsert(key, doc)` leaves the store in the same observable state
/// as a single call. Calls for distinct keys are independent.
pub trait UpsertSink {
    /// Insert `document` under `key`, or replace the whole existing document.
    fn upsert(&self, key: ReviewId, document: &ReviewDocument) -> Result<Upserted>;

    /// Upsert several documents; per-key semantics match [`upsert`](UpsertSink::upsert).
    fn upsert_batch(&self, documents: &[ReviewDocument]) -> Result<Vec<Upserted>> {
        documents
            .iter()
            .map(|doc| self.upsert(doc.review_id, doc))
            .collect()
    }
}

impl UpsertSink for Collection {
    fn upsert(&self, key: ReviewId, document: &ReviewDocument) -> Result<Upserted> {
        Collection::upsert(self, key, document)
    }

    fn upsert_batch(&self, documents: &[ReviewDocument]) -> Result<Vec<Upserted>> {
        let keyed: Vec<(ReviewId, &ReviewDocument)> =
            documents.iter().map(|doc| (doc.review_id, doc)).collect();
        Collection::upsert_batch(self, &keyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Book, Price, User};
    use crate::store::{DocumentStore, StoreConfig};
    use chrono::{TimeZone, Utc};

    fn review(id: ReviewId, rating: u8) -> ReviewDocument {
        let at = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        ReviewDocument {
            review_id: id,
            rating,
            review_text: format!("review {}", id),
            created_at: at,
            updated_at: at,
            is_deleted: false,
            user: User {
                user_id: 3,
                username: "reader".into(),
                email: "reader@example.com".into(),
                is_admin: false,
                created_at: at,
                updated_at: at,
                last_login: None,
            },
            book: Book {
                book_id: 9,
                isbn: "9780306406157".into(),
                title: "A Book".into(),
                description: None,
                price: Price::from_cents(1999).unwrap(),
                publication_date: None,
            },
            comments: None,
        }
    }

    fn sink() -> (DocumentStore, Collection) {
        let store = DocumentStore::open(StoreConfig::temporary()).unwrap();
        let reviews = store.collection("reviews").unwrap();
        (store, reviews)
    }

    #[test]
    fn test_sink_upsert_roundtrips_document() {
        let (_store, reviews) = sink();
        let doc = review(7, 5);
        assert_eq!(UpsertSink::upsert(&reviews, 7, &doc).unwrap(), Upserted::Inserted);

        let stored: ReviewDocument =
            serde_json::from_value(reviews.get(7).unwrap().unwrap()).unwrap();
        assert_eq!(stored, doc);
    }

    #[test]
    fn test_sink_replay_is_idempotent() {
        let (_store, reviews) = sink();
        let doc = review(7, 5);
        UpsertSink::upsert(&reviews, 7, &doc).unwrap();
        let once: Vec<_> = reviews.iter().map(|r| r.unwrap()).collect();

        assert_eq!(UpsertSink::upsert(&reviews, 7, &doc).unwrap(), Upserted::Replaced);
        let twice: Vec<_> = reviews.iter().map(|r| r.unwrap()).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sink_full_replace_drops_old_fields() {
        let (_store, reviews) = sink();
        let mut doc = review(1, 2);
        doc.comments = Some(Vec::new());
        UpsertSink::upsert(&reviews, 1, &doc).unwrap();

        let replacement = review(1, 4);
        UpsertSink::upsert(&reviews, 1, &replacement).unwrap();

        let stored = reviews.get(1).unwrap().unwrap();
        assert_eq!(stored["rating"], 4);
        assert!(stored.get("comments").is_none());
    }

    #[test]
    fn test_sink_batch_matches_single_upserts() {
        let (_store, batched) = sink();
        let (_other, single) = sink();
        let docs = vec![review(1, 1), review(2, 2), review(3, 3)];

        UpsertSink::upsert_batch(&batched, &docs).unwrap();
        UpsertSink::upsert_batch(&batched, &docs).unwrap();
        for doc in &docs {
            UpsertSink::upsert(&single, doc.review_id, doc).unwrap();
        }

        for id in 1..=3 {
            assert_eq!(batched.get(id).unwrap(), single.get(id).unwrap());
        }
        assert_eq!(batched.len(), 3);
    }
}
