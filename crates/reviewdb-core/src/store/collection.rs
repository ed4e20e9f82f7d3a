//! Document collections.

use serde::Serialize;
use serde_json::Value;
use sled::transaction::TransactionError;
use sled::{Batch, Db, Transactional, Tree};

use super::filter::Filter;
use super::key::{decode_doc_id, encode_doc_id, encode_natural_key};
use crate::error::{Error, Result};
use crate::model::REVIEW_KEY_FIELD;
use crate::sink::Upserted;

/// A named set of JSON documents.
///
/// Documents live under store-assigned ids. Documents written through
/// [`upsert`](Collection::upsert) are also reachable by their natural key.
#[derive(Clone)]
pub struct Collection {
    name: String,
    db: Db,
    docs: Tree,
    keys: Tree,
}

/// One upsert, encoded ahead of the transaction.
struct PreparedUpsert {
    natural_key: [u8; 8],
    fresh_id: [u8; 8],
    bytes: Vec<u8>,
}

impl Collection {
    pub(crate) fn new(name: &str, db: Db, docs: Tree, keys: Tree) -> Self {
        Self {
            name: name.to_string(),
            db,
            docs,
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Serialize documents for [`insert_encoded`](Collection::insert_encoded).
    pub fn encode_many<D: Serialize>(docs: &[D]) -> Result<Vec<Vec<u8>>> {
        docs.iter()
            .map(|d| serde_json::to_vec(d).map_err(Error::from))
            .collect()
    }

    /// Insert documents under fresh ids in one batch.
    pub fn insert_many<D: Serialize>(&self, docs: &[D]) -> Result<Vec<u64>> {
        let encoded = Self::encode_many(docs)?;
        self.insert_encoded(encoded)
    }

    /// Insert pre-serialized documents under fresh ids in one batch.
    pub fn insert_encoded(&self, encoded: Vec<Vec<u8>>) -> Result<Vec<u64>> {
        let mut batch = Batch::default();
        let mut ids = Vec::with_capacity(encoded.len());
        for bytes in encoded {
            let id = self.db.generate_id()?;
            batch.insert(&encode_doc_id(id)[..], bytes);
            ids.push(id);
        }
        self.docs.apply_batch(batch)?;
        Ok(ids)
    }

    /// Insert or fully replace the document with natural key `key`.
    ///
    /// The stored document carries `key` in its `review_id` field.
    pub fn upsert<D: Serialize>(&self, key: i64, doc: &D) -> Result<Upserted> {
        let mut outcomes = self.upsert_batch(std::slice::from_ref(&(key, doc)))?;
        outcomes
            .pop()
            .ok_or_else(|| Error::Transaction("upsert produced no outcome".to_string()))
    }

    /// Upsert several documents in one transaction, in order.
    ///
    /// A key repeated within the batch resolves to its last document.
    pub fn upsert_batch<D: Serialize>(&self, items: &[(i64, D)]) -> Result<Vec<Upserted>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = items
            .iter()
            .map(|(key, doc)| -> Result<PreparedUpsert> {
                Ok(PreparedUpsert {
                    natural_key: encode_natural_key(*key),
                    fresh_id: encode_doc_id(self.db.generate_id()?),
                    bytes: self.encode_keyed(*key, doc)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let result: std::result::Result<Vec<Upserted>, TransactionError<Error>> =
            (&self.docs, &self.keys).transaction(|(docs_tx, keys_tx)| {
                let mut outcomes = Vec::with_capacity(prepared.len());
                for p in &prepared {
                    match keys_tx.get(&p.natural_key[..])? {
                        Some(existing) => {
                            docs_tx.insert(existing, p.bytes.as_slice())?;
                            outcomes.push(Upserted::Replaced);
                        }
                        None => {
                            docs_tx.insert(&p.fresh_id[..], p.bytes.as_slice())?;
                            keys_tx.insert(&p.natural_key[..], &p.fresh_id[..])?;
                            outcomes.push(Upserted::Inserted);
                        }
                    }
                }
                Ok(outcomes)
            });

        match result {
            Ok(outcomes) => Ok(outcomes),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }

    /// Get a document by natural key.
    pub fn get(&self, key: i64) -> Result<Option<Value>> {
        match self.keys.get(encode_natural_key(key))? {
            Some(id) => {
                let id = decode_doc_id(&id).ok_or_else(|| {
                    Error::InvalidData(format!("corrupt key index entry for {}", key))
                })?;
                self.get_by_id(id)
            }
            None => Ok(None),
        }
    }

    /// Get a document by store-assigned id.
    pub fn get_by_id(&self, id: u64) -> Result<Option<Value>> {
        match self.docs.get(encode_doc_id(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Iterate documents in id order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(u64, Value)>> + '_ {
        self.docs.iter().map(|entry| -> Result<(u64, Value)> {
            let (key, bytes) = entry?;
            let id = decode_doc_id(&key)
                .ok_or_else(|| Error::InvalidData("corrupt document id".to_string()))?;
            Ok((id, serde_json::from_slice(&bytes)?))
        })
    }

    /// Documents matching `filter`, in id order, at most `limit` of them.
    pub fn find(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut found = Vec::new();
        if limit == 0 {
            return Ok(found);
        }
        for entry in self.iter() {
            let (_, doc) = entry?;
            if filter.matches(&doc) {
                found.push(doc);
                if found.len() >= limit {
                    break;
                }
            }
        }
        Ok(found)
    }

    fn encode_keyed<D: Serialize>(&self, key: i64, doc: &D) -> Result<Vec<u8>> {
        let mut value = serde_json::to_value(doc)?;
        match value.as_object_mut() {
            Some(map) => {
                map.insert(REVIEW_KEY_FIELD.to_string(), Value::from(key));
            }
            None => {
                return Err(Error::InvalidData(format!(
                    "document for key {} is not an object",
                    key
                )))
            }
        }
        Ok(serde_json::to_vec(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, StoreConfig};
    use serde_json::json;

    fn collection() -> (DocumentStore, Collection) {
        let store = DocumentStore::open(StoreConfig::temporary()).unwrap();
        let reviews = store.collection("reviews").unwrap();
        (store, reviews)
    }

    fn snapshot(c: &Collection) -> Vec<(u64, Value)> {
        c.iter().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_upsert_inserts_then_replaces() {
        let (_store, reviews) = collection();
        assert_eq!(
            reviews.upsert(7, &json!({"rating": 3, "note": "x"})).unwrap(),
            Upserted::Inserted
        );
        assert_eq!(
            reviews.upsert(7, &json!({"rating": 5})).unwrap(),
            Upserted::Replaced
        );

        assert_eq!(reviews.len(), 1);
        let doc = reviews.get(7).unwrap().unwrap();
        assert_eq!(doc, json!({"rating": 5, "review_id": 7}));
    }

    #[test]
    fn test_upsert_replay_is_idempotent() {
        let (_store, reviews) = collection();
        let doc = json!({"rating": 4, "review_text": "fine"});

        reviews.upsert(11, &doc).unwrap();
        let once = snapshot(&reviews);

        for _ in 0..5 {
            reviews.upsert(11, &doc).unwrap();
        }
        assert_eq!(snapshot(&reviews), once);
    }

    #[test]
    fn test_upsert_batch_last_write_wins() {
        let (_store, reviews) = collection();
        let outcomes = reviews
            .upsert_batch(&[
                (1, json!({"v": "a"})),
                (2, json!({"v": "b"})),
                (1, json!({"v": "c"})),
            ])
            .unwrap();
        assert_eq!(
            outcomes,
            vec![Upserted::Inserted, Upserted::Inserted, Upserted::Replaced]
        );
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews.get(1).unwrap().unwrap()["v"], "c");
        assert_eq!(reviews.get(2).unwrap().unwrap()["v"], "b");
    }

    #[test]
    fn test_upsert_rejects_non_object() {
        let (_store, reviews) = collection();
        assert!(matches!(
            reviews.upsert(1, &json!([1, 2])),
            Err(Error::InvalidData(_))
        ));
        assert!(reviews.is_empty());
    }

    #[test]
    fn test_insert_many_and_find() {
        let (_store, reviews) = collection();
        let ids = reviews
            .insert_many(&[
                json!({"user_id": 1, "rating": 2}),
                json!({"user_id": 2, "rating": 5}),
                json!({"user_id": 1, "rating": 4}),
            ])
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(reviews.len(), 3);

        let by_user = reviews.find(&Filter::eq("user_id", 1), None).unwrap();
        assert_eq!(by_user.len(), 2);
        assert_eq!(reviews.find(&Filter::eq("user_id", 2), None).unwrap().len(), 1);

        let limited = reviews.find(&Filter::eq("user_id", 1), Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0]["rating"], 2);
        assert!(reviews.find(&Filter::eq("user_id", 1), Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_regex_search_across_text_and_comments() {
        let (_store, reviews) = collection();
        let mut docs = Vec::new();
        for i in 0..3 {
            docs.push(json!({"main_review": format!("An EXCELLENT book {}", i), "comments": []}));
        }
        for i in 0..2 {
            docs.push(json!({
                "main_review": format!("plain text {}", i),
                "comments": [{"user_id": i, "comment": "truly excellent"}]
            }));
        }
        docs.push(json!({"main_review": "nothing here", "comments": [{"comment": "meh"}]}));
        // Matches in both fields still count once.
        docs.push(json!({
            "main_review": "excellent",
            "comments": [{"comment": "Excellent indeed"}]
        }));
        reviews.insert_many(&docs).unwrap();

        let filter = Filter::or(vec![
            Filter::regex_ci("main_review", "excellent").unwrap(),
            Filter::regex_ci("comments.comment", "excellent").unwrap(),
        ]);
        assert_eq!(reviews.find(&filter, Some(10)).unwrap().len(), 6);
        assert_eq!(reviews.find(&filter, Some(4)).unwrap().len(), 4);
    }
}
