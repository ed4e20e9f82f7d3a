//! Benchmark configuration.

/// Search terms drawn by the search phase.
pub const DEFAULT_SEARCH_TERMS: [&str; 5] = ["excellent", "good", "bad", "recommend", "interesting"];

/// Parameters of one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Records generated and inserted into each backend.
    pub reviews: usize,
    /// Lookups issued in the reading phase, and searches in the search phase.
    pub queries: usize,
    /// Maximum results per text search.
    pub search_limit: usize,
    /// Terms the search phase draws from.
    pub search_terms: Vec<String>,
    /// Seed for the workload and for key and term draws.
    pub seed: u64,
    /// Document collection the workload is written to.
    pub collection: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            reviews: 1000,
            queries: 100,
            search_limit: 10,
            search_terms: DEFAULT_SEARCH_TERMS.iter().map(|t| t.to_string()).collect(),
            seed: 42,
            collection: "reviews".to_string(),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviews(mut self, reviews: usize) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_queries(mut self, queries: usize) -> Self {
        self.queries = queries;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_search_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }
}
