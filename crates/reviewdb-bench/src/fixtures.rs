//! Catalog seeding.
//!
//! Fills the relational catalog with random users, books and reviews so the
//! migration and the benchmark have something to work on. Output is
//! deterministic for a given seed.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reviewdb_core::temporal::{date_to_sql_text, to_sql_text};
use reviewdb_core::{Result, CATALOG_SCHEMA};
use rusqlite::{params, Connection};

/// How much to seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedConfig {
    pub users: usize,
    pub books: usize,
    pub reviews: usize,
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            users: 100,
            books: 200,
            reviews: 1000,
            seed: 12345,
        }
    }
}

/// Rows written by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub users: usize,
    pub books: usize,
    pub reviews: usize,
}

const FIRST_NAMES: &[&str] = &[
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
];

const TITLE_WORDS: &[&str] = &[
    "Silent", "River", "Empire", "Garden", "Night", "Glass", "Winter", "Machine", "Shadow",
    "Letters", "Harbor", "Storm",
];

const REVIEW_LINES: &[&str] = &[
    "Excellent characters and a tight plot.",
    "A good weekend read.",
    "Bad ending, great start.",
    "I recommend it without reservation.",
    "Interesting ideas, uneven execution.",
    "Could not put it down.",
    "Too slow for my taste.",
];

/// Create the catalog schema and insert random rows in one transaction.
///
/// Reviews reference users and books inserted by the same call, so at least
/// one user and one book are needed for any review to be written.
pub fn seed_catalog(conn: &mut Connection, config: &SeedConfig) -> Result<SeedStats> {
    conn.execute_batch(CATALOG_SCHEMA)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let epoch = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let mut stats = SeedStats::default();

    let tx = conn.transaction()?;
    let mut user_ids = Vec::with_capacity(config.users);
    {
        let mut stmt = tx.prepare(
            "INSERT INTO users (username, email, is_admin, created_at, updated_at, last_login) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for i in 0..config.users {
            let name = format!("{}_{}", FIRST_NAMES[i % FIRST_NAMES.len()], i);
            let email = format!("{}@example{}.com", name, i % 10);
            let created_at = random_instant(&mut rng, epoch, 3 * 365);
            let last_login = rng
                .gen_bool(0.8)
                .then(|| to_sql_text(&(created_at + Duration::days(rng.gen_range(0..365)))));
            stmt.execute(params![
                name,
                email,
                rng.gen_bool(0.05),
                to_sql_text(&created_at),
                to_sql_text(&created_at),
                last_login,
            ])?;
            user_ids.push(tx.last_insert_rowid());
        }
    }
    stats.users = user_ids.len();

    let mut book_ids = Vec::with_capacity(config.books);
    {
        let mut stmt = tx.prepare(
            "INSERT INTO books (isbn, title, description, price, publication_date, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for _ in 0..config.books {
            let title = format!(
                "The {} {}",
                TITLE_WORDS[rng.gen_range(0..TITLE_WORDS.len())],
                TITLE_WORDS[rng.gen_range(0..TITLE_WORDS.len())]
            );
            let description: Option<String> = rng
                .gen_bool(0.9)
                .then(|| (&mut rng).sample_iter(Alphanumeric).take(40).map(char::from).collect());
            let price = f64::from(rng.gen_range(1000..=10_000u32)) / 100.0;
            let published = random_date(&mut rng, 1950, 2023);
            let added = to_sql_text(&random_instant(&mut rng, epoch, 3 * 365));
            stmt.execute(params![
                isbn13(&mut rng),
                title,
                description,
                price,
                date_to_sql_text(&published),
                added,
                added,
            ])?;
            book_ids.push(tx.last_insert_rowid());
        }
    }
    stats.books = book_ids.len();

    if !user_ids.is_empty() && !book_ids.is_empty() {
        let mut stmt = tx.prepare(
            "INSERT INTO reviews (user_id, book_id, rating, review_text, created_at, updated_at, is_deleted) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for _ in 0..config.reviews {
            let day = date_to_sql_text(&random_date(&mut rng, 2020, 2023));
            stmt.execute(params![
                user_ids[rng.gen_range(0..user_ids.len())],
                book_ids[rng.gen_range(0..book_ids.len())],
                rng.gen_range(1..=5),
                REVIEW_LINES[rng.gen_range(0..REVIEW_LINES.len())],
                day,
                day,
                rng.gen_bool(0.1),
            ])?;
            stats.reviews += 1;
        }
    }
    tx.commit()?;

    tracing::info!(
        users = stats.users,
        books = stats.books,
        reviews = stats.reviews,
        "catalog seeded"
    );
    Ok(stats)
}

/// Random ISBN-13 with a valid check digit.
pub fn isbn13(rng: &mut StdRng) -> String {
    let mut digits: Vec<u32> = vec![9, 7, 8];
    digits.extend((0..9).map(|_| rng.gen_range(0..10)));
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    digits.push((10 - sum % 10) % 10);
    digits.iter().map(|d| char::from(b'0' + *d as u8)).collect()
}

fn random_instant(rng: &mut StdRng, from: DateTime<Utc>, span_days: i64) -> DateTime<Utc> {
    from + Duration::seconds(rng.gen_range(0..span_days * 86_400))
}

fn random_date(rng: &mut StdRng, from_year: i32, to_year: i32) -> NaiveDate {
    let start = NaiveDate::from_ymd_opt(from_year, 1, 1).unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(to_year, 12, 31).unwrap_or(start);
    let span = (end - start).num_days().max(0);
    start + Duration::days(rng.gen_range(0..=span))
}
