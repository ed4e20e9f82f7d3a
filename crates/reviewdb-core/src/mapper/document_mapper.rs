//! Joined row to review document.

use chrono::{DateTime, Utc};

use super::row::{JoinedRow, SourceValue};
use super::schema::{Column, RowSchema};
use crate::error::MappingError;
use crate::model::{Book, Price, ReviewDocument, User, RATING_RANGE};
use crate::temporal::Temporal;

/// Maps joined review rows to nested documents.
///
/// Mapping is a pure function of the row: the same row always yields an
/// equal document.
#[derive(Debug, Clone, Default)]
pub struct DocumentMapper {
    schema: RowSchema,
}

impl DocumentMapper {
    /// Create a mapper over a validated schema.
    pub fn new(schema: RowSchema) -> Self {
        Self { schema }
    }

    /// Map one row.
    pub fn map(&self, row: &JoinedRow) -> Result<ReviewDocument, MappingError> {
        if row.len() != self.schema.width() {
            return Err(MappingError::invalid(
                Column::ReviewId.name(),
                format!(
                    "row has {} columns, schema has {}",
                    row.len(),
                    self.schema.width()
                ),
            ));
        }
        let fields = Fields {
            row,
            schema: &self.schema,
        };

        let rating = fields.integer(Column::Rating)?;
        if !RATING_RANGE.contains(&rating) {
            return Err(MappingError::invalid(
                Column::Rating.name(),
                format!("rating {} outside 1..=5", rating),
            ));
        }

        let created_at = fields.instant(Column::CreatedAt)?;
        let updated_at = fields.instant(Column::UpdatedAt)?;
        if updated_at < created_at {
            return Err(MappingError::invalid(
                Column::UpdatedAt.name(),
                "updated_at precedes created_at",
            ));
        }

        let user = User {
            user_id: fields.integer(Column::UserId)?,
            username: fields.text(Column::Username)?,
            email: fields.text(Column::Email)?,
            is_admin: fields.boolean(Column::IsAdmin)?,
            created_at: fields.instant(Column::UserCreatedAt)?,
            updated_at: fields.instant(Column::UserUpdatedAt)?,
            last_login: fields.nullable(Column::LastLogin, Fields::instant)?,
        };

        let book = Book {
            book_id: fields.integer(Column::BookId)?,
            isbn: fields.text(Column::Isbn)?,
            title: fields.text(Column::Title)?,
            description: fields.nullable(Column::Description, Fields::text)?,
            price: fields.price(Column::Price)?,
            publication_date: fields.nullable(Column::PublicationDate, Fields::instant)?,
        };

        Ok(ReviewDocument {
            review_id: fields.integer(Column::ReviewId)?,
            rating: rating as u8,
            review_text: fields.text(Column::ReviewText)?,
            created_at,
            updated_at,
            is_deleted: fields.boolean(Column::IsDeleted)?,
            user,
            book,
            comments: None,
        })
    }
}

/// Typed, named access to one row.
struct Fields<'a> {
    row: &'a JoinedRow,
    schema: &'a RowSchema,
}

impl<'a> Fields<'a> {
    fn value(&self, column: Column) -> Option<&'a SourceValue> {
        self.row
            .get(self.schema.position(column))
            .filter(|v| !v.is_null())
    }

    fn required(&self, column: Column) -> Result<&'a SourceValue, MappingError> {
        self.value(column)
            .ok_or(MappingError::MissingField(column.name()))
    }

    fn integer(&self, column: Column) -> Result<i64, MappingError> {
        match self.required(column)? {
            SourceValue::Integer(i) => Ok(*i),
            other => Err(wrong_type(column, "integer", other)),
        }
    }

    fn boolean(&self, column: Column) -> Result<bool, MappingError> {
        match self.required(column)? {
            SourceValue::Integer(0) => Ok(false),
            SourceValue::Integer(1) => Ok(true),
            SourceValue::Text(t) if t.eq_ignore_ascii_case("true") => Ok(true),
            SourceValue::Text(t) if t.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(wrong_type(column, "boolean", other)),
        }
    }

    fn text(&self, column: Column) -> Result<String, MappingError> {
        match self.required(column)? {
            SourceValue::Text(t) => Ok(t.clone()),
            other => Err(wrong_type(column, "text", other)),
        }
    }

    fn price(&self, column: Column) -> Result<Price, MappingError> {
        let raw = match self.required(column)? {
            SourceValue::Real(f) => *f,
            SourceValue::Integer(i) => *i as f64,
            SourceValue::Text(t) => t
                .trim()
                .parse::<f64>()
                .map_err(|e| MappingError::invalid(column.name(), e.to_string()))?,
            other => return Err(wrong_type(column, "numeric", other)),
        };
        Price::from_f64(raw).ok_or_else(|| {
            MappingError::invalid(column.name(), format!("price {} is not a valid amount", raw))
        })
    }

    fn instant(&self, column: Column) -> Result<DateTime<Utc>, MappingError> {
        match self.required(column)? {
            SourceValue::Temporal(t) => Ok(t.to_instant()),
            SourceValue::Text(t) => Temporal::parse(t)
                .map(Temporal::to_instant)
                .ok_or_else(|| {
                    MappingError::invalid(column.name(), format!("unparseable instant {:?}", t))
                }),
            other => Err(wrong_type(column, "temporal", other)),
        }
    }

    /// Read a column the schema allows to be NULL.
    ///
    /// NULL in a column that is not nullable is a missing field.
    fn nullable<T>(
        &self,
        column: Column,
        read: impl Fn(&Self, Column) -> Result<T, MappingError>,
    ) -> Result<Option<T>, MappingError> {
        if column.is_nullable() && self.value(column).is_none() {
            return Ok(None);
        }
        read(self, column).map(Some)
    }
}

fn wrong_type(column: Column, expected: &str, found: &SourceValue) -> MappingError {
    MappingError::invalid(
        column.name(),
        format!("expected {}, found {}", expected, found.type_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Temporal {
        Temporal::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn sample_row() -> JoinedRow {
        JoinedRow::default()
            .with(7i64)
            .with(5i64)
            .with("Great")
            .with(date(2023, 1, 1))
            .with(date(2023, 1, 2))
            .with(false)
            .with(3i64)
            .with("reader3")
            .with("reader3@example.com")
            .with(false)
            .with("2022-06-01 10:00:00")
            .with("2022-06-02 11:30:00")
            .with(None::<&str>)
            .with(9i64)
            .with("9780306406157")
            .with("A Book")
            .with("About things")
            .with(19.99)
            .with(date(2020, 3, 15))
    }

    fn replace(row: &JoinedRow, column: Column, value: SourceValue) -> JoinedRow {
        let mut values: Vec<_> = (0..row.len()).map(|i| row.get(i).unwrap().clone()).collect();
        values[column as usize] = value;
        JoinedRow::new(values)
    }

    #[test]
    fn test_maps_example_row() {
        let mapper = DocumentMapper::default();
        let doc = mapper.map(&sample_row()).unwrap();

        assert_eq!(doc.review_id, 7);
        assert_eq!(doc.rating, 5);
        assert_eq!(doc.review_text, "Great");
        assert_eq!(doc.book.price.as_f64(), 19.99);
        assert_eq!(doc.book.book_id, 9);
        assert_eq!(doc.user.user_id, 3);
        assert!(!doc.is_deleted);
        assert_eq!(
            doc.created_at.naive_utc().to_string(),
            "2023-01-01 00:00:00"
        );
        assert_eq!(doc.updated_at.to_rfc3339(), "2023-01-02T00:00:00+00:00");
        assert_eq!(
            doc.book.publication_date.unwrap().to_rfc3339(),
            "2020-03-15T00:00:00+00:00"
        );
        assert!(doc.user.last_login.is_none());
        assert!(doc.comments.is_none());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mapper = DocumentMapper::default();
        let row = sample_row();
        let first = serde_json::to_vec(&mapper.map(&row).unwrap()).unwrap();
        for _ in 0..10 {
            let again = serde_json::to_vec(&mapper.map(&row).unwrap()).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_missing_price_fails() {
        let row = replace(&sample_row(), Column::Price, SourceValue::Null);
        let err = DocumentMapper::default().map(&row).unwrap_err();
        assert_eq!(err, MappingError::MissingField("price"));
    }

    #[test]
    fn test_missing_user_id_fails() {
        let row = replace(&sample_row(), Column::UserId, SourceValue::Null);
        let err = DocumentMapper::default().map(&row).unwrap_err();
        assert_eq!(err, MappingError::MissingField("user_id"));
    }

    #[test]
    fn test_rating_out_of_range_fails() {
        let row = replace(&sample_row(), Column::Rating, SourceValue::Integer(6));
        assert!(matches!(
            DocumentMapper::default().map(&row),
            Err(MappingError::InvalidValue { column: "rating", .. })
        ));
    }

    #[test]
    fn test_negative_price_fails() {
        let row = replace(&sample_row(), Column::Price, SourceValue::Real(-1.0));
        assert!(matches!(
            DocumentMapper::default().map(&row),
            Err(MappingError::InvalidValue { column: "price", .. })
        ));
    }

    #[test]
    fn test_updated_before_created_fails() {
        let row = replace(&sample_row(), Column::UpdatedAt, date(2022, 12, 31).into());
        assert!(matches!(
            DocumentMapper::default().map(&row),
            Err(MappingError::InvalidValue { column: "updated_at", .. })
        ));
    }

    #[test]
    fn test_integer_price_and_text_dates() {
        let row = replace(&sample_row(), Column::Price, SourceValue::Integer(20));
        let row = replace(&row, Column::CreatedAt, "2023-01-01".into());
        let doc = DocumentMapper::default().map(&row).unwrap();
        assert_eq!(doc.book.price.cents(), 2000);
        assert_eq!(doc.created_at.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_nullable_columns_map_to_none() {
        let row = replace(&sample_row(), Column::Description, SourceValue::Null);
        let row = replace(&row, Column::PublicationDate, SourceValue::Null);
        let doc = DocumentMapper::default().map(&row).unwrap();
        assert!(doc.book.description.is_none());
        assert!(doc.book.publication_date.is_none());
        assert!(doc.user.last_login.is_none());
    }

    #[test]
    fn test_maps_permuted_schema() {
        let mut names: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        names.reverse();
        let schema = RowSchema::validate(&names).unwrap();

        let canonical = sample_row();
        let reversed: Vec<SourceValue> = (0..canonical.len())
            .rev()
            .map(|i| canonical.get(i).unwrap().clone())
            .collect();

        let expected = DocumentMapper::default().map(&canonical).unwrap();
        let doc = DocumentMapper::new(schema).map(&JoinedRow::new(reversed)).unwrap();
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_wrong_width_fails() {
        let row = JoinedRow::default().with(1i64);
        assert!(DocumentMapper::default().map(&row).is_err());
    }
}
