//! Named column schema for the review/user/book join.

use crate::error::MappingError;

/// Columns of the review join, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ReviewId,
    Rating,
    ReviewText,
    CreatedAt,
    UpdatedAt,
    IsDeleted,
    UserId,
    Username,
    Email,
    IsAdmin,
    UserCreatedAt,
    UserUpdatedAt,
    LastLogin,
    BookId,
    Isbn,
    Title,
    Description,
    Price,
    PublicationDate,
}

impl Column {
    /// Every column in the order the join must declare them.
    pub const ALL: [Column; 19] = [
        Column::ReviewId,
        Column::Rating,
        Column::ReviewText,
        Column::CreatedAt,
        Column::UpdatedAt,
        Column::IsDeleted,
        Column::UserId,
        Column::Username,
        Column::Email,
        Column::IsAdmin,
        Column::UserCreatedAt,
        Column::UserUpdatedAt,
        Column::LastLogin,
        Column::BookId,
        Column::Isbn,
        Column::Title,
        Column::Description,
        Column::Price,
        Column::PublicationDate,
    ];

    /// Column name as the join statement declares it.
    pub const fn name(self) -> &'static str {
        match self {
            Column::ReviewId => "review_id",
            Column::Rating => "rating",
            Column::ReviewText => "review_text",
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
            Column::IsDeleted => "is_deleted",
            Column::UserId => "user_id",
            Column::Username => "username",
            Column::Email => "email",
            Column::IsAdmin => "is_admin",
            Column::UserCreatedAt => "user_created_at",
            Column::UserUpdatedAt => "user_updated_at",
            Column::LastLogin => "last_login",
            Column::BookId => "book_id",
            Column::Isbn => "isbn",
            Column::Title => "title",
            Column::Description => "description",
            Column::Price => "price",
            Column::PublicationDate => "publication_date",
        }
    }

    /// Column declared under `name`, if any.
    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Whether the column may hold NULL in a valid row.
    pub const fn is_nullable(self) -> bool {
        matches!(
            self,
            Column::Description | Column::PublicationDate | Column::LastLogin
        )
    }
}

/// Column layout of the join, checked once against what the statement declares.
///
/// Columns may be declared in any order; each column's position is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    positions: [usize; 19],
    declared: [Column; 19],
}

impl RowSchema {
    /// The canonical layout: every column at its position in [`Column::ALL`].
    pub fn canonical() -> Self {
        let mut positions = [0usize; 19];
        for (i, slot) in positions.iter_mut().enumerate() {
            *slot = i;
        }
        Self {
            positions,
            declared: Column::ALL,
        }
    }

    /// Validate the column names a statement declares.
    ///
    /// Every column of [`Column::ALL`] must be declared exactly once, under
    /// its name. Order is free.
    pub fn validate<S: AsRef<str>>(declared: &[S]) -> Result<Self, MappingError> {
        let mismatch = || MappingError::SchemaMismatch {
            expected: Column::ALL.iter().map(|c| c.name().to_string()).collect(),
            found: declared.iter().map(|s| s.as_ref().to_string()).collect(),
        };

        if declared.len() != Column::ALL.len() {
            return Err(mismatch());
        }

        let mut positions = [usize::MAX; 19];
        let mut order = Column::ALL;
        for (index, name) in declared.iter().enumerate() {
            let column = Column::from_name(name.as_ref()).ok_or_else(mismatch)?;
            let slot = &mut positions[column as usize];
            if *slot != usize::MAX {
                return Err(mismatch());
            }
            *slot = index;
            order[index] = column;
        }

        Ok(Self {
            positions,
            declared: order,
        })
    }

    /// Position of a column within a row.
    pub fn position(&self, column: Column) -> usize {
        self.positions[column as usize]
    }

    /// Column declared at a row position.
    pub fn column_at(&self, index: usize) -> Option<Column> {
        self.declared.get(index).copied()
    }

    /// Number of columns a row must carry.
    pub fn width(&self) -> usize {
        self.positions.len()
    }
}

impl Default for RowSchema {
    fn default() -> Self {
        Self::canonical()
    }
}
