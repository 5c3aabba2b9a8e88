// translation between diesel errors and the database port

use app_core::DbError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

diesel::define_sql_function! {
    /// case folding for case-insensitive ordering
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

/// Fold a diesel error into the port's taxonomy. Constraint names ride
/// along where postgres reports them, so callers can tell a duplicate
/// username from a duplicate session apart.
pub fn map_db_err(e: DieselError) -> DbError {
    match e {
        DieselError::NotFound => DbError::NotFound,
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::UniqueViolation => DbError::UniqueViolation(constraint),
                DatabaseErrorKind::ForeignKeyViolation => {
                    DbError::ForeignKeyViolation(constraint)
                }
                DatabaseErrorKind::CheckViolation => DbError::CheckViolation(constraint),
                DatabaseErrorKind::SerializationFailure => DbError::SerializationFailure,
                unexpected => DbError::Other(anyhow::anyhow!(
                    "database error {unexpected:?}: {}",
                    info.message()
                )),
            }
        }
        other => DbError::Other(anyhow::Error::new(other)),
    }
}

/// row -> entity decoding failure for jsonb payloads
pub fn corrupt(table: &str, column: &str, err: impl std::fmt::Display) -> DbError {
    DbError::CorruptRow(format!("{table}.{column}: {err}"))
}
