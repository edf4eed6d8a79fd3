use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// A write collided with a unique index; the payload names what was duplicated.
#[derive(Debug, thiserror::Error)]
#[error("duplicate {0}")]
pub struct UniqueViolation(pub &'static str);

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Turns a unique-index violation into [`UniqueViolation`] and anything else into
/// a contextualized error.
pub fn map_write_error(err: sqlx::Error, what: &'static str) -> anyhow::Error {
    let is_unique = matches!(
        &err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    );
    if is_unique {
        UniqueViolation(what).into()
    } else {
        anyhow::Error::new(err).context(format!("write {what}"))
    }
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.is::<UniqueViolation>()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        let err = map_write_error(sqlx::Error::RowNotFound, "user");
        assert!(!is_unique_violation(&err));
        assert!(err.to_string().contains("write user"));
    }

    #[test]
    fn unique_violation_is_detectable_through_anyhow() {
        let err: anyhow::Error = UniqueViolation("email").into();
        assert!(is_unique_violation(&err));
        assert_eq!(err.to_string(), "duplicate email");
    }
}
