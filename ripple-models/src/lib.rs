#[macro_use]
extern crate diesel;
#[macro_use]
extern crate lazy_static;
#[cfg(test)]
#[macro_use]
extern crate diesel_migrations;

pub use self::config::CONFIG;

pub type Connection = diesel::PgConnection;

#[derive(Debug)]
pub enum Error {
    Db(diesel::result::Error),
    Io(std::io::Error),
    NotFound,
    Unauthorized,
    Forbidden,
    SelfFollow,
    InvalidImage,
    Password,
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            e => Error::Db(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(_: bcrypt::BcryptError) -> Self {
        Error::Password
    }
}

impl Error {
    /// Whether a database error is the violation of a unique constraint.
    ///
    /// Duplicate follow and like inserts rely on this: the constraint is
    /// the authoritative at-most-once guard, and a violation is folded
    /// into the same informational answer as the advisory pre-check.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Error::Db(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ))
        )
    }
}

macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> crate::Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(crate::Error::from)
        }
    };
}

macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// List all $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> crate::Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .load::<Self>(conn)
                .map_err(crate::Error::from)
        }
    };
}

macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &crate::Connection, id: i32) -> crate::Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(crate::Error::from)
        }
    };
}

macro_rules! insert {
    ($table:ident, $from:ty) => {
        pub fn insert(conn: &crate::Connection, new: $from) -> crate::Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .get_result(conn)
                .map_err(crate::Error::from)
        }
    };
}

pub mod accounts;
pub mod api_tokens;
pub mod comments;
pub mod config;
pub mod db_conn;
pub mod follows;
pub mod likes;
pub mod medias;
pub mod posts;
pub mod profiles;
pub mod safe_string;
pub mod schema;

#[cfg(test)]
pub(crate) mod tests {
    use crate::{Connection, CONFIG};
    use diesel::Connection as _;

    embed_migrations!("../migrations");

    pub(crate) fn db() -> Connection {
        let conn = Connection::establish(CONFIG.database_url.as_str())
            .expect("Couldn't connect to the database");
        embedded_migrations::run(&conn).expect("Couldn't run migrations");
        conn
    }
}
