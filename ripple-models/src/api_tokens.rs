use crate::{accounts::Account, db_conn::DbConn, schema::api_tokens, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use openssl::rand::rand_bytes;
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    Outcome,
};

#[derive(Clone, Queryable, Identifiable)]
pub struct ApiToken {
    pub id: i32,
    pub creation_date: NaiveDateTime,
    pub value: String,
    pub account_id: i32,
}

#[derive(Insertable)]
#[table_name = "api_tokens"]
pub struct NewApiToken {
    pub value: String,
    pub account_id: i32,
}

pub fn random_hex() -> String {
    let mut bytes = [0; 32];
    rand_bytes(&mut bytes).expect("Error while generating token value");
    bytes
        .iter()
        .fold(String::new(), |res, byte| format!("{}{:02x}", res, byte))
}

impl ApiToken {
    insert!(api_tokens, NewApiToken);
    get!(api_tokens);
    find_by!(api_tokens, find_by_value, value as &str);

    /// Issues a fresh token for this account. Older tokens stay valid.
    pub fn generate(conn: &Connection, account: &Account) -> Result<ApiToken> {
        ApiToken::insert(
            conn,
            NewApiToken {
                value: random_hex(),
                account_id: account.id,
            },
        )
    }

    pub fn get_account(&self, conn: &Connection) -> Result<Account> {
        Account::get(conn, self.account_id)
    }

    /// Deletes the token so it can never authenticate again. Reports
    /// `NotFound` when the row is already gone (e.g. a concurrent logout).
    pub fn revoke(&self, conn: &Connection) -> Result<()> {
        let deleted = diesel::delete(self).execute(conn)?;
        if deleted == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum TokenError {
    /// The Authorization header was not present
    NoHeader,
    /// The Authorization header was not a Bearer token
    NoValue,
    /// The token doesn't exist server-side
    Invalid,
    DbError,
}

impl<'a, 'r> FromRequest<'a, 'r> for ApiToken {
    type Error = TokenError;

    fn from_request(request: &'a Request<'r>) -> request::Outcome<ApiToken, TokenError> {
        let headers: Vec<_> = request.headers().get("Authorization").collect();
        if headers.len() != 1 {
            return Outcome::Failure((Status::Unauthorized, TokenError::NoHeader));
        }

        let mut parsed_header = headers[0].split(' ');
        if parsed_header.next() != Some("Bearer") {
            return Outcome::Failure((Status::Unauthorized, TokenError::NoValue));
        }
        let value = match parsed_header.next() {
            Some(v) => v,
            None => return Outcome::Failure((Status::Unauthorized, TokenError::NoValue)),
        };

        let conn = request
            .guard::<DbConn>()
            .map_failure(|_| (Status::InternalServerError, TokenError::DbError))?;
        match ApiToken::find_by_value(&*conn, value) {
            Ok(token) => Outcome::Success(token),
            Err(_) => Outcome::Failure((Status::Unauthorized, TokenError::Invalid)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accounts::tests as account_tests, tests::db};
    use diesel::Connection as _;

    #[test]
    fn generate_and_find() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (account, _) = account_tests::fill_database(&conn).remove(1);
            let token = ApiToken::generate(&conn, &account)?;
            assert_eq!(token.value.len(), 64);

            let found = ApiToken::find_by_value(&conn, &token.value)?;
            assert_eq!(found.account_id, account.id);
            Ok(())
        });
    }

    #[test]
    fn revoke_only_invalidates_presented_token() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (account, _) = account_tests::fill_database(&conn).remove(1);
            let first = ApiToken::generate(&conn, &account)?;
            let second = ApiToken::generate(&conn, &account)?;

            first.revoke(&conn)?;
            assert!(ApiToken::find_by_value(&conn, &first.value).is_err());
            assert!(ApiToken::find_by_value(&conn, &second.value).is_ok());

            // already gone: the reference reports this as not-found
            assert!(matches!(first.revoke(&conn), Err(Error::NotFound)));
            Ok(())
        });
    }
}
