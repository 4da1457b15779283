use crate::{profiles::Profile, schema::accounts, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "accounts"]
pub struct NewAccount {
    pub email: String,
    pub hashed_password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl Account {
    insert!(accounts, NewAccount);
    get!(accounts);
    find_by!(accounts, find_by_email, email as &str);

    pub fn hash_pass(pass: &str) -> Result<String> {
        bcrypt::hash(pass, 10).map_err(Error::from)
    }

    /// Emails are stored lowercased, so the duplicate check only needs the
    /// normalized form.
    pub fn email_used(conn: &Connection, email: &str) -> Result<bool> {
        use diesel::dsl::{exists, select};

        select(exists(
            accounts::table.filter(accounts::email.eq(email.to_lowercase())),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }

    pub fn new_local(conn: &Connection, email: &str, password: &str) -> Result<Account> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::Validation(String::from("Email is required")));
        }
        if Account::email_used(conn, &email)? {
            return Err(Error::Validation(String::from(
                "An account with this email already exists",
            )));
        }
        Account::insert(
            conn,
            NewAccount {
                email,
                hashed_password: Account::hash_pass(password)?,
                is_staff: false,
                is_superuser: false,
                is_active: true,
            },
        )
    }

    /// Staff/superuser seeding path for ops tooling; not reachable over HTTP.
    pub fn new_superuser(conn: &Connection, email: &str, password: &str) -> Result<Account> {
        let account = Account::new_local(conn, email, password)?;
        diesel::update(&account)
            .set((accounts::is_staff.eq(true), accounts::is_superuser.eq(true)))
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn login(conn: &Connection, email: &str, password: &str) -> Result<Account> {
        let account = Account::find_by_email(conn, &email.trim().to_lowercase())
            .map_err(|_| Error::Unauthorized)?;
        if !account.is_active {
            return Err(Error::Unauthorized);
        }
        if bcrypt::verify(password, &account.hashed_password).unwrap_or(false) {
            Ok(account)
        } else {
            Err(Error::Unauthorized)
        }
    }

    pub fn get_profile(&self, conn: &Connection) -> Result<Profile> {
        Profile::find_by_account(conn, self.id)
    }

    /// Removes the account and its profile. The profile's own dependents are
    /// handled (or refused) by `Profile::delete`; tokens go with the account
    /// through the schema's cascade.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        use diesel::Connection as _;
        conn.transaction::<_, Error, _>(|| {
            self.get_profile(conn)?.delete(conn)?;
            diesel::delete(self).execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        profiles::{NewProfile, Profile},
        tests::db,
    };
    use diesel::Connection as _;

    pub(crate) fn fill_database(conn: &Connection) -> Vec<(Account, Profile)> {
        let admin = Account::new_superuser(conn, "admin@example.com", "invalid_admin_password")
            .expect("Couldn't insert admin");
        let jane = Account::new_local(conn, "jane@example.com", "invalid_jane_password")
            .expect("Couldn't insert jane");
        let john = Account::new_local(conn, "john@example.com", "invalid_john_password")
            .expect("Couldn't insert john");

        vec![
            (admin.clone(), ("The", "Admin", "Lyon", "France")),
            (jane.clone(), ("Jane", "Doe", "Nantes", "France")),
            (john.clone(), ("John", "Roe", "Namur", "Belgium")),
        ]
        .into_iter()
        .map(|(account, (first, last, city, country))| {
            let profile = Profile::insert(
                conn,
                NewProfile {
                    account_id: account.id,
                    first_name: first.to_owned(),
                    last_name: last.to_owned(),
                    city: city.to_owned(),
                    country: country.to_owned(),
                    age: None,
                    gender: None,
                    bio: Default::default(),
                },
            )
            .expect("Couldn't insert profile");
            (account, profile)
        })
        .collect()
    }

    #[test]
    fn email_is_normalized() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let account = Account::new_local(&conn, "  MiXeD@Example.COM ", "secret1")?;
            assert_eq!(account.email, "mixed@example.com");

            match Account::new_local(&conn, "mixed@EXAMPLE.com", "secret1") {
                Err(Error::Validation(_)) => (),
                other => panic!("Duplicate registration succeeded: {:?}", other.map(|a| a.id)),
            }
            Ok(())
        });
    }

    #[test]
    fn login() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let account = Account::new_local(&conn, "login@example.com", "secret1")?;
            assert!(account.hashed_password != "secret1");

            let logged = Account::login(&conn, "Login@example.com", "secret1")?;
            assert_eq!(logged.id, account.id);

            assert!(matches!(
                Account::login(&conn, "login@example.com", "wrong"),
                Err(Error::Unauthorized)
            ));

            diesel::update(&account)
                .set(accounts::is_active.eq(false))
                .execute(&conn)?;
            assert!(matches!(
                Account::login(&conn, "login@example.com", "secret1"),
                Err(Error::Unauthorized)
            ));
            Ok(())
        });
    }

    #[test]
    fn delete_takes_profile_and_tokens_along() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::api_tokens::ApiToken;

            let (account, profile) = fill_database(&conn).remove(1);
            let token = ApiToken::generate(&conn, &account)?;

            account.delete(&conn)?;
            assert!(Account::get(&conn, account.id).is_err());
            assert!(Profile::get(&conn, profile.id).is_err());
            assert!(ApiToken::find_by_value(&conn, &token.value).is_err());
            Ok(())
        });
    }

    #[test]
    fn superuser_is_staff() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let admin = Account::new_superuser(&conn, "root@example.com", "secret1")?;
            assert!(admin.is_staff);
            assert!(admin.is_superuser);
            Ok(())
        });
    }
}
