use ripple_models::{
    accounts::Account, api_tokens::ApiToken, db_conn::DbConn, profiles::Profile,
};
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    Outcome,
};

/// The authenticated caller: token, then account (must be active), then its
/// profile. Every protected endpoint takes this guard; the ones below build
/// on it.
pub struct Auth {
    pub account: Account,
    pub profile: Profile,
}

impl<'a, 'r> FromRequest<'a, 'r> for Auth {
    type Error = ();

    fn from_request(request: &'a Request<'r>) -> request::Outcome<Auth, ()> {
        let token = request
            .guard::<ApiToken>()
            .map_failure(|(code, _)| (code, ()))?;
        let conn = request
            .guard::<DbConn>()
            .map_failure(|(code, _)| (code, ()))?;

        let account = match token.get_account(&*conn) {
            Ok(account) if account.is_active => account,
            _ => return Outcome::Failure((Status::Unauthorized, ())),
        };
        let profile = match account.get_profile(&*conn) {
            Ok(profile) => profile,
            Err(_) => return Outcome::Failure((Status::Unauthorized, ())),
        };
        Outcome::Success(Auth { account, profile })
    }
}

/// Staff-only endpoints (audit views, profile photo uploads).
pub struct Admin(pub Auth);

impl<'a, 'r> FromRequest<'a, 'r> for Admin {
    type Error = ();

    fn from_request(request: &'a Request<'r>) -> request::Outcome<Admin, ()> {
        let auth = request.guard::<Auth>()?;
        if auth.account.is_staff {
            Outcome::Success(Admin(auth))
        } else {
            Outcome::Failure((Status::Forbidden, ()))
        }
    }
}
