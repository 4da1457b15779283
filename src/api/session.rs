use crate::api::{message, validation_error, ApiError};
use ripple_api::users::OwnProfile;
use ripple_models::{
    accounts::Account,
    api_tokens::ApiToken,
    db_conn::DbConn,
    profiles::{NewProfile, Profile, GENDERS},
    safe_string::SafeString,
    Error,
};
use rocket::response::status;
use rocket_contrib::json::Json;
use validator::{Validate, ValidationError};

#[derive(Deserialize, Validate)]
pub struct NewAccountForm {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 5, message = "Password should be at least 5 characters long"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: Option<i32>,
    #[validate(custom(function = "validate_gender", message = "Gender must be Female or Male"))]
    pub gender: Option<String>,
    #[serde(default)]
    pub bio: String,
}

fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    if GENDERS.contains(&gender) {
        Ok(())
    } else {
        Err(ValidationError::new("gender"))
    }
}

/// Creates the account and its profile atomically. Shared between
/// `POST /register` and the directory's `POST /users`.
pub(crate) fn create_account(conn: &DbConn, form: NewAccountForm) -> Result<OwnProfile, Error> {
    use diesel::Connection as _;

    form.validate().map_err(|e| validation_error(&e))?;

    let (account, profile) = conn.transaction::<_, Error, _>(|| {
        let account = Account::new_local(conn, &form.email, &form.password)?;
        let profile = Profile::insert(
            conn,
            NewProfile {
                account_id: account.id,
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                city: form.city.clone(),
                country: form.country.clone(),
                age: form.age,
                gender: form.gender.clone(),
                bio: SafeString::new(&form.bio),
            },
        )?;
        Ok((account, profile))
    })?;

    Ok(super::profiles::own_profile_data(&account, &profile))
}

#[post("/register", data = "<form>")]
pub fn register(
    conn: DbConn,
    form: Json<NewAccountForm>,
) -> Result<status::Created<Json<OwnProfile>>, ApiError> {
    let data = create_account(&conn, form.into_inner())?;
    let location = format!("/users/{}", data.id);
    Ok(status::Created(location, Some(Json(data))))
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[post("/login", data = "<form>")]
pub fn login(conn: DbConn, form: Json<LoginForm>) -> Result<Json<serde_json::Value>, ApiError> {
    let account = Account::login(&*conn, &form.email, &form.password)?;
    let token = ApiToken::generate(&*conn, &account)?;
    Ok(Json(json!({ "token": token.value })))
}

#[post("/logout")]
pub fn logout(conn: DbConn, token: ApiToken) -> Result<Json<serde_json::Value>, ApiError> {
    token.revoke(&*conn)?;
    Ok(message(
        "Logout successful, token invalidated, log in again to get a new one",
    ))
}
