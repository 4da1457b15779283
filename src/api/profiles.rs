use crate::api::{
    authorization::{Admin, Auth},
    read_photo_upload, validation_error, ApiError, PageQuery,
};
use ripple_api::{
    users::{OwnProfile, PhotoData, ProfileDetail, ProfileListItem},
    Page,
};
use ripple_models::{
    accounts::Account,
    db_conn::DbConn,
    medias,
    profiles::{Profile, ProfileFilter, GENDERS},
    safe_string::SafeString,
    Error,
};
use rocket::{http::ContentType, request::LenientForm, response::status, Data};
use rocket_contrib::json::Json;
use validator::{Validate, ValidationError};

pub(crate) fn own_profile_data(account: &Account, profile: &Profile) -> OwnProfile {
    OwnProfile {
        id: profile.id,
        email: account.email.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        city: profile.city.clone(),
        country: profile.country.clone(),
        age: profile.age,
        gender: profile.gender.clone(),
        bio: profile.bio.get().to_owned(),
        photo: profile.photo.clone(),
        registered_at: profile.registered_at,
    }
}

fn list_item(profile: Profile) -> ProfileListItem {
    ProfileListItem {
        id: profile.id,
        first_name: profile.first_name,
        last_name: profile.last_name,
        city: profile.city,
        country: profile.country,
        age: profile.age,
        photo: profile.photo,
        registered_at: profile.registered_at,
    }
}

fn detail_data(conn: &DbConn, profile: Profile) -> Result<ProfileDetail, Error> {
    Ok(ProfileDetail {
        id: profile.id,
        full_name: profile.full_name(),
        total_followers: profile.count_followers(conn)?,
        total_follow_to: profile.count_following(conn)?,
        first_name: profile.first_name,
        last_name: profile.last_name,
        city: profile.city,
        country: profile.country,
        age: profile.age,
        gender: profile.gender,
        bio: profile.bio.get().to_owned(),
        photo: profile.photo,
        registered_at: profile.registered_at,
    })
}

#[derive(FromForm, Default)]
pub struct ProfileParams {
    pub page: Option<i32>,
    pub page_size: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub age: Option<i32>,
}

impl ProfileParams {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn filter(&self) -> ProfileFilter {
        ProfileFilter {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            age: self.age,
        }
    }
}

#[get("/users?<params..>")]
pub fn list(
    params: LenientForm<ProfileParams>,
    conn: DbConn,
    _auth: Auth,
) -> Result<Json<Page<ProfileListItem>>, ApiError> {
    let page = params.page_query();
    let filter = params.filter();
    let results = Profile::page_filtered(&*conn, &filter, page.limits())?
        .into_iter()
        .map(list_item)
        .collect();
    let count = Profile::count_filtered(&*conn, &filter)?;
    Ok(Json(page.envelope(count, results)))
}

/// Same contract as `POST /register`, exposed on the directory resource.
#[post("/users", data = "<form>")]
pub fn create(
    conn: DbConn,
    form: Json<super::session::NewAccountForm>,
) -> Result<status::Created<Json<OwnProfile>>, ApiError> {
    let data = super::session::create_account(&conn, form.into_inner())?;
    let location = format!("/users/{}", data.id);
    Ok(status::Created(location, Some(Json(data))))
}

#[get("/users/<id>")]
pub fn details(id: i32, conn: DbConn, _auth: Auth) -> Result<Json<ProfileDetail>, ApiError> {
    let profile = Profile::get(&*conn, id)?;
    Ok(Json(detail_data(&conn, profile)?))
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileForm {
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

fn apply_update(
    conn: &DbConn,
    profile: &Profile,
    form: UpdateProfileForm,
) -> Result<Profile, Error> {
    form.validate().map_err(|e| validation_error(&e))?;
    profile.update(
        conn,
        form.first_name,
        form.last_name,
        form.city,
        form.country,
        form.age,
        form.gender,
        SafeString::new(&form.bio),
    )
}

/// Mutation is owner-or-staff; reads stay open to any authenticated caller.
#[put("/users/<id>", data = "<form>")]
pub fn update(
    id: i32,
    conn: DbConn,
    auth: Auth,
    form: Json<UpdateProfileForm>,
) -> Result<Json<ProfileDetail>, ApiError> {
    let profile = Profile::get(&*conn, id)?;
    if auth.profile.id != profile.id && !auth.account.is_staff {
        return Err(Error::Forbidden.into());
    }
    let updated = apply_update(&conn, &profile, form.into_inner())?;
    Ok(Json(detail_data(&conn, updated)?))
}

#[get("/profile")]
pub fn me(auth: Auth) -> Json<OwnProfile> {
    Json(own_profile_data(&auth.account, &auth.profile))
}

#[put("/profile", data = "<form>")]
pub fn update_me(
    conn: DbConn,
    auth: Auth,
    form: Json<UpdateProfileForm>,
) -> Result<Json<OwnProfile>, ApiError> {
    let updated = apply_update(&conn, &auth.profile, form.into_inner())?;
    Ok(Json(own_profile_data(&auth.account, &updated)))
}

#[get("/users/<id>/upload-photo")]
pub fn photo(id: i32, conn: DbConn, _auth: Auth) -> Result<Json<PhotoData>, ApiError> {
    let profile = Profile::get(&*conn, id)?;
    Ok(Json(PhotoData {
        id: profile.id,
        photo: profile.photo,
    }))
}

/// Staff only: replacing another user's photo was tightened to admins.
#[put("/users/<id>/upload-photo", data = "<data>")]
pub fn upload_photo(
    id: i32,
    data: Data,
    ct: &ContentType,
    conn: DbConn,
    _admin: Admin,
) -> Result<Json<PhotoData>, ApiError> {
    let profile = Profile::get(&*conn, id)?;
    let (filename, bytes) = read_photo_upload(data, ct)?;
    let path = medias::save_image(
        medias::USER_UPLOAD_DIRECTORY,
        &profile.last_name,
        filename.as_deref(),
        &bytes,
    )?;
    let updated = profile.set_photo(&*conn, &path)?;
    Ok(Json(PhotoData {
        id: updated.id,
        photo: updated.photo,
    }))
}
