use chrono::NaiveDateTime;

/// Directory listing item (`GET /users`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileListItem {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub country: String,
    pub age: Option<i32>,
    pub photo: Option<String>,
    pub registered_at: NaiveDateTime,
}

/// Directory detail (`GET /users/<id>`), with live follow-graph counts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileDetail {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub city: String,
    pub country: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub bio: String,
    pub photo: Option<String>,
    pub registered_at: NaiveDateTime,
    pub total_followers: i64,
    pub total_follow_to: i64,
}

/// The caller's own profile (`GET /profile`); the only shape exposing the
/// account email.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnProfile {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub country: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub bio: String,
    pub photo: Option<String>,
    pub registered_at: NaiveDateTime,
}

/// Photo state of a profile or post (`GET …/upload-photo`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhotoData {
    pub id: i32,
    pub photo: Option<String>,
}
