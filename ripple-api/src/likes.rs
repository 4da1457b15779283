use chrono::NaiveDateTime;

/// Raw like for the staff audit view (`GET /likes-history`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LikeData {
    pub id: i32,
    pub profile_id: i32,
    pub post_id: i32,
    pub creation_date: NaiveDateTime,
}
