use chrono::NaiveDateTime;

/// One entry of `GET /profile/followers` / `GET /profile/followings`: the
/// counterpart profile, plus when the edge was created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowItem {
    pub id: i32,
    pub full_name: String,
    pub city: String,
    pub photo: Option<String>,
    pub followed_at: NaiveDateTime,
}

/// Raw edge for the staff audit view (`GET /following-history`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowEdge {
    pub id: i32,
    pub follower_id: i32,
    pub following_id: i32,
    pub creation_date: NaiveDateTime,
}
