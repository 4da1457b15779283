use crate::comments::CommentData;
use chrono::NaiveDateTime;

/// Catalog listing item; counts are computed live, never cached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostData {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub hashtags: String,
    pub photo: Option<String>,
    pub creation_date: NaiveDateTime,
    pub author_id: i32,
    pub author_name: String,
    pub comments_count: i64,
    pub likes_count: i64,
}

/// `GET /posts/<id>`: the listing item plus the embedded comment list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostData,
    pub comments: Vec<CommentData>,
}
