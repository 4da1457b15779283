use chrono::NaiveDateTime;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentData {
    pub id: i32,
    pub content: String,
    pub creation_date: NaiveDateTime,
    pub post_id: i32,
    pub author_id: i32,
    pub author_name: String,
}
