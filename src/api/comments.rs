use crate::api::{
    authorization::{Admin, Auth},
    message, parse_day, parse_id_list, ApiError, PageQuery,
};
use ripple_api::{comments::CommentData, Page};
use ripple_models::{
    comments::{Comment, CommentFilter, NewComment},
    db_conn::DbConn,
    posts::Post,
    safe_string::SafeString,
    Error,
};
use rocket::request::LenientForm;
use rocket_contrib::json::Json;

pub(crate) fn comment_data(conn: &DbConn, comment: Comment) -> Result<CommentData, Error> {
    let author = comment.get_author(conn)?;
    Ok(CommentData {
        id: comment.id,
        content: comment.content.get().to_owned(),
        creation_date: comment.creation_date,
        post_id: comment.post_id,
        author_id: author.id,
        author_name: author.full_name(),
    })
}

#[derive(Deserialize)]
pub struct NewCommentForm {
    #[serde(default)]
    pub content: String,
}

/// Empty content is answered with a plain message, not a 4xx — the soft
/// failure the clients rely on.
#[post("/posts/<id>/comment", data = "<form>")]
pub fn create(
    id: i32,
    conn: DbConn,
    auth: Auth,
    form: Json<NewCommentForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let post = Post::get(&*conn, id)?;
    let content = form.into_inner().content;
    if content.trim().is_empty() {
        return Ok(message("Comment content cannot be empty"));
    }

    let comment = Comment::insert(
        &*conn,
        NewComment {
            content: SafeString::new(&content),
            author_id: auth.profile.id,
            post_id: post.id,
        },
    )?;
    Ok(Json(json!(comment_data(&conn, comment)?)))
}

#[delete("/comment/<id>/delete")]
pub fn delete(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    let comment = Comment::get(&*conn, id)?;
    if comment.author_id != auth.profile.id {
        return Err(Error::Forbidden.into());
    }
    comment.delete(&*conn)?;
    Ok(message("Comment deleted"))
}

#[get("/comment/own-commentary?<page..>")]
pub fn own(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<Page<CommentData>>, ApiError> {
    let results = Comment::page_for_author(&*conn, auth.profile.id, page.limits())?
        .into_iter()
        .map(|comment| comment_data(&conn, comment))
        .collect::<Result<Vec<_>, Error>>()?;
    let count = Comment::count_for_author(&*conn, auth.profile.id)?;
    Ok(Json(page.envelope(count, results)))
}

#[derive(FromForm, Default)]
pub struct CommentParams {
    pub page: Option<i32>,
    pub page_size: Option<i32>,
    /// Comma-separated commenter ids.
    pub user: Option<String>,
    pub content: Option<String>,
    pub post_title: Option<String>,
    /// Exact creation day, `YYYY-MM-DD`.
    pub created_time: Option<String>,
}

#[get("/comments-history?<params..>")]
pub fn history(
    params: LenientForm<CommentParams>,
    conn: DbConn,
    _admin: Admin,
) -> Result<Json<Page<CommentData>>, ApiError> {
    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let filter = CommentFilter {
        user: params.user.as_deref().map(parse_id_list),
        content: params.content.clone(),
        post_title: params.post_title.clone(),
        created_day: params.created_time.as_deref().map(parse_day).transpose()?,
    };
    let results = Comment::page_filtered(&*conn, &filter, page.limits())?
        .into_iter()
        .map(|comment| comment_data(&conn, comment))
        .collect::<Result<Vec<_>, Error>>()?;
    let count = Comment::count_filtered(&*conn, &filter)?;
    Ok(Json(page.envelope(count, results)))
}
