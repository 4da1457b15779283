use crate::api::{
    authorization::Auth, message, parse_day, parse_id_list, read_photo_upload, validation_error,
    ApiError, PageQuery,
};
use ripple_api::{
    posts::{PostData, PostDetail},
    users::PhotoData,
    Page,
};
use ripple_models::{
    comments::Comment,
    db_conn::DbConn,
    medias,
    posts::{normalize_hashtags, NewPost, Post, PostFilter},
    safe_string::SafeString,
    Error,
};
use rocket::{http::ContentType, request::LenientForm, response::status, Data};
use rocket_contrib::json::Json;
use validator::Validate;

pub(crate) fn post_data(conn: &DbConn, post: Post) -> Result<PostData, Error> {
    let author = post.get_author(conn)?;
    Ok(PostData {
        comments_count: post.count_comments(conn)?,
        likes_count: post.count_likes(conn)?,
        id: post.id,
        title: post.title,
        content: post.content.get().to_owned(),
        hashtags: post.hashtags,
        photo: post.photo,
        creation_date: post.creation_date,
        author_id: author.id,
        author_name: author.full_name(),
    })
}

fn detail_data(conn: &DbConn, post: Post) -> Result<PostDetail, Error> {
    let comments = Comment::for_post(conn, post.id)?
        .into_iter()
        .map(|comment| super::comments::comment_data(conn, comment))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(PostDetail {
        post: post_data(conn, post)?,
        comments,
    })
}

fn page_of_posts(
    conn: &DbConn,
    page: PageQuery,
    posts: Vec<Post>,
    count: i64,
) -> Result<Json<Page<PostData>>, ApiError> {
    let results = posts
        .into_iter()
        .map(|post| post_data(conn, post))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(Json(page.envelope(count, results)))
}

#[derive(FromForm, Default)]
pub struct PostParams {
    pub page: Option<i32>,
    pub page_size: Option<i32>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtags: Option<String>,
    /// Comma-separated author ids.
    pub author: Option<String>,
    /// Exact creation day, `YYYY-MM-DD`.
    pub created_time: Option<String>,
}

impl PostParams {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn filter(&self) -> Result<PostFilter, Error> {
        Ok(PostFilter {
            title: self.title.clone(),
            content: self.content.clone(),
            hashtags: self.hashtags.clone(),
            author: self.author.as_deref().map(parse_id_list),
            created_day: self.created_time.as_deref().map(parse_day).transpose()?,
        })
    }
}

#[get("/posts?<params..>")]
pub fn list(
    params: LenientForm<PostParams>,
    conn: DbConn,
    _auth: Auth,
) -> Result<Json<Page<PostData>>, ApiError> {
    let page = params.page_query();
    let filter = params.filter()?;
    let posts = Post::page_filtered(&*conn, &filter, page.limits())?;
    let count = Post::count_filtered(&*conn, &filter)?;
    page_of_posts(&conn, page, posts, count)
}

#[derive(Deserialize, Validate)]
pub struct NewPostForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub hashtags: String,
}

/// The author is always the authenticated caller; nothing in the body can
/// spoof it.
#[post("/posts", data = "<form>")]
pub fn create(
    conn: DbConn,
    auth: Auth,
    form: Json<NewPostForm>,
) -> Result<status::Created<Json<PostData>>, ApiError> {
    let form = form.into_inner();
    form.validate().map_err(|e| validation_error(&e))?;

    let post = Post::insert(
        &*conn,
        NewPost {
            title: form.title,
            content: SafeString::new(&form.content),
            hashtags: normalize_hashtags(&form.hashtags),
            photo: None,
            author_id: auth.profile.id,
        },
    )?;
    let location = format!("/posts/{}", post.id);
    Ok(status::Created(location, Some(Json(post_data(&conn, post)?))))
}

#[get("/posts/your-posts?<page..>")]
pub fn own(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<Page<PostData>>, ApiError> {
    let posts = Post::page_for_author(&*conn, auth.profile.id, page.limits())?;
    let count = Post::count_for_author(&*conn, auth.profile.id)?;
    page_of_posts(&conn, *page, posts, count)
}

#[get("/posts/following-post?<page..>")]
pub fn following_feed(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<Page<PostData>>, ApiError> {
    let posts = Post::page_following_feed(&*conn, &auth.profile, page.limits())?;
    let count = Post::count_following_feed(&*conn, &auth.profile)?;
    page_of_posts(&conn, *page, posts, count)
}

#[get("/posts/liked?<page..>")]
pub fn liked(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<Page<PostData>>, ApiError> {
    let posts = Post::page_liked_by(&*conn, &auth.profile, page.limits())?;
    let count = Post::count_liked_by(&*conn, &auth.profile)?;
    page_of_posts(&conn, *page, posts, count)
}

#[get("/posts/<id>")]
pub fn details(id: i32, conn: DbConn, _auth: Auth) -> Result<Json<PostDetail>, ApiError> {
    let post = Post::get(&*conn, id)?;
    Ok(Json(detail_data(&conn, post)?))
}

fn owned_post(conn: &DbConn, auth: &Auth, id: i32) -> Result<Post, Error> {
    let post = Post::get(conn, id)?;
    if post.author_id != auth.profile.id {
        return Err(Error::Forbidden);
    }
    Ok(post)
}

#[put("/posts/<id>", data = "<form>")]
pub fn update(
    id: i32,
    conn: DbConn,
    auth: Auth,
    form: Json<NewPostForm>,
) -> Result<Json<PostData>, ApiError> {
    let post = owned_post(&conn, &auth, id)?;
    let form = form.into_inner();
    form.validate().map_err(|e| validation_error(&e))?;

    let updated = post.update(
        &*conn,
        form.title,
        SafeString::new(&form.content),
        normalize_hashtags(&form.hashtags),
    )?;
    Ok(Json(post_data(&conn, updated)?))
}

#[derive(Deserialize)]
pub struct PatchPostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtags: Option<String>,
}

#[patch("/posts/<id>", data = "<form>")]
pub fn patch(
    id: i32,
    conn: DbConn,
    auth: Auth,
    form: Json<PatchPostForm>,
) -> Result<Json<PostData>, ApiError> {
    let post = owned_post(&conn, &auth, id)?;
    let form = form.into_inner();

    let title = form.title.unwrap_or_else(|| post.title.clone());
    if title.is_empty() {
        return Err(Error::Validation(String::from("Title is required")).into());
    }
    let content = form
        .content
        .map(|c| SafeString::new(&c))
        .unwrap_or_else(|| post.content.clone());
    if content.is_empty() {
        return Err(Error::Validation(String::from("Content is required")).into());
    }
    let hashtags = form
        .hashtags
        .map(|h| normalize_hashtags(&h))
        .unwrap_or_else(|| post.hashtags.clone());

    let updated = post.update(&*conn, title, content, hashtags)?;
    Ok(Json(post_data(&conn, updated)?))
}

#[delete("/posts/<id>")]
pub fn delete(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    let post = owned_post(&conn, &auth, id)?;
    post.delete(&*conn)?;
    Ok(message("Post deleted"))
}

#[get("/posts/<id>/upload-photo")]
pub fn photo(id: i32, conn: DbConn, _auth: Auth) -> Result<Json<PhotoData>, ApiError> {
    let post = Post::get(&*conn, id)?;
    Ok(Json(PhotoData {
        id: post.id,
        photo: post.photo,
    }))
}

#[put("/posts/<id>/upload-photo", data = "<data>")]
pub fn upload_photo(
    id: i32,
    data: Data,
    ct: &ContentType,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<PhotoData>, ApiError> {
    let post = owned_post(&conn, &auth, id)?;
    let (filename, bytes) = read_photo_upload(data, ct)?;
    let path = medias::save_image(
        medias::POST_UPLOAD_DIRECTORY,
        &post.title,
        filename.as_deref(),
        &bytes,
    )?;
    let updated = post.set_photo(&*conn, &path)?;
    Ok(Json(PhotoData {
        id: updated.id,
        photo: updated.photo,
    }))
}
