use crate::api::{
    authorization::{Admin, Auth},
    message, ApiError, PageQuery,
};
use ripple_api::{likes::LikeData, Page};
use ripple_models::{db_conn::DbConn, likes::Like, posts::Post};
use rocket::request::LenientForm;
use rocket_contrib::json::Json;

#[get("/posts/<id>/like")]
pub fn status(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    let post = Post::get(&*conn, id)?;
    let liked = Like::find_by_profile_on_post(&*conn, auth.profile.id, post.id).is_ok();
    Ok(Json(json!({ "liked": liked })))
}

#[post("/posts/<id>/like")]
pub fn like(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    let post = Post::get(&*conn, id)?;
    match Like::like(&*conn, &auth.profile, &post)? {
        Some(_) => Ok(message("You liked this post")),
        None => Ok(message("You have already liked this post")),
    }
}

#[get("/posts/<id>/unlike")]
pub fn unlike_status(
    id: i32,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<serde_json::Value>, ApiError> {
    status(id, conn, auth)
}

#[delete("/posts/<id>/unlike")]
pub fn unlike(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    let post = Post::get(&*conn, id)?;
    if Like::unlike(&*conn, &auth.profile, &post)? {
        Ok(message("You no longer like this post"))
    } else {
        Ok(message("You have never liked this post"))
    }
}

#[get("/likes-history?<page..>")]
pub fn history(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    _admin: Admin,
) -> Result<Json<Page<LikeData>>, ApiError> {
    let results = Like::page(&*conn, page.limits())?
        .into_iter()
        .map(|like| LikeData {
            id: like.id,
            profile_id: like.profile_id,
            post_id: like.post_id,
            creation_date: like.creation_date,
        })
        .collect();
    let count = Like::count(&*conn)?;
    Ok(Json(page.envelope(count, results)))
}
