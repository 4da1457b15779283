use crate::api::{
    authorization::{Admin, Auth},
    message, ApiError, PageQuery,
};
use ripple_api::{
    follows::{FollowEdge, FollowItem},
    Page,
};
use ripple_models::{
    db_conn::DbConn,
    follows::Follow,
    profiles::Profile,
};
use rocket::request::LenientForm;
use rocket_contrib::json::Json;

fn follow_item((follow, profile): (Follow, Profile)) -> FollowItem {
    FollowItem {
        id: profile.id,
        full_name: profile.full_name(),
        city: profile.city,
        photo: profile.photo,
        followed_at: follow.creation_date,
    }
}

#[get("/profile/followers?<page..>")]
pub fn followers(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<Page<FollowItem>>, ApiError> {
    let results = Follow::page_followers(&*conn, auth.profile.id, page.limits())?
        .into_iter()
        .map(follow_item)
        .collect();
    let count = auth.profile.count_followers(&*conn)?;
    Ok(Json(page.envelope(count, results)))
}

#[get("/profile/followings?<page..>")]
pub fn followings(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    auth: Auth,
) -> Result<Json<Page<FollowItem>>, ApiError> {
    let results = Follow::page_following(&*conn, auth.profile.id, page.limits())?
        .into_iter()
        .map(follow_item)
        .collect();
    let count = auth.profile.count_following(&*conn)?;
    Ok(Json(page.envelope(count, results)))
}

#[get("/users/<id>/follow")]
pub fn status(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    Profile::get(&*conn, id)?;
    let following = Follow::find(&*conn, auth.profile.id, id).is_ok();
    Ok(Json(json!({ "following": following })))
}

#[post("/users/<id>/follow")]
pub fn follow(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    match Follow::follow(&*conn, &auth.profile, id)? {
        Some(_) => Ok(message("You are now following this user")),
        None => Ok(message("You already follow this user")),
    }
}

#[delete("/users/<id>/follow")]
pub fn unfollow(id: i32, conn: DbConn, auth: Auth) -> Result<Json<serde_json::Value>, ApiError> {
    if Follow::unfollow(&*conn, &auth.profile, id)? {
        Ok(message("You no longer follow this user"))
    } else {
        Ok(message("You do not follow this user"))
    }
}

#[get("/following-history?<page..>")]
pub fn history(
    page: LenientForm<PageQuery>,
    conn: DbConn,
    _admin: Admin,
) -> Result<Json<Page<FollowEdge>>, ApiError> {
    let results = Follow::page(&*conn, page.limits())?
        .into_iter()
        .map(|follow| FollowEdge {
            id: follow.id,
            follower_id: follow.follower_id,
            following_id: follow.following_id,
            creation_date: follow.creation_date,
        })
        .collect();
    let count = Follow::count(&*conn)?;
    Ok(Json(page.envelope(count, results)))
}
