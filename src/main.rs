#![feature(proc_macro_hygiene, decl_macro)]

#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

use diesel::r2d2::ConnectionManager;
use dotenv::dotenv;
use ripple_models::{db_conn::DbPool, CONFIG};
use tracing::info;

mod api;

/// Initializes a database pool.
fn init_pool() -> DbPool {
    let manager = ConnectionManager::new(CONFIG.database_url.as_str());
    DbPool::builder()
        .build(manager)
        .expect("Couldn't build the database pool")
}

fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting ripple on {}", CONFIG.base_url);

    rocket::ignite()
        .mount(
            "/",
            routes![
                api::session::register,
                api::session::login,
                api::session::logout,
                api::profiles::me,
                api::profiles::update_me,
                api::profiles::list,
                api::profiles::create,
                api::profiles::details,
                api::profiles::update,
                api::profiles::photo,
                api::profiles::upload_photo,
                api::follows::followers,
                api::follows::followings,
                api::follows::status,
                api::follows::follow,
                api::follows::unfollow,
                api::follows::history,
                api::posts::list,
                api::posts::create,
                api::posts::own,
                api::posts::following_feed,
                api::posts::liked,
                api::posts::details,
                api::posts::update,
                api::posts::patch,
                api::posts::delete,
                api::posts::photo,
                api::posts::upload_photo,
                api::likes::status,
                api::likes::like,
                api::likes::unlike_status,
                api::likes::unlike,
                api::likes::history,
                api::comments::create,
                api::comments::delete,
                api::comments::own,
                api::comments::history,
            ],
        )
        .manage(init_pool())
        .launch();
}
