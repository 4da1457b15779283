use crate::{posts::Post, profiles::Profile, schema::likes, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Like {
    pub id: i32,
    pub creation_date: NaiveDateTime,
    pub profile_id: i32,
    pub post_id: i32,
}

#[derive(Insertable)]
#[table_name = "likes"]
pub struct NewLike {
    pub profile_id: i32,
    pub post_id: i32,
}

impl Like {
    insert!(likes, NewLike);
    get!(likes);
    find_by!(likes, find_by_profile_on_post, profile_id as i32, post_id as i32);

    /// Records that `profile` likes `post`.
    ///
    /// `Ok(None)` means the like already existed; like `Follow::follow`,
    /// losing a race to the unique constraint gives the same answer as the
    /// advisory check.
    pub fn like(conn: &Connection, profile: &Profile, post: &Post) -> Result<Option<Like>> {
        if Like::find_by_profile_on_post(conn, profile.id, post.id).is_ok() {
            return Ok(None);
        }
        match Like::insert(
            conn,
            NewLike {
                profile_id: profile.id,
                post_id: post.id,
            },
        ) {
            Ok(like) => Ok(Some(like)),
            Err(ref e) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `Ok(false)` when the profile never liked the post; storage is left
    /// untouched in that case.
    pub fn unlike(conn: &Connection, profile: &Profile, post: &Post) -> Result<bool> {
        match Like::find_by_profile_on_post(conn, profile.id, post.id) {
            Ok(like) => {
                diesel::delete(&like).execute(conn)?;
                Ok(true)
            }
            Err(Error::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // staff audit view
    pub fn page(conn: &Connection, (min, max): (i32, i32)) -> Result<Vec<Like>> {
        likes::table
            .order(likes::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Like>(conn)
            .map_err(Error::from)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        likes::table.count().get_result(conn).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{posts::tests as post_tests, tests::db};
    use diesel::Connection as _;

    #[test]
    fn like_twice_creates_one_row() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (profiles, posts) = post_tests::fill_database(&conn);
            let jane = &profiles[1];

            assert!(Like::like(&conn, jane, &posts[0])?.is_some());
            assert!(Like::like(&conn, jane, &posts[0])?.is_none());
            assert_eq!(Like::count(&conn)?, 1);
            Ok(())
        });
    }

    #[test]
    fn unlike_without_like_changes_nothing() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (profiles, posts) = post_tests::fill_database(&conn);
            let jane = &profiles[1];

            assert!(!Like::unlike(&conn, jane, &posts[0])?);
            assert_eq!(Like::count(&conn)?, 0);

            Like::like(&conn, jane, &posts[0])?;
            assert!(Like::unlike(&conn, jane, &posts[0])?);
            assert_eq!(Like::count(&conn)?, 0);
            Ok(())
        });
    }
}
