use crate::{profiles::Profile, schema::follows, Connection, Error, Result};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, JoinOnDsl, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub following_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "follows"]
pub struct NewFollow {
    pub follower_id: i32,
    pub following_id: i32,
}

impl Follow {
    insert!(follows, NewFollow);
    get!(follows);

    pub fn find(conn: &Connection, from: i32, to: i32) -> Result<Follow> {
        follows::table
            .filter(follows::follower_id.eq(from))
            .filter(follows::following_id.eq(to))
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Creates the edge `follower -> following_id`.
    ///
    /// Returns `Ok(None)` when the edge already exists — including when a
    /// concurrent request wins the race and this insert hits the unique
    /// constraint, which is the authoritative guard. Self-follows are
    /// rejected outright.
    pub fn follow(conn: &Connection, follower: &Profile, following_id: i32) -> Result<Option<Follow>> {
        if follower.id == following_id {
            return Err(Error::SelfFollow);
        }
        Profile::get(conn, following_id)?;

        if Follow::find(conn, follower.id, following_id).is_ok() {
            return Ok(None);
        }
        match Follow::insert(
            conn,
            NewFollow {
                follower_id: follower.id,
                following_id,
            },
        ) {
            Ok(follow) => Ok(Some(follow)),
            Err(ref e) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Removes the edge if present; `Ok(false)` when there was nothing to
    /// remove.
    pub fn unfollow(conn: &Connection, follower: &Profile, following_id: i32) -> Result<bool> {
        Profile::get(conn, following_id)?;
        match Follow::find(conn, follower.id, following_id) {
            Ok(follow) => {
                diesel::delete(&follow).execute(conn)?;
                Ok(true)
            }
            Err(Error::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The profiles following `profile_id`, newest edge first, with the edge
    /// itself for its creation date.
    pub fn page_followers(
        conn: &Connection,
        profile_id: i32,
        (min, max): (i32, i32),
    ) -> Result<Vec<(Follow, Profile)>> {
        use crate::schema::profiles;
        follows::table
            .inner_join(profiles::table.on(profiles::id.eq(follows::follower_id)))
            .filter(follows::following_id.eq(profile_id))
            .order(follows::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<(Follow, Profile)>(conn)
            .map_err(Error::from)
    }

    /// The profiles `profile_id` follows, newest edge first.
    pub fn page_following(
        conn: &Connection,
        profile_id: i32,
        (min, max): (i32, i32),
    ) -> Result<Vec<(Follow, Profile)>> {
        use crate::schema::profiles;
        follows::table
            .inner_join(profiles::table.on(profiles::id.eq(follows::following_id)))
            .filter(follows::follower_id.eq(profile_id))
            .order(follows::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<(Follow, Profile)>(conn)
            .map_err(Error::from)
    }

    // staff audit view
    pub fn page(conn: &Connection, (min, max): (i32, i32)) -> Result<Vec<Follow>> {
        follows::table
            .order(follows::id.asc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Follow>(conn)
            .map_err(Error::from)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        follows::table.count().get_result(conn).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accounts::tests as account_tests, tests::db};
    use diesel::Connection as _;

    #[test]
    fn follow_twice_yields_one_edge() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let profiles = account_tests::fill_database(&conn);
            let jane = &profiles[1].1;
            let john = &profiles[2].1;

            assert!(Follow::follow(&conn, jane, john.id)?.is_some());
            assert!(Follow::follow(&conn, jane, john.id)?.is_none());
            assert_eq!(Follow::count(&conn)?, 1);
            Ok(())
        });
    }

    #[test]
    fn self_follow_is_rejected() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (_, jane) = account_tests::fill_database(&conn).remove(1);
            assert!(matches!(
                Follow::follow(&conn, &jane, jane.id),
                Err(Error::SelfFollow)
            ));
            assert_eq!(Follow::count(&conn)?, 0);
            Ok(())
        });
    }

    #[test]
    fn unfollow_round_trip() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let profiles = account_tests::fill_database(&conn);
            let jane = &profiles[1].1;
            let john = &profiles[2].1;

            assert!(!Follow::unfollow(&conn, jane, john.id)?);
            Follow::follow(&conn, jane, john.id)?;
            assert!(Follow::unfollow(&conn, jane, john.id)?);
            assert_eq!(Follow::count(&conn)?, 0);
            Ok(())
        });
    }

    #[test]
    fn edge_is_visible_from_both_ends() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let profiles = account_tests::fill_database(&conn);
            let jane = &profiles[1].1;
            let john = &profiles[2].1;

            Follow::follow(&conn, jane, john.id)?;

            let followers = Follow::page_followers(&conn, john.id, (0, 10))?;
            assert_eq!(followers.len(), 1);
            assert_eq!(followers[0].1.id, jane.id);

            let following = Follow::page_following(&conn, jane.id, (0, 10))?;
            assert_eq!(following.len(), 1);
            assert_eq!(following[0].1.id, john.id);

            assert!(Follow::page_following(&conn, john.id, (0, 10))?.is_empty());
            Ok(())
        });
    }
}
