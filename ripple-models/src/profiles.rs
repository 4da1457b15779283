use crate::{
    medias, safe_string::SafeString, schema::profiles, Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{
    self, Connection as _, ExpressionMethods, PgTextExpressionMethods, QueryDsl, RunQueryDsl,
};

pub const GENDERS: [&str; 2] = ["Female", "Male"];

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Profile {
    pub id: i32,
    pub account_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub country: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub bio: SafeString,
    pub photo: Option<String>,
    pub registered_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "profiles"]
pub struct NewProfile {
    pub account_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub country: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub bio: SafeString,
}

/// The directory's query parameters. Every field is optional; present
/// fields are combined with AND.
#[derive(Clone, Default)]
pub struct ProfileFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub age: Option<i32>,
}

fn contains(pattern: &str) -> String {
    format!("%{}%", pattern)
}

impl Profile {
    insert!(profiles, NewProfile);
    get!(profiles);
    find_by!(profiles, find_by_account, account_id as i32);

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    fn filtered<'a>(filter: &ProfileFilter) -> profiles::BoxedQuery<'a, diesel::pg::Pg> {
        let mut query = profiles::table.into_boxed();
        if let Some(ref first_name) = filter.first_name {
            query = query.filter(profiles::first_name.ilike(contains(first_name)));
        }
        if let Some(ref last_name) = filter.last_name {
            query = query.filter(profiles::last_name.ilike(contains(last_name)));
        }
        if let Some(ref city) = filter.city {
            query = query.filter(profiles::city.ilike(contains(city)));
        }
        if let Some(ref country) = filter.country {
            query = query.filter(profiles::country.ilike(contains(country)));
        }
        if let Some(age) = filter.age {
            query = query.filter(profiles::age.eq(age));
        }
        query
    }

    /// Directory listing, insertion order (id ascending).
    pub fn page_filtered(
        conn: &Connection,
        filter: &ProfileFilter,
        (min, max): (i32, i32),
    ) -> Result<Vec<Profile>> {
        Profile::filtered(filter)
            .order(profiles::id.asc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Profile>(conn)
            .map_err(Error::from)
    }

    pub fn count_filtered(conn: &Connection, filter: &ProfileFilter) -> Result<i64> {
        Profile::filtered(filter)
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count_followers(&self, conn: &Connection) -> Result<i64> {
        use crate::schema::follows;
        follows::table
            .filter(follows::following_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count_following(&self, conn: &Connection) -> Result<i64> {
        use crate::schema::follows;
        follows::table
            .filter(follows::follower_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// `registered_at` and `account_id` are immutable, so the update sets
    /// the mutable columns explicitly instead of saving a whole changeset.
    pub fn update(
        &self,
        conn: &Connection,
        first_name: String,
        last_name: String,
        city: String,
        country: String,
        age: Option<i32>,
        gender: Option<String>,
        bio: SafeString,
    ) -> Result<Profile> {
        diesel::update(self)
            .set((
                profiles::first_name.eq(first_name),
                profiles::last_name.eq(last_name),
                profiles::city.eq(city),
                profiles::country.eq(country),
                profiles::age.eq(age),
                profiles::gender.eq(gender),
                profiles::bio.eq(bio),
            ))
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Replaces the stored photo, removing the previous file from disk.
    pub fn set_photo(&self, conn: &Connection, path: &str) -> Result<Profile> {
        if let Some(ref old) = self.photo {
            medias::delete_file(old);
        }
        diesel::update(self)
            .set(profiles::photo.eq(path))
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Deletes the profile and everything it authored.
    ///
    /// Comments and likes left on other authors' posts survive the deletion
    /// of their post, so a profile that still has some may not be removed;
    /// the caller gets a validation error and nothing is touched.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        use crate::posts::Post;
        use crate::schema::{comments, likes, posts};
        use diesel::dsl::not;

        conn.transaction::<_, Error, _>(|| {
            let own_posts = posts::table
                .filter(posts::author_id.eq(self.id))
                .select(posts::id);
            let blocking_comments: i64 = comments::table
                .filter(comments::author_id.eq(self.id))
                .filter(not(comments::post_id.eq_any(own_posts.clone())))
                .count()
                .get_result(conn)?;
            let blocking_likes: i64 = likes::table
                .filter(likes::profile_id.eq(self.id))
                .filter(not(likes::post_id.eq_any(own_posts)))
                .count()
                .get_result(conn)?;
            if blocking_comments > 0 || blocking_likes > 0 {
                return Err(Error::Validation(String::from(
                    "Profile still has comments or likes on other users' posts",
                )));
            }

            for post in Post::list_for_author(conn, self.id)? {
                post.delete(conn)?;
            }
            diesel::delete(self).execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accounts::tests as account_tests, tests::db};
    use diesel::Connection as _;

    #[test]
    fn full_name_is_derived() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (_, profile) = account_tests::fill_database(&conn).remove(1);
            assert_eq!(profile.full_name(), "Jane Doe");
            Ok(())
        });
    }

    #[test]
    fn filters_are_conjunctive_and_case_insensitive() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            account_tests::fill_database(&conn);

            let by_country = ProfileFilter {
                country: Some("fran".to_owned()),
                ..ProfileFilter::default()
            };
            assert_eq!(Profile::count_filtered(&conn, &by_country)?, 2);

            let narrowed = ProfileFilter {
                country: Some("FRANCE".to_owned()),
                first_name: Some("jane".to_owned()),
                ..ProfileFilter::default()
            };
            let found = Profile::page_filtered(&conn, &narrowed, (0, 10))?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].last_name, "Doe");

            let nobody = ProfileFilter {
                city: Some("Atlantis".to_owned()),
                ..ProfileFilter::default()
            };
            assert_eq!(Profile::count_filtered(&conn, &nobody)?, 0);
            Ok(())
        });
    }

    #[test]
    fn directory_is_in_insertion_order() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            account_tests::fill_database(&conn);
            let all = Profile::page_filtered(&conn, &ProfileFilter::default(), (0, 10))?;
            let mut ids = all.iter().map(|p| p.id).collect::<Vec<_>>();
            ids.sort_unstable();
            assert_eq!(ids, all.iter().map(|p| p.id).collect::<Vec<_>>());
            Ok(())
        });
    }

    #[test]
    fn follower_counts() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::follows::Follow;
            let profiles = account_tests::fill_database(&conn);
            let jane = &profiles[1].1;
            let john = &profiles[2].1;

            Follow::follow(&conn, jane, john.id)?;
            assert_eq!(john.count_followers(&conn)?, 1);
            assert_eq!(john.count_following(&conn)?, 0);
            assert_eq!(jane.count_following(&conn)?, 1);
            Ok(())
        });
    }

    #[test]
    fn deletion_is_refused_while_dependents_survive() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::comments::{Comment, NewComment};
            use crate::posts::{NewPost, Post};

            let profiles = account_tests::fill_database(&conn);
            let jane = &profiles[1].1;
            let john = &profiles[2].1;

            let post = Post::insert(
                &conn,
                NewPost {
                    title: "Hello".to_owned(),
                    content: SafeString::new("world"),
                    hashtags: String::new(),
                    photo: None,
                    author_id: john.id,
                },
            )?;
            Comment::insert(
                &conn,
                NewComment {
                    content: SafeString::new("first!"),
                    author_id: jane.id,
                    post_id: post.id,
                },
            )?;

            assert!(matches!(jane.delete(&conn), Err(Error::Validation(_))));
            assert!(Profile::get(&conn, jane.id).is_ok());

            // once the blocking comment is gone the profile can go too
            Comment::list_by_post(&conn, post.id)?
                .into_iter()
                .try_for_each(|c| c.delete(&conn))?;
            jane.delete(&conn)?;
            assert!(Profile::get(&conn, jane.id).is_err());
            Ok(())
        });
    }
}
