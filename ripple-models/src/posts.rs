use crate::{
    medias, profiles::Profile, safe_string::SafeString, schema::posts, Connection, Error, Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::{
    self, Connection as _, ExpressionMethods, PgTextExpressionMethods, QueryDsl, RunQueryDsl,
};
use itertools::Itertools;

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: SafeString,
    pub hashtags: String,
    pub photo: Option<String>,
    pub creation_date: NaiveDateTime,
    pub author_id: i32,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub title: String,
    pub content: SafeString,
    pub hashtags: String,
    pub photo: Option<String>,
    pub author_id: i32,
}

/// Catalog query parameters; all optional, combined with AND.
#[derive(Clone, Default)]
pub struct PostFilter {
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtags: Option<String>,
    /// Set membership over author ids.
    pub author: Option<Vec<i32>>,
    /// Exact calendar day of creation.
    pub created_day: Option<NaiveDate>,
}

fn contains(pattern: &str) -> String {
    format!("%{}%", pattern)
}

/// Normalizes the free-text hashtag field: "#a ,#b,,#c " -> "#a, #b, #c".
pub fn normalize_hashtags(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .join(", ")
}

impl Post {
    insert!(posts, NewPost);
    get!(posts);

    pub fn get_author(&self, conn: &Connection) -> Result<Profile> {
        Profile::get(conn, self.author_id)
    }

    fn filtered<'a>(filter: &PostFilter) -> posts::BoxedQuery<'a, diesel::pg::Pg> {
        let mut query = posts::table.into_boxed();
        if let Some(ref title) = filter.title {
            query = query.filter(posts::title.ilike(contains(title)));
        }
        if let Some(ref content) = filter.content {
            query = query.filter(posts::content.ilike(contains(content)));
        }
        if let Some(ref hashtags) = filter.hashtags {
            query = query.filter(posts::hashtags.ilike(contains(hashtags)));
        }
        if let Some(ref authors) = filter.author {
            query = query.filter(posts::author_id.eq_any(authors.clone()));
        }
        if let Some(day) = filter.created_day {
            let start = day.and_hms(0, 0, 0);
            let end = day.succ().and_hms(0, 0, 0);
            query = query
                .filter(posts::creation_date.ge(start))
                .filter(posts::creation_date.lt(end));
        }
        query
    }

    pub fn page_filtered(
        conn: &Connection,
        filter: &PostFilter,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        Post::filtered(filter)
            .order(posts::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_filtered(conn: &Connection, filter: &PostFilter) -> Result<i64> {
        Post::filtered(filter)
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn list_for_author(conn: &Connection, author_id: i32) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author_id))
            .order(posts::creation_date.desc())
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn page_for_author(
        conn: &Connection,
        author_id: i32,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author_id))
            .order(posts::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_author(conn: &Connection, author_id: i32) -> Result<i64> {
        posts::table
            .filter(posts::author_id.eq(author_id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Posts written by everyone `profile` follows, newest first. An empty
    /// follow set simply yields an empty page.
    pub fn page_following_feed(
        conn: &Connection,
        profile: &Profile,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        use crate::schema::follows;
        let followed = follows::table
            .filter(follows::follower_id.eq(profile.id))
            .select(follows::following_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .order(posts::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_following_feed(conn: &Connection, profile: &Profile) -> Result<i64> {
        use crate::schema::follows;
        let followed = follows::table
            .filter(follows::follower_id.eq(profile.id))
            .select(follows::following_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_liked_by(
        conn: &Connection,
        profile: &Profile,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        use crate::schema::likes;
        let liked = likes::table
            .filter(likes::profile_id.eq(profile.id))
            .select(likes::post_id);
        posts::table
            .filter(posts::id.eq_any(liked))
            .order(posts::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_liked_by(conn: &Connection, profile: &Profile) -> Result<i64> {
        use crate::schema::likes;
        let liked = likes::table
            .filter(likes::profile_id.eq(profile.id))
            .select(likes::post_id);
        posts::table
            .filter(posts::id.eq_any(liked))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count_comments(&self, conn: &Connection) -> Result<i64> {
        use crate::schema::comments;
        comments::table
            .filter(comments::post_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count_likes(&self, conn: &Connection) -> Result<i64> {
        use crate::schema::likes;
        likes::table
            .filter(likes::post_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn update(
        &self,
        conn: &Connection,
        title: String,
        content: SafeString,
        hashtags: String,
    ) -> Result<Post> {
        diesel::update(self)
            .set((
                posts::title.eq(title),
                posts::content.eq(content),
                posts::hashtags.eq(hashtags),
            ))
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn set_photo(&self, conn: &Connection, path: &str) -> Result<Post> {
        if let Some(ref old) = self.photo {
            medias::delete_file(old);
        }
        diesel::update(self)
            .set(posts::photo.eq(path))
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Removes the post together with its comments and likes, atomically;
    /// the photo file goes once the row deletions have committed.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        use crate::schema::{comments, likes};

        conn.transaction::<_, Error, _>(|| {
            diesel::delete(comments::table.filter(comments::post_id.eq(self.id))).execute(conn)?;
            diesel::delete(likes::table.filter(likes::post_id.eq(self.id))).execute(conn)?;
            diesel::delete(self).execute(conn)?;
            Ok(())
        })?;
        if let Some(ref photo) = self.photo {
            medias::delete_file(photo);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{accounts::tests as account_tests, tests::db};
    use diesel::Connection as _;

    pub(crate) fn fill_database(conn: &Connection) -> (Vec<Profile>, Vec<Post>) {
        let profiles = account_tests::fill_database(conn)
            .into_iter()
            .map(|(_, profile)| profile)
            .collect::<Vec<_>>();
        let posts = vec![
            ("Hello", "first post", "#hello", profiles[1].id),
            ("News", "breaking news", "#news, #breaking", profiles[2].id),
            ("Weather", "still raining", "", profiles[2].id),
        ]
        .into_iter()
        .map(|(title, content, hashtags, author_id)| {
            Post::insert(
                conn,
                NewPost {
                    title: title.to_owned(),
                    content: SafeString::new(content),
                    hashtags: hashtags.to_owned(),
                    photo: None,
                    author_id,
                },
            )
            .expect("Couldn't insert post")
        })
        .collect();
        (profiles, posts)
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_hashtags("#a ,#b,,#c "), "#a, #b, #c");
        assert_eq!(normalize_hashtags(""), "");
    }

    #[test]
    fn filters() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (profiles, _) = fill_database(&conn);

            let by_title = PostFilter {
                title: Some("news".to_owned()),
                ..PostFilter::default()
            };
            assert_eq!(Post::count_filtered(&conn, &by_title)?, 1);

            let by_tag = PostFilter {
                hashtags: Some("break".to_owned()),
                ..PostFilter::default()
            };
            assert_eq!(Post::count_filtered(&conn, &by_tag)?, 1);

            let by_authors = PostFilter {
                author: Some(vec![profiles[1].id, profiles[2].id]),
                ..PostFilter::default()
            };
            assert_eq!(Post::count_filtered(&conn, &by_authors)?, 3);

            let conjunction = PostFilter {
                author: Some(vec![profiles[2].id]),
                content: Some("RAIN".to_owned()),
                ..PostFilter::default()
            };
            assert_eq!(Post::count_filtered(&conn, &conjunction)?, 1);
            Ok(())
        });
    }

    #[test]
    fn filter_by_creation_day() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            let (_, posts) = fill_database(&conn);

            let today = posts[0].creation_date.date();
            let on_day = PostFilter {
                created_day: Some(today),
                ..PostFilter::default()
            };
            assert_eq!(Post::count_filtered(&conn, &on_day)?, 3);

            let before = PostFilter {
                created_day: Some(today.pred()),
                ..PostFilter::default()
            };
            assert_eq!(Post::count_filtered(&conn, &before)?, 0);
            Ok(())
        });
    }

    #[test]
    fn following_feed_follows_edge_direction() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::follows::Follow;
            let (profiles, _) = fill_database(&conn);
            let jane = &profiles[1];
            let john = &profiles[2];

            // Jane follows John: her feed has his posts, his stays empty
            Follow::follow(&conn, jane, john.id)?;

            let feed = Post::page_following_feed(&conn, jane, (0, 10))?;
            assert_eq!(feed.len(), 2);
            assert!(feed.iter().all(|p| p.author_id == john.id));

            assert!(Post::page_following_feed(&conn, john, (0, 10))?.is_empty());
            assert_eq!(Post::count_following_feed(&conn, john)?, 0);
            Ok(())
        });
    }

    #[test]
    fn liked_posts() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::likes::Like;
            let (profiles, posts) = fill_database(&conn);
            let jane = &profiles[1];

            Like::like(&conn, jane, &posts[1])?;
            let liked = Post::page_liked_by(&conn, jane, (0, 10))?;
            assert_eq!(liked.len(), 1);
            assert_eq!(liked[0].id, posts[1].id);
            Ok(())
        });
    }

    #[test]
    fn counts_are_live() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::comments::{Comment, NewComment};
            use crate::likes::Like;
            let (profiles, posts) = fill_database(&conn);
            let post = &posts[0];

            assert_eq!(post.count_comments(&conn)?, 0);
            assert_eq!(post.count_likes(&conn)?, 0);

            Comment::insert(
                &conn,
                NewComment {
                    content: SafeString::new("nice"),
                    author_id: profiles[2].id,
                    post_id: post.id,
                },
            )?;
            Like::like(&conn, &profiles[2], post)?;

            assert_eq!(post.count_comments(&conn)?, 1);
            assert_eq!(post.count_likes(&conn)?, 1);
            Ok(())
        });
    }

    #[test]
    fn delete_cascades_comments_and_likes() {
        let conn = db();
        conn.test_transaction::<_, Error, _>(|| {
            use crate::comments::{Comment, NewComment};
            use crate::likes::Like;
            use crate::schema::{comments, likes};

            let (profiles, posts) = fill_database(&conn);
            let post = posts.into_iter().next().unwrap();

            Comment::insert(
                &conn,
                NewComment {
                    content: SafeString::new("soon gone"),
                    author_id: profiles[2].id,
                    post_id: post.id,
                },
            )?;
            Like::like(&conn, &profiles[2], &post)?;

            let post_id = post.id;
            post.delete(&conn)?;

            assert!(Post::get(&conn, post_id).is_err());
            let orphan_comments: i64 = comments::table
                .filter(comments::post_id.eq(post_id))
                .count()
                .get_result(&conn)?;
            let orphan_likes: i64 = likes::table
                .filter(likes::post_id.eq(post_id))
                .count()
                .get_result(&conn)?;
            assert_eq!(orphan_comments, 0);
            assert_eq!(orphan_likes, 0);
            Ok(())
        });
    }
}
