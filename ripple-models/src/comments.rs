use crate::{
    posts::Post, profiles::Profile, safe_string::SafeString, schema::comments, Connection, Error,
    Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::{
    self, ExpressionMethods, PgTextExpressionMethods, QueryDsl, RunQueryDsl,
};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Comment {
    pub id: i32,
    pub content: SafeString,
    pub creation_date: NaiveDateTime,
    pub author_id: i32,
    pub post_id: i32,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub content: SafeString,
    pub author_id: i32,
    pub post_id: i32,
}

/// Staff audit filters; all optional, combined with AND.
#[derive(Clone, Default)]
pub struct CommentFilter {
    /// Set membership over commenting profile ids.
    pub user: Option<Vec<i32>>,
    pub content: Option<String>,
    /// Substring over the commented post's title.
    pub post_title: Option<String>,
    pub created_day: Option<NaiveDate>,
}

impl Comment {
    insert!(comments, NewComment);
    get!(comments);
    list_by!(comments, list_by_post, post_id as i32);

    pub fn get_author(&self, conn: &Connection) -> Result<Profile> {
        Profile::get(conn, self.author_id)
    }

    pub fn get_post(&self, conn: &Connection) -> Result<Post> {
        Post::get(conn, self.post_id)
    }

    /// Comments under a post, oldest first, for the post detail view.
    pub fn for_post(conn: &Connection, post_id: i32) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq(post_id))
            .order(comments::creation_date.asc())
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    /// A profile's own comments, most recent first.
    pub fn page_for_author(
        conn: &Connection,
        author_id: i32,
        (min, max): (i32, i32),
    ) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::author_id.eq(author_id))
            .order(comments::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_author(conn: &Connection, author_id: i32) -> Result<i64> {
        comments::table
            .filter(comments::author_id.eq(author_id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    fn filtered<'a>(filter: &CommentFilter) -> comments::BoxedQuery<'a, diesel::pg::Pg> {
        use crate::schema::posts;

        let mut query = comments::table.into_boxed();
        if let Some(ref users) = filter.user {
            query = query.filter(comments::author_id.eq_any(users.clone()));
        }
        if let Some(ref content) = filter.content {
            query = query.filter(comments::content.ilike(format!("%{}%", content)));
        }
        if let Some(ref post_title) = filter.post_title {
            // match against the joined post title, not the numeric id
            let matching = posts::table
                .filter(posts::title.ilike(format!("%{}%", post_title)))
                .select(posts::id);
            query = query.filter(comments::post_id.eq_any(matching));
        }
        if let Some(day) = filter.created_day {
            let start = day.and_hms(0, 0, 0);
            let end = day.succ().and_hms(0, 0, 0);
            query = query
                .filter(comments::creation_date.ge(start))
                .filter(comments::creation_date.lt(end));
        }
        query
    }

    pub fn page_filtered(
        conn: &Connection,
        filter: &CommentFilter,
        (min, max): (i32, i32),
    ) -> Result<Vec<Comment>> {
        Comment::filtered(filter)
            .order(comments::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    pub fn count_filtered(conn: &Connection, filter: &CommentFilter) -> Result<i64> {
        Comment::filtered(filter)
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}
