//! Response view-models shared between the server and API clients.
//!
//! Every endpoint has a named output shape; nothing here is assembled
//! conditionally at runtime.

extern crate serde;
#[macro_use]
extern crate serde_derive;

/// Page-number pagination envelope used by every list endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of matching items, not just this page's.
    pub count: i64,
    /// Next page number, when there is one.
    pub next: Option<i32>,
    pub previous: Option<i32>,
    pub results: Vec<T>,
}

pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod users;
