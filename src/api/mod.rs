use multipart::server::{
    save::{SaveResult, SavedData},
    Multipart,
};
use ripple_api::Page;
use ripple_models::Error;
use rocket::{
    http::{ContentType, Status},
    response::{self, status, Responder},
    Data, Request,
};
use rocket_contrib::json::Json;
use std::fs;
use tracing::error;

pub mod authorization;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod profiles;
pub mod session;

pub const DEFAULT_PAGE_SIZE: i32 = 10;
pub const MAX_PAGE_SIZE: i32 = 1000;

/// An informational success answer: "already liked", "not following", …
/// These are 200s with a message, never 4xx.
pub fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

/// Maps model errors to HTTP statuses at the request boundary.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> ApiError {
        ApiError(err)
    }
}

impl<'r> Responder<'r> for ApiError {
    fn respond_to(self, req: &Request<'_>) -> response::Result<'r> {
        let (code, text) = match self.0 {
            Error::NotFound => (Status::NotFound, String::from("Not found")),
            Error::Unauthorized => (
                Status::Unauthorized,
                String::from("Invalid token or credentials"),
            ),
            Error::Forbidden => (
                Status::Forbidden,
                String::from("You must be the owner to perform this action"),
            ),
            Error::SelfFollow => (
                Status::BadRequest,
                String::from("You cannot follow yourself"),
            ),
            Error::InvalidImage => (
                Status::BadRequest,
                String::from("Uploaded file is not a valid image"),
            ),
            Error::Validation(msg) => (Status::BadRequest, msg),
            Error::Db(_) | Error::Io(_) | Error::Password => {
                error!("Internal error: {:?}", self.0);
                (Status::InternalServerError, String::from("Internal error"))
            }
        };
        status::Custom(code, Json(json!({ "error": text }))).respond_to(req)
    }
}

/// `page` / `page_size` query parameters, shared by every list endpoint.
#[derive(FromForm, Clone, Copy, Default)]
pub struct PageQuery {
    pub page: Option<i32>,
    pub page_size: Option<i32>,
}

impl PageQuery {
    pub fn page(&self) -> i32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn size(&self) -> i32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
            .max(1)
    }

    /// Offset window for the model layer's `(min, max)` paging arguments.
    pub fn limits(&self) -> (i32, i32) {
        ((self.page() - 1) * self.size(), self.page() * self.size())
    }

    pub fn envelope<T>(&self, count: i64, results: Vec<T>) -> Page<T> {
        let page = self.page();
        let next = if i64::from(page) * i64::from(self.size()) < count {
            Some(page + 1)
        } else {
            None
        };
        let previous = if page > 1 { Some(page - 1) } else { None };
        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Pulls the `file` field out of a multipart upload body, returning the
/// client-side filename (for its extension) and the raw bytes.
pub fn read_photo_upload(data: Data, ct: &ContentType) -> Result<(Option<String>, Vec<u8>), Error> {
    if !ct.is_form_data() {
        return Err(Error::Validation(String::from(
            "Expected a multipart/form-data body",
        )));
    }
    let (_, boundary) = ct
        .params()
        .find(|&(k, _)| k == "boundary")
        .ok_or_else(|| Error::Validation(String::from("No multipart boundary")))?;

    match Multipart::with_body(data.open(), boundary).save().temp() {
        SaveResult::Full(entries) => {
            let field = entries
                .fields
                .get("file")
                .and_then(|fields| fields.iter().next())
                .ok_or_else(|| Error::Validation(String::from("No file uploaded")))?;
            let filename = field.headers.filename.clone();
            let bytes = match field.data {
                SavedData::Bytes(ref bytes) => bytes.clone(),
                SavedData::File(ref path, _) => fs::read(path)?,
                SavedData::Text(ref text) => text.clone().into_bytes(),
            };
            Ok((filename, bytes))
        }
        SaveResult::Partial(_, _) | SaveResult::Error(_) => {
            Err(Error::Validation(String::from("Couldn't read the upload")))
        }
    }
}

/// Parses a comma-separated id list ("1,2,3"), dropping duplicates and junk.
pub fn parse_id_list(raw: &str) -> Vec<i32> {
    use itertools::Itertools;
    raw.split(',')
        .filter_map(|part| part.trim().parse::<i32>().ok())
        .unique()
        .collect()
}

/// Parses a `created_time` day parameter (`YYYY-MM-DD`).
pub fn parse_day(raw: &str) -> Result<chrono::NaiveDate, Error> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::Validation(String::from("created_time must be formatted YYYY-MM-DD")))
}

/// Flattens validator output into a single field-level message.
pub fn validation_error(errors: &validator::ValidationErrors) -> Error {
    let text = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                err.message
                    .as_ref()
                    .map(|msg| format!("{}: {}", field, msg))
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .next()
        .unwrap_or_else(|| String::from("Invalid input"));
    Error::Validation(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i32>, page_size: Option<i32>) -> PageQuery {
        PageQuery { page, page_size }
    }

    #[test]
    fn twelve_items_in_pages_of_five() {
        let sizes = (1..=3)
            .map(|page| {
                let q = query(Some(page), Some(5));
                let (min, max) = q.limits();
                (12 - min).min(max - min).max(0)
            })
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![5, 5, 2]);

        let first = query(Some(1), Some(5)).envelope(12, vec![(); 5]);
        assert_eq!(first.count, 12);
        assert_eq!(first.next, Some(2));
        assert_eq!(first.previous, None);

        let last = query(Some(3), Some(5)).envelope(12, vec![(); 2]);
        assert_eq!(last.count, 12);
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(query(None, None).size(), DEFAULT_PAGE_SIZE);
        assert_eq!(query(None, Some(5000)).size(), MAX_PAGE_SIZE);
        assert_eq!(query(None, Some(0)).size(), 1);
        assert_eq!(query(Some(0), None).page(), 1);
    }

    #[test]
    fn id_list_parsing() {
        assert_eq!(parse_id_list("1, 2,2,junk,3"), vec![1, 2, 3]);
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn day_parsing() {
        assert!(parse_day("2024-02-03").is_ok());
        assert!(parse_day("03/02/2024").is_err());
    }
}
