use ammonia::clean;
use diesel::{
    deserialize::{self, FromSql},
    pg::Pg,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    borrow::Borrow,
    fmt::{self, Display},
    io::Write,
    ops::Deref,
};

/// User-authored text with HTML stripped by ammonia.
///
/// `new` sanitizes; `trusted` skips it and is reserved for values that
/// were already sanitized before being written to the database.
#[derive(Debug, Clone, Default, AsExpression, FromSqlRow, PartialEq, Eq)]
#[sql_type = "Text"]
pub struct SafeString {
    value: String,
}

impl SafeString {
    pub fn new(value: &str) -> Self {
        SafeString {
            value: clean(value),
        }
    }

    pub fn trusted(value: &str) -> Self {
        SafeString {
            value: value.to_owned(),
        }
    }

    pub fn set(&mut self, value: &str) {
        self.value = clean(value);
    }

    pub fn get(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Serialize for SafeString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for SafeString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|value| SafeString::new(&value))
    }
}

impl FromSql<Text, Pg> for SafeString {
    fn from_sql(value: Option<&[u8]>) -> deserialize::Result<Self> {
        // sanitized when it was written
        <String as FromSql<Text, Pg>>::from_sql(value).map(|value| SafeString::trusted(&value))
    }
}

impl ToSql<Text, Pg> for SafeString {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(&self.value, out)
    }
}

impl Borrow<str> for SafeString {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl Deref for SafeString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup() {
        let safe = SafeString::new("Hello <script>alert('hi')</script>world");
        assert!(!safe.get().contains("<script>"));
        assert!(safe.get().contains("Hello"));
    }

    #[test]
    fn plain_text_is_kept() {
        let safe = SafeString::new("Just a plain bio, nothing fancy.");
        assert_eq!(safe.get(), "Just a plain bio, nothing fancy.");
    }
}
