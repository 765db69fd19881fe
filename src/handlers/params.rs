//! Query-string and body helpers shared by the handlers.

use serde::{de::DeserializeOwned, de::IntoDeserializer, Deserialize, Deserializer};

use crate::error::ApiError;
use crate::query::{PageRequest, SortDirection};

/// Paging fields every list endpoint accepts. Kept as plain fields on each
/// query struct because `serde(flatten)` loses the numeric types of
/// url-encoded values.
pub trait Paged {
    fn page(&self) -> Option<i64>;
    fn limit(&self) -> Option<i64>;
    fn sort_field(&self) -> Option<&str>;
    fn sort_value(&self) -> Option<SortDirection>;

    /// Paging input with the sort field mapped to its column name
    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page(),
            limit: self.limit(),
            sort_field: self.sort_field().map(column_name),
            sort_value: self.sort_value(),
        }
    }
}

macro_rules! impl_paged {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::handlers::params::Paged for $ty {
            fn page(&self) -> Option<i64> {
                self.page
            }
            fn limit(&self) -> Option<i64> {
                self.limit
            }
            fn sort_field(&self) -> Option<&str> {
                self.sort_field.as_deref()
            }
            fn sort_value(&self) -> Option<$crate::query::SortDirection> {
                self.sort_value
            }
        })*
    };
}
pub(crate) use impl_paged;

/// `createdAt` -> `created_at`. Clients sort by their camelCase field names.
pub fn column_name(field: &str) -> String {
    let mut column = String::with_capacity(field.len() + 4);
    for c in field.trim().chars() {
        if c.is_ascii_uppercase() {
            column.push('_');
            column.push(c.to_ascii_lowercase());
        } else {
            column.push(c);
        }
    }
    column
}

/// Deserialize `a,b,c` into a list, skipping empty items. An absent or
/// empty parameter yields `None`.
pub fn comma_separated<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| T::deserialize(s.to_string().into_deserializer()))
        .collect::<Result<Vec<T>, serde::de::value::Error>>()
        .map_err(serde::de::Error::custom)?;
    Ok(Some(values).filter(|v| !v.is_empty()))
}

/// Trimmed, non-empty body field
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::invalid_field(field, format!("{} Required", field)));
    }
    Ok(value)
}

/// Treat blank optional query values as absent
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
