//! Timestamps live in the store as BSON dates and travel over HTTP as
//! RFC 3339 strings. Reads accept both, so documents written before the
//! switch still decode.

use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson};
use serde::{de, Deserialize, Deserializer};

pub fn to_bson(at: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(at))
}

fn from_bson<E: de::Error>(value: Bson) -> Result<DateTime<Utc>, E> {
    match value {
        Bson::DateTime(at) => Ok(at.to_chrono()),
        Bson::String(text) => DateTime::parse_from_rfc3339(&text)
            .map(|at| at.with_timezone(&Utc))
            .map_err(E::custom),
        other => Err(E::custom(format!(
            "expected a date, found {:?}",
            other.element_type()
        ))),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    from_bson(Bson::deserialize(deserializer)?)
}

pub mod option {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Bson>::deserialize(deserializer)? {
            None | Some(Bson::Null) => Ok(None),
            Some(value) => from_bson(value).map(Some),
        }
    }
}
