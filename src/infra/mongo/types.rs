use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ingredient name to quantity, e.g. `"flour": "200g"`.
    #[serde(default)]
    pub ingredients: BTreeMap<String, String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep: Option<u32>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(
        default,
        deserialize_with = "dates::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(
        default,
        deserialize_with = "dates::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "dates::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "dates::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_edited_at: Option<DateTime<Utc>>,
}

/// A rating and comment left by one user, embedded in exactly one [`Recipe`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(deserialize_with = "dates::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub updated_at: DateTime<Utc>,
}

/// New values for an existing review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewUpdate {
    pub rating: u8,
    pub comment: String,
}

/// Only the identifier of a recipe, for projected lookups.
#[derive(Debug, Deserialize)]
pub struct RecipeRef {
    #[serde(rename = "_id")]
    pub id: String,
}
