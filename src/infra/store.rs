//! The document store as seen by the repositories.
//!
//! Every mutating method is a single conditional update on one recipe
//! document, so appends, in-place edits and removals of embedded reviews are
//! atomic per recipe. Nothing here spans more than one document.

use chrono::{DateTime, Utc};
use mongodb::error::Error as mongoError;
use thiserror::Error;

use super::mongo::types::{Recipe, Review, ReviewUpdate};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("error querying value: {0}")]
    QueryError(#[from] mongoError),
    #[error("error encoding document: {0}")]
    EncodeError(#[from] mongodb::bson::ser::Error),
}

pub trait RecipeStore: Send + Sync {
    fn find_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError>;

    /// Identifier of the recipe whose review list holds `review_id`.
    fn find_review_owner(&self, review_id: &str) -> Result<Option<String>, StoreError>;

    /// Appends `review` and bumps `updatedAt`. `false` when no recipe matched.
    fn push_review(
        &self,
        recipe_id: &str,
        review: &Review,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Rewrites the review in place and bumps the parent's `updatedAt`.
    /// `false` when no recipe holds the review.
    fn set_review(
        &self,
        review_id: &str,
        update: &ReviewUpdate,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Removes the review from `recipe_id`. `false` when that recipe does not
    /// hold it.
    fn pull_review(
        &self,
        recipe_id: &str,
        review_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    fn set_average_rating(&self, recipe_id: &str, average: f64) -> Result<bool, StoreError>;

    /// Sets the description and edit stamp, returning the updated document.
    fn set_description(
        &self,
        recipe_id: &str,
        description: &str,
        editor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Recipe>, StoreError>;

    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Recipes ordered by `averageRating`, highest first.
    fn top_rated(&self, limit: i64) -> Result<Vec<Recipe>, StoreError>;

    /// Distinct ingredient names across all recipes, in no particular order.
    fn ingredient_names(&self) -> Result<Vec<String>, StoreError>;
}

pub type Store = Box<dyn RecipeStore>;
