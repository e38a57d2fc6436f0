//! Reviews embedded in recipe documents, and the average rating derived
//! from them.
//!
//! Each mutation is one atomic update on the owning recipe followed by a
//! separate recompute of `averageRating` that re-reads the review list. Two
//! concurrent rating changes on the same recipe can still interleave between
//! those two steps and leave the average one write behind; no locking is
//! attempted.

use std::cmp::Ordering;

use chrono::Utc;
use log::{debug, info, warn};
use mongodb::bson::oid::ObjectId;

use super::error::{store_error, RepoError};
use super::mongo::types::{Review, ReviewUpdate};
use super::store::RecipeStore;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewInput {
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortBy {
    Rating,
    Date,
    /// Anything else; keeps stored order.
    Unsorted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SortOptions {
    pub sort_by: SortBy,
    pub order: SortOrder,
}

impl SortOptions {
    /// Case-insensitive; any order other than `asc` is descending.
    pub fn parse(sort_by: &str, order: &str) -> Self {
        let sort_by = match sort_by.to_lowercase().as_str() {
            "rating" => SortBy::Rating,
            "date" => SortBy::Date,
            _ => SortBy::Unsorted,
        };
        let order = if order.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };
        SortOptions { sort_by, order }
    }
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            sort_by: SortBy::Date,
            order: SortOrder::Desc,
        }
    }
}

fn validate(rating: u8, comment: &str) -> Result<(), RepoError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(RepoError::Validation(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )));
    }
    if comment.trim().is_empty() {
        return Err(RepoError::Validation("comment is required".to_string()));
    }
    Ok(())
}

pub fn create_review(
    store: &dyn RecipeStore,
    input: ReviewInput,
    recipe_id: &str,
) -> Result<Review, RepoError> {
    validate(input.rating, &input.comment)?;
    if input.user_id.trim().is_empty() {
        return Err(RepoError::Validation("userId is required".to_string()));
    }

    store
        .find_recipe(recipe_id)
        .map_err(store_error("creating review"))?
        .ok_or(RepoError::NotFound("Recipe"))?;

    let now = Utc::now();
    let review = Review {
        id: ObjectId::new().to_hex(),
        user_id: input.user_id,
        rating: input.rating,
        comment: input.comment,
        created_at: now,
        updated_at: now,
    };

    // The recipe may have been deleted since the lookup above.
    if !store
        .push_review(recipe_id, &review, now)
        .map_err(store_error("creating review"))?
    {
        return Err(RepoError::NotFound("Recipe"));
    }
    info!("Created review {} on recipe {}", review.id, recipe_id);

    update_average_rating(store, recipe_id)?;
    Ok(review)
}

pub fn update_review(
    store: &dyn RecipeStore,
    review_id: &str,
    update: ReviewUpdate,
) -> Result<(), RepoError> {
    validate(update.rating, &update.comment)?;

    let now = Utc::now();
    if !store
        .set_review(review_id, &update, now)
        .map_err(store_error("updating review"))?
    {
        return Err(RepoError::NotFound("Review"));
    }
    info!("Updated review {}", review_id);

    match store
        .find_review_owner(review_id)
        .map_err(store_error("updating review"))?
    {
        Some(recipe_id) => update_average_rating(store, &recipe_id),
        None => {
            warn!("Review {} vanished before its rating was recomputed", review_id);
            Ok(())
        }
    }
}

pub fn delete_review(store: &dyn RecipeStore, review_id: &str) -> Result<(), RepoError> {
    let recipe_id = store
        .find_review_owner(review_id)
        .map_err(store_error("deleting review"))?
        .ok_or(RepoError::NotFound("Review"))?;

    // Someone else may have removed it since the owner lookup.
    if !store
        .pull_review(&recipe_id, review_id, Utc::now())
        .map_err(store_error("deleting review"))?
    {
        return Err(RepoError::NotFound("Review"));
    }
    info!("Deleted review {} from recipe {}", review_id, recipe_id);

    update_average_rating(store, &recipe_id)
}

pub fn get_recipe_reviews(
    store: &dyn RecipeStore,
    recipe_id: &str,
    options: SortOptions,
) -> Result<Vec<Review>, RepoError> {
    let recipe = store
        .find_recipe(recipe_id)
        .map_err(store_error("getting recipe reviews"))?
        .ok_or(RepoError::NotFound("Recipe"))?;
    Ok(sort_reviews(recipe.reviews, options))
}

/// Stable, so equal keys keep their stored relative order in either
/// direction.
pub fn sort_reviews(mut reviews: Vec<Review>, options: SortOptions) -> Vec<Review> {
    let key: fn(&Review, &Review) -> Ordering = match options.sort_by {
        SortBy::Rating => |a, b| a.rating.cmp(&b.rating),
        SortBy::Date => |a, b| a.created_at.cmp(&b.created_at),
        SortBy::Unsorted => return reviews,
    };
    match options.order {
        SortOrder::Asc => reviews.sort_by(key),
        SortOrder::Desc => reviews.sort_by(|a, b| key(b, a)),
    }
    reviews
}

/// Mean of the ratings rounded to one decimal place, `0` for no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(total) / reviews.len() as f64;
    (mean * 10.0).round() / 10.0
}

pub(crate) fn update_average_rating(
    store: &dyn RecipeStore,
    recipe_id: &str,
) -> Result<(), RepoError> {
    let recipe = match store
        .find_recipe(recipe_id)
        .map_err(store_error("updating average rating"))?
    {
        Some(recipe) => recipe,
        None => {
            warn!("Recipe {} vanished before its rating was recomputed", recipe_id);
            return Ok(());
        }
    };

    let average = average_rating(&recipe.reviews);
    store
        .set_average_rating(recipe_id, average)
        .map_err(store_error("updating average rating"))?;
    debug!(
        "Recipe {} average rating {} over {} reviews",
        recipe_id,
        average,
        recipe.reviews.len()
    );
    Ok(())
}
