use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use log::info;

use super::mongo::types::Recipe;
use super::error::{store_error, RepoError};
use super::store::RecipeStore;

pub const DEFAULT_RECOMMENDATIONS: i64 = 10;
pub const MAX_RECOMMENDATIONS: i64 = 50;

/// Keys for ordering whole recipes. Kept apart from the review sort on
/// purpose: the two key sets share nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecipeSort {
    Newest,
    PrepTime,
    CookTime,
    Steps,
    Unsorted,
}

impl RecipeSort {
    pub fn parse(key: &str) -> Self {
        match key {
            "newest" => RecipeSort::Newest,
            "prepTime" => RecipeSort::PrepTime,
            "cookTime" => RecipeSort::CookTime,
            "steps" => RecipeSort::Steps,
            _ => RecipeSort::Unsorted,
        }
    }
}

/// `newest` always puts the latest `published` first; the other keys are
/// ascending only for `ascending`.
pub fn sort_recipes(mut recipes: Vec<Recipe>, key: RecipeSort, order: &str) -> Vec<Recipe> {
    let ascending = order == "ascending";
    let directed = |ord: Ordering| if ascending { ord } else { ord.reverse() };
    match key {
        RecipeSort::Newest => {
            let published = |r: &Recipe| r.published.unwrap_or(DateTime::<Utc>::MIN_UTC);
            recipes.sort_by(|a, b| published(b).cmp(&published(a)));
        }
        RecipeSort::PrepTime => {
            recipes.sort_by(|a, b| directed(a.prep.unwrap_or(0).cmp(&b.prep.unwrap_or(0))))
        }
        RecipeSort::CookTime => {
            recipes.sort_by(|a, b| directed(a.cook.unwrap_or(0).cmp(&b.cook.unwrap_or(0))))
        }
        RecipeSort::Steps => recipes
            .sort_by(|a, b| directed(a.instructions.len().cmp(&b.instructions.len()))),
        RecipeSort::Unsorted => {}
    }
    recipes
}

pub fn list_recipes(
    store: &dyn RecipeStore,
    key: RecipeSort,
    order: &str,
) -> Result<Vec<Recipe>, RepoError> {
    let recipes = store
        .list_recipes()
        .map_err(store_error("listing recipes"))?;
    Ok(sort_recipes(recipes, key, order))
}

pub fn recommendations(
    store: &dyn RecipeStore,
    limit: Option<i64>,
) -> Result<Vec<Recipe>, RepoError> {
    let limit = limit
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS);
    store.top_rated(limit).map_err(store_error("fetching recommendations"))
}

pub fn ingredient_names(store: &dyn RecipeStore) -> Result<Vec<String>, RepoError> {
    let mut names = store
        .ingredient_names()
        .map_err(store_error("fetching ingredients"))?;
    names.sort();
    names.dedup();
    Ok(names)
}

/// Stores the trimmed description together with who edited it and when.
pub fn update_description(
    store: &dyn RecipeStore,
    recipe_id: &str,
    description: &str,
    editor: &str,
) -> Result<Recipe, RepoError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(RepoError::Validation(
            "Description is required".to_string(),
        ));
    }
    let recipe = store
        .set_description(recipe_id, description, editor, Utc::now())
        .map_err(store_error("updating recipe"))?
        .ok_or(RepoError::NotFound("Recipe"))?;
    info!("Recipe {} description edited by {}", recipe_id, editor);
    Ok(recipe)
}
