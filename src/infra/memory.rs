//! An in-memory `RecipeStore` for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::mongo::types::{Recipe, Review, ReviewUpdate};
use super::store::{RecipeStore, StoreError};

/// Recipes held in a vector behind one lock; every call is one critical
/// section, mirroring the per-document atomicity of the real store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    recipes: Mutex<Vec<Recipe>>,
}

impl MemoryStore {
    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        MemoryStore {
            recipes: Mutex::new(recipes),
        }
    }

    pub fn snapshot(&self) -> Vec<Recipe> {
        self.lock().clone()
    }

    // A panicking test thread must not hide the data from the assertions.
    fn lock(&self) -> MutexGuard<'_, Vec<Recipe>> {
        self.recipes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Recipe {
    pub fn new(id: &str, title: &str) -> Self {
        let now = Utc::now();
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            ingredients: BTreeMap::new(),
            instructions: Vec::new(),
            prep: None,
            cook: None,
            servings: None,
            images: Vec::new(),
            published: None,
            reviews: Vec::new(),
            average_rating: 0.0,
            created_at: Some(now),
            updated_at: Some(now),
            last_edited_by: None,
            last_edited_at: None,
        }
    }
}

impl RecipeStore for MemoryStore {
    fn find_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError> {
        Ok(self.lock().iter().find(|r| r.id == recipe_id).cloned())
    }

    fn find_review_owner(&self, review_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .find(|r| r.reviews.iter().any(|rv| rv.id == review_id))
            .map(|r| r.id.clone()))
    }

    fn push_review(
        &self,
        recipe_id: &str,
        review: &Review,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut recipes = self.lock();
        match recipes.iter_mut().find(|r| r.id == recipe_id) {
            Some(recipe) => {
                recipe.reviews.push(review.clone());
                recipe.updated_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_review(
        &self,
        review_id: &str,
        update: &ReviewUpdate,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut recipes = self.lock();
        for recipe in recipes.iter_mut() {
            if let Some(review) = recipe.reviews.iter_mut().find(|r| r.id == review_id) {
                review.rating = update.rating;
                review.comment = update.comment.clone();
                review.updated_at = at;
                recipe.updated_at = Some(at);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn pull_review(
        &self,
        recipe_id: &str,
        review_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut recipes = self.lock();
        let holder = recipes
            .iter_mut()
            .find(|r| r.id == recipe_id && r.reviews.iter().any(|v| v.id == review_id));
        match holder {
            Some(recipe) => {
                recipe.reviews.retain(|r| r.id != review_id);
                recipe.updated_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_average_rating(&self, recipe_id: &str, average: f64) -> Result<bool, StoreError> {
        let mut recipes = self.lock();
        match recipes.iter_mut().find(|r| r.id == recipe_id) {
            Some(recipe) => {
                recipe.average_rating = average;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_description(
        &self,
        recipe_id: &str,
        description: &str,
        editor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Recipe>, StoreError> {
        let mut recipes = self.lock();
        Ok(recipes.iter_mut().find(|r| r.id == recipe_id).map(|recipe| {
            recipe.description = Some(description.to_string());
            recipe.last_edited_by = Some(editor.to_string());
            recipe.last_edited_at = Some(at);
            recipe.clone()
        }))
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.lock().clone())
    }

    fn top_rated(&self, limit: i64) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = self.lock().clone();
        recipes.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
        recipes.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(recipes)
    }

    fn ingredient_names(&self) -> Result<Vec<String>, StoreError> {
        let names: BTreeSet<String> = self
            .lock()
            .iter()
            .flat_map(|r| r.ingredients.keys().cloned())
            .collect();
        Ok(names.into_iter().collect())
    }
}
