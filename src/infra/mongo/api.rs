use super::dates;
use super::types::{Recipe, RecipeRef, Review, ReviewUpdate};
use crate::infra::store::{RecipeStore, StoreError};
use chrono::{DateTime, Utc};
use log::debug;
use mongodb::{
    bson::{self, doc, Document},
    error::Error as mongoError,
    options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument},
    sync::{Client, Collection},
};

pub struct MongoRep {
    pub recipes: Collection<Recipe>,
}

impl MongoRep {
    pub fn init(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)?;
        let database = client.database(database);
        let rep = MongoRep {
            recipes: database.collection("recipes"),
        };
        return Ok(rep);
    }
}

/// The review as stored, with its timestamps as BSON dates.
fn review_document(review: &Review) -> Result<Document, StoreError> {
    let mut document = bson::to_document(review)?;
    document.insert("createdAt", dates::to_bson(review.created_at));
    document.insert("updatedAt", dates::to_bson(review.updated_at));
    Ok(document)
}

impl RecipeStore for MongoRep {
    fn find_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError> {
        Ok(self.recipes.find_one(doc! {"_id": recipe_id}, None)?)
    }

    fn find_review_owner(&self, review_id: &str) -> Result<Option<String>, StoreError> {
        let options = FindOneOptions::builder()
            .projection(doc! {"_id": 1})
            .build();
        let owner = self
            .recipes
            .clone_with_type::<RecipeRef>()
            .find_one(doc! {"reviews._id": review_id}, options)?;
        Ok(owner.map(|r| r.id))
    }

    fn push_review(
        &self,
        recipe_id: &str,
        review: &Review,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = self.recipes.update_one(
            doc! {"_id": recipe_id},
            doc! {
                "$push": {"reviews": review_document(review)?},
                "$set": {"updatedAt": dates::to_bson(at)},
            },
            None,
        )?;
        debug!("push review {} -> {:?}", review.id, result);
        Ok(result.matched_count > 0)
    }

    fn set_review(
        &self,
        review_id: &str,
        update: &ReviewUpdate,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = self.recipes.update_one(
            doc! {"reviews._id": review_id},
            doc! {
                "$set": {
                    "reviews.$.rating": i32::from(update.rating),
                    "reviews.$.comment": update.comment.as_str(),
                    "reviews.$.updatedAt": dates::to_bson(at),
                    "updatedAt": dates::to_bson(at),
                }
            },
            None,
        )?;
        debug!("set review {} -> {:?}", review_id, result);
        Ok(result.matched_count > 0)
    }

    fn pull_review(
        &self,
        recipe_id: &str,
        review_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = self.recipes.update_one(
            doc! {"_id": recipe_id, "reviews._id": review_id},
            doc! {
                "$pull": {"reviews": {"_id": review_id}},
                "$set": {"updatedAt": dates::to_bson(at)},
            },
            None,
        )?;
        debug!("pull review {} -> {:?}", review_id, result);
        Ok(result.matched_count > 0)
    }

    fn set_average_rating(&self, recipe_id: &str, average: f64) -> Result<bool, StoreError> {
        let result = self.recipes.update_one(
            doc! {"_id": recipe_id},
            doc! {"$set": {"averageRating": average}},
            None,
        )?;
        Ok(result.matched_count > 0)
    }

    fn set_description(
        &self,
        recipe_id: &str,
        description: &str,
        editor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Recipe>, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self.recipes.find_one_and_update(
            doc! {"_id": recipe_id},
            doc! {
                "$set": {
                    "description": description,
                    "lastEditedBy": editor,
                    "lastEditedAt": dates::to_bson(at),
                }
            },
            options,
        )?;
        Ok(updated)
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let cursor = self.recipes.find(None, None)?;
        Ok(cursor.collect::<Result<Vec<Recipe>, mongoError>>()?)
    }

    fn top_rated(&self, limit: i64) -> Result<Vec<Recipe>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! {"averageRating": -1})
            .limit(limit)
            .build();
        let cursor = self.recipes.find(None, options)?;
        Ok(cursor.collect::<Result<Vec<Recipe>, mongoError>>()?)
    }

    fn ingredient_names(&self) -> Result<Vec<String>, StoreError> {
        let pipeline = vec![
            doc! {"$project": {"ingredients": {"$objectToArray": "$ingredients"}}},
            doc! {"$unwind": "$ingredients"},
            doc! {"$group": {"_id": "$ingredients.k"}},
            doc! {"$project": {"_id": 0, "name": "$_id"}},
        ];
        let cursor = self.recipes.aggregate(pipeline, None)?;
        let docs = cursor.collect::<Result<Vec<Document>, mongoError>>()?;
        Ok(docs
            .iter()
            .filter_map(|d| d.get_str("name").ok())
            .map(String::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo(database: &str) -> MongoRep {
        MongoRep::init("mongodb://localhost:27017/", database).unwrap()
    }

    #[test]
    fn test_init_mongo_repo_passes() {
        init_repo("test");
    }

    #[test]
    fn test_review_document_stores_bson_dates() {
        let now = Utc::now();
        let review = Review {
            id: "v1".to_string(),
            user_id: "cook@example.com".to_string(),
            rating: 3,
            comment: "fine".to_string(),
            created_at: now,
            updated_at: now,
        };
        let document = review_document(&review).unwrap();
        assert!(document.get_datetime("createdAt").is_ok());
        assert!(document.get_datetime("updatedAt").is_ok());
        assert_eq!(document.get_i32("rating").unwrap(), 3);
        assert_eq!(document.get_str("_id").unwrap(), "v1");
    }

    #[test]
    #[ignore = "needs a local mongod"]
    fn test_push_review_to_missing_recipe_matches_nothing() {
        let mongo_rep = init_repo("recipes_test");
        let now = Utc::now();
        let review = Review {
            id: mongodb::bson::oid::ObjectId::new().to_hex(),
            user_id: "cook@example.com".to_string(),
            rating: 4,
            comment: "solid".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(!mongo_rep.push_review("no-such-recipe", &review, now).unwrap());
    }

    #[test]
    #[ignore = "needs a local mongod"]
    fn test_review_lifecycle_against_mongo() {
        let mongo_rep = init_repo("recipes_test");
        let recipe = Recipe::new(&mongodb::bson::oid::ObjectId::new().to_hex(), "pancakes");
        mongo_rep.recipes.insert_one(&recipe, None).unwrap();

        let now = Utc::now();
        let review = Review {
            id: mongodb::bson::oid::ObjectId::new().to_hex(),
            user_id: "cook@example.com".to_string(),
            rating: 2,
            comment: "dry".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(mongo_rep.push_review(&recipe.id, &review, now).unwrap());
        assert_eq!(
            mongo_rep.find_review_owner(&review.id).unwrap(),
            Some(recipe.id.clone())
        );

        let update = ReviewUpdate {
            rating: 5,
            comment: "better with butter".to_string(),
        };
        assert!(mongo_rep.set_review(&review.id, &update, now).unwrap());
        let stored = mongo_rep.find_recipe(&recipe.id).unwrap().unwrap();
        assert_eq!(stored.reviews[0].rating, 5);

        assert!(mongo_rep.pull_review(&recipe.id, &review.id, now).unwrap());
        assert!(!mongo_rep.pull_review(&recipe.id, &review.id, now).unwrap());
        let stored = mongo_rep.find_recipe(&recipe.id).unwrap().unwrap();
        assert!(stored.reviews.is_empty());

        mongo_rep
            .recipes
            .delete_one(doc! {"_id": recipe.id.as_str()}, None)
            .unwrap();
    }
}
