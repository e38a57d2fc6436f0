use chrono::{DateTime, Utc};
use log::{debug, warn};
use rocket::response::status::Custom;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, patch, post, put, FromForm};
use rocket::{http::Status, State};
use serde::{Deserialize, Serialize};

use super::error::RepoError;
use super::mongo::types::{Recipe, Review, ReviewUpdate};
use super::recipes::{self, RecipeSort};
use super::reviews::{self, ReviewInput, SortOptions};
use super::session::SessionUser;
use super::store::Store;

pub type ApiError = Custom<Json<ErrorBody>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub recipe_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReview {
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub review_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditDescription {
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionUpdated {
    pub message: String,
    pub description: Option<String>,
    pub last_edited_by: Option<String>,
    pub last_edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromForm)]
pub struct ReviewSortQuery {
    #[field(name = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct RecipeSortQuery {
    #[field(name = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct ReviewTarget {
    #[field(name = "reviewId")]
    pub review_id: Option<String>,
}

fn reject(err: RepoError) -> ApiError {
    let status = err.status();
    reject_as(status, err)
}

fn reject_as(status: Status, err: RepoError) -> ApiError {
    warn!("{} -> {}", err, status);
    Custom(
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

/// Review edits only distinguish bad input from everything else.
fn reject_edit(err: RepoError) -> ApiError {
    match err {
        RepoError::Validation(_) => reject_as(Status::BadRequest, err),
        _ => reject_as(Status::InternalServerError, err),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, RepoError> {
    value.ok_or_else(|| RepoError::Validation(format!("{} is required", field)))
}

/// The session user, when there is one, wins over a `userId` in the body.
fn review_input(session: Option<SessionUser>, body: NewReview) -> Result<ReviewInput, RepoError> {
    Ok(ReviewInput {
        user_id: required(session.map(|s| s.0).or(body.user_id), "userId")?,
        rating: required(body.rating, "rating")?,
        comment: required(body.comment, "comment")?,
    })
}

fn review_update(body: EditReview) -> Result<ReviewUpdate, RepoError> {
    Ok(ReviewUpdate {
        rating: required(body.rating, "rating")?,
        comment: required(body.comment, "comment")?,
    })
}

/// Bodies that fail to parse, including ratings outside `u8`, are bad input.
fn read_body<T>(body: Result<Json<T>, json::Error<'_>>) -> Result<T, RepoError> {
    body.map(Json::into_inner).map_err(|e| {
        debug!("Unreadable request body: {:?}", e);
        RepoError::Validation("Invalid request body".to_string())
    })
}

fn message(text: &str) -> Json<Message> {
    Json(Message {
        message: text.to_string(),
    })
}

#[post("/recipes/<id>/reviews", data = "<body>")]
pub fn post_review(
    db: &State<Store>,
    session: Option<SessionUser>,
    id: &str,
    body: Result<Json<NewReview>, json::Error<'_>>,
) -> Result<Custom<Json<Review>>, ApiError> {
    let body = read_body(body).map_err(reject)?;
    debug!("New review on {}: {:?}", id, body);
    if id.trim().is_empty() {
        return Err(reject(RepoError::Validation(
            "Recipe ID is required".to_string(),
        )));
    }
    if body.recipe_id.as_deref().map_or(false, |r| r != id) {
        return Err(reject(RepoError::Validation(
            "recipeId does not match the route".to_string(),
        )));
    }
    let input = review_input(session, body).map_err(reject)?;

    match reviews::create_review(db.inner().as_ref(), input, id) {
        Ok(review) => Ok(Custom(Status::Created, Json(review))),
        Err(e) => Err(reject(e)),
    }
}

#[get("/recipes/<id>/reviews?<sort..>")]
pub fn get_reviews(
    db: &State<Store>,
    id: &str,
    sort: ReviewSortQuery,
) -> Result<Json<Vec<Review>>, ApiError> {
    if id.trim().is_empty() {
        return Err(reject(RepoError::Validation(
            "Recipe ID is required".to_string(),
        )));
    }
    let options = SortOptions::parse(
        sort.sort_by.as_deref().unwrap_or("date"),
        sort.order.as_deref().unwrap_or("desc"),
    );

    match reviews::get_recipe_reviews(db.inner().as_ref(), id, options) {
        Ok(reviews) => Ok(Json(reviews)),
        Err(e) => Err(reject(e)),
    }
}

#[put("/recipes/<id>/reviews?<target..>", data = "<body>")]
pub fn put_review(
    db: &State<Store>,
    id: &str,
    target: ReviewTarget,
    body: Result<Json<EditReview>, json::Error<'_>>,
) -> Result<Json<Message>, ApiError> {
    let mut body = read_body(body).map_err(reject)?;
    debug!("Edit review on {}: {:?}", id, body);
    let review_id = required(target.review_id.or(body.review_id.take()), "Review ID")
        .map_err(reject)?;
    let update = review_update(body).map_err(reject)?;

    match reviews::update_review(db.inner().as_ref(), &review_id, update) {
        Ok(()) => Ok(message("Review updated successfully")),
        Err(e) => Err(reject_edit(e)),
    }
}

#[delete("/recipes/<id>/reviews?<target..>")]
pub fn delete_review(
    db: &State<Store>,
    id: &str,
    target: ReviewTarget,
) -> Result<Json<Message>, ApiError> {
    debug!("Delete review on {}: {:?}", id, target);
    let review_id = required(target.review_id, "Review ID").map_err(reject)?;

    match reviews::delete_review(db.inner().as_ref(), &review_id) {
        Ok(()) => Ok(message("Review deleted successfully")),
        Err(e) => Err(reject_edit(e)),
    }
}

#[patch("/recipes/<id>/update", data = "<body>")]
pub fn patch_description(
    db: &State<Store>,
    session: Option<SessionUser>,
    id: &str,
    body: Result<Json<EditDescription>, json::Error<'_>>,
) -> Result<Json<DescriptionUpdated>, ApiError> {
    let editor = match session {
        Some(SessionUser(user)) => user,
        None => {
            return Err(Custom(
                Status::Unauthorized,
                Json(ErrorBody {
                    error: "Authentication required".to_string(),
                }),
            ))
        }
    };
    let body = read_body(body).map_err(reject)?;
    let description = body.description.unwrap_or_default();

    match recipes::update_description(db.inner().as_ref(), id, &description, &editor) {
        Ok(recipe) => Ok(Json(DescriptionUpdated {
            message: "Recipe updated successfully".to_string(),
            description: recipe.description,
            last_edited_by: recipe.last_edited_by,
            last_edited_at: recipe.last_edited_at,
        })),
        Err(e) => Err(reject(e)),
    }
}

#[get("/recipes?<sort..>")]
pub fn get_recipes(db: &State<Store>, sort: RecipeSortQuery) -> Result<Json<Vec<Recipe>>, ApiError> {
    let key = RecipeSort::parse(sort.sort_by.as_deref().unwrap_or(""));
    let order = sort.order.as_deref().unwrap_or("descending");

    match recipes::list_recipes(db.inner().as_ref(), key, order) {
        Ok(recipes) => Ok(Json(recipes)),
        Err(e) => Err(reject(e)),
    }
}

#[get("/recipes/recommendations?<limit>")]
pub fn get_recommendations(
    db: &State<Store>,
    limit: Option<i64>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    match recipes::recommendations(db.inner().as_ref(), limit) {
        Ok(recipes) => Ok(Json(recipes)),
        Err(e) => Err(reject(e)),
    }
}

#[get("/recipes/ingredients")]
pub fn get_ingredients(db: &State<Store>) -> Result<Json<Vec<String>>, ApiError> {
    match recipes::ingredient_names(db.inner().as_ref()) {
        Ok(names) => Ok(Json(names)),
        Err(e) => Err(reject(e)),
    }
}
