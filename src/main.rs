mod infra;
use infra::*;
use log::info;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use thiserror::Error;

#[macro_use]
extern crate rocket;
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Attaching CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[derive(Error, Debug)]
enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot open recipe store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rocket(#[from] rocket::Error),
}

fn build(store: Store, config: Config) -> Rocket<Build> {
    rocket::build()
        .manage(store)
        .manage(config)
        .mount(
            "/",
            routes![
                post_review,
                get_reviews,
                put_review,
                delete_review,
                patch_description,
                get_recipes,
                get_recommendations,
                get_ingredients
            ],
        )
        .attach(CORS)
}

#[rocket::main]
async fn main() -> Result<(), LaunchError> {
    let config = Config::load()?;
    let db = MongoRep::init(&config.mongo_uri, &config.database)?;
    info!("Using database {} at {}", config.database, config.mongo_uri);
    let _rocket = build(Box::new(db), config).launch().await?;
    Ok(())
}
