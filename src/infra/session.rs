use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use super::config::Config;

/// The signed-in user's stable identifier (their email), as vouched for by
/// the authentication layer in front of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let header = match request.rocket().state::<Config>() {
            Some(config) => config.session_header.clone(),
            None => Config::default().session_header,
        };
        match request
            .headers()
            .get_one(&header)
            .map(str::trim)
            .filter(|user| !user.is_empty())
        {
            Some(user) => Outcome::Success(SessionUser(user.to_string())),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}
