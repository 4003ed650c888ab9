use rand::seq::IndexedRandom;
use serde::Deserialize;
use serde_json::Value;

use crate::{session::ProviderProfile, AppError, AppResult, GetField};

use super::clients::ClientProvider;

const GOOGLE_USERINFO: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GITHUB_USER: &str = "https://api.github.com/user";
const GITHUB_EMAILS: &str = "https://api.github.com/user/emails";
const USER_AGENT: &str = concat!("layerzero/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

pub(crate) async fn fetch_profile(
    http_client: &reqwest::Client,
    provider: ClientProvider,
    access_token: &str,
) -> AppResult<ProviderProfile> {
    let get = |url: &str| {
        http_client
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    };

    match provider {
        ClientProvider::Google => {
            let body: Value = get(GOOGLE_USERINFO).send().await?.error_for_status()?.json().await?;
            profile_from_google(&body)
        }
        ClientProvider::Github => {
            let body: Value = get(GITHUB_USER).send().await?.error_for_status()?.json().await?;
            // the public profile email is not necessarily verified
            let emails: Vec<GithubEmail> = get(GITHUB_EMAILS).send().await?.error_for_status()?.json().await?;
            profile_from_github(&body, verified_github_email(emails))
        }
    }
}

fn verified_github_email(emails: Vec<GithubEmail>) -> Option<String> {
    emails
        .into_iter()
        .filter(|e| e.verified)
        .max_by_key(|e| e.primary)
        .map(|e| e.email)
}

fn profile_from_google(body: &Value) -> AppResult<ProviderProfile> {
    if body.get("verified_email").and_then(Value::as_bool) != Some(true) {
        return Err(AppError::validation("Google account email is not verified"));
    }

    Ok(ProviderProfile {
        auth_id: format!("google:{}", body.get_str_field("id")?),
        name: optional_str(body, "name"),
        email: body.get_str_field("email")?,
        image: optional_str(body, "picture"),
    })
}

fn profile_from_github(body: &Value, email: Option<String>) -> AppResult<ProviderProfile> {
    // numeric on the wire
    let id = body
        .get_obj_field("id")?
        .as_u64()
        .ok_or(format!("expected numeric id in {body}"))?;
    let email = email.ok_or_else(|| AppError::validation("GitHub account has no verified email"))?;

    Ok(ProviderProfile {
        auth_id: format!("github:{id}"),
        name: optional_str(body, "name").or_else(|| optional_str(body, "login")),
        email,
        image: optional_str(body, "avatar_url"),
    })
}

fn optional_str(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Display name for accounts whose provider gave none.
pub(crate) fn random_alias() -> String {
    let adjectives = [
        "Quick", "Quiet", "Curious", "Jolly", "Brave", "Sleepy", "Witty", "Fierce",
        "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Sunny",
        "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Lucky",
    ];
    let nouns = [
        "Fox", "Bear", "Eagle", "Wolf", "Otter", "Tiger", "Heron", "Owl", "Rabbit",
        "Falcon", "Badger", "Panda", "Lynx", "Moose", "Phoenix", "Turtle", "Dolphin",
        "Whale", "Gecko", "Zebra",
    ];

    let mut rng = rand::rng();
    format!(
        "{} {}",
        adjectives.choose(&mut rng).copied().unwrap_or("Nameless"),
        nouns.choose(&mut rng).copied().unwrap_or("User"),
    )
}
