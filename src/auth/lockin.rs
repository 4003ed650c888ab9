use axum::{debug_handler, extract::{Path, Query, State}, response::Redirect};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    db::Db,
    session::{ProviderProfile, CSRF_STATE, PKCE_VERIFIER, PROFILE, RETURN_URL, USER_ID},
    users::store::{ensure_user, UpsertUser},
    AppError, AppResult, AppState,
};

use super::{clients::ClientProvider, userinfo, Clients};

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Path(provider): Path<ClientProvider>,
    Query(LockinQuery { state, code }): Query<LockinQuery>,
    State(db): State<Db>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Redirect> {
    let state = CsrfToken::new(state.ok_or_else(|| AppError::validation("OAuth: without state"))?);
    let code = AuthorizationCode::new(code.ok_or_else(|| AppError::validation("OAuth: without code"))?);

    let Some(stored_state) = session.remove::<String>(CSRF_STATE).await? else {
        return Err("no csrf_state".into());
    };

    if state.secret().as_str() != stored_state.as_str() {
        return Err(AppError::validation("csrf tokens don't match"));
    }

    let Some(pkce_verifier) = session.remove::<String>(PKCE_VERIFIER).await? else {
        return Err("no pkce_verifier".into());
    };

    let client = clients.get_client(provider)?;
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    let profile = userinfo::fetch_profile(&http_client, provider, token_result.access_token().secret()).await?;

    let user = ensure_user(&db, UpsertUser {
        auth_id: profile.auth_id.clone(),
        name: profile.name.clone().or_else(|| Some(userinfo::random_alias())),
        email: profile.email.clone(),
        image: profile.image.clone(),
        bio: None,
    }).await?;

    // a verified email already on file signs into that account
    let profile = ProviderProfile { auth_id: user.auth_id.clone(), ..profile };
    let return_url = session.remove::<String>(RETURN_URL).await?;

    session.cycle_id().await?;
    session.insert(USER_ID, &user.auth_id).await?;
    session.insert(PROFILE, &profile).await?;

    info!("welcome {} via {provider}", user.auth_id);

    Ok(Redirect::to(return_url.as_deref().unwrap_or("/")))
}
