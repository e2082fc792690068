use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginForm, PublicUser, RefreshRequest, RegisterForm, RequestResetForm,
            ResetPasswordForm,
        },
        jwt::{JwtKeys, MaybeUser},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{ApiError, FieldErrors},
    state::AppState,
};

const LOGIN_FAILED: &str = "Login unsuccessful, please try again";
const INVALID_RESET_TOKEN: &str = "That is an invalid or expired token";

/// The signature only proves who a reset token was minted for. To be honored
/// it must also still be the outstanding one and unexpired: changing the
/// password clears the stored token, which kills any link mailed out before.
fn reset_token_still_current(
    stored: Option<&str>,
    stored_expiry: Option<OffsetDateTime>,
    presented: &str,
    now: OffsetDateTime,
) -> bool {
    stored == Some(presented) && stored_expiry.map(|t| t > now).unwrap_or(false)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Json(form): Json<RegisterForm>,
) -> Result<Response, ApiError> {
    // Already-authenticated callers go back to the feed.
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut errors = form.validate();
    if errors.get("fullname").is_none()
        && User::find_by_fullname(&state.db, &form.fullname).await?.is_some()
    {
        warn!(fullname = %form.fullname, "fullname already taken");
        errors.push("fullname", "That name already exists. Please enter another.");
    }
    if errors.get("email").is_none()
        && User::find_by_email(&state.db, &form.email).await?.is_some()
    {
        warn!(email = %form.email, "email already registered");
        errors.push(
            "email",
            "That email address already exists. Please enter another.",
        );
    }
    errors.into_result()?;

    let hash = hash_password(&form.password)?;
    let user = User::create(&state.db, &form.fullname, &form.email, &hash).await?;

    // No auto-login: the client is expected to go through /login next.
    info!(user_id = %user.id, fullname = %user.fullname, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": format!(
                "Hi {}, your account is now set up and you may log in.",
                user.fullname
            ),
        })),
    )
        .into_response())
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Json(form): Json<LoginForm>,
) -> Result<Response, ApiError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    form.validate().into_result()?;

    // One generic failure message for both unknown email and bad password,
    // so the response never reveals whether the account exists.
    let user = match User::find_by_email(&state.db, &form.email).await? {
        Some(u) => u,
        None => {
            warn!("login with unknown email");
            return Err(ApiError::Unauthorized(LOGIN_FAILED.into()));
        }
    };

    if !verify_password(&form.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized(LOGIN_FAILED.into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = if form.remember {
        Some(keys.sign_refresh(user.id)?)
    } else {
        None
    };

    info!(user_id = %user.id, remember = form.remember, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
        },
    })
    .into_response())
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token: Some(refresh_token),
        user: PublicUser {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
        },
    }))
}

/// Tokens are stateless, so logout is just the client discarding them;
/// the route exists to send the caller back to the feed.
pub async fn logout() -> Redirect {
    Redirect::to("/")
}

#[instrument(skip(state, form))]
pub async fn reset_request(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Json(form): Json<RequestResetForm>,
) -> Result<Response, ApiError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    form.validate().into_result()?;

    let Some(user) = User::find_by_email(&state.db, &form.email).await? else {
        let mut errors = FieldErrors::new();
        errors.push(
            "email",
            "There is no account with that email. You must register first.",
        );
        return Err(ApiError::Validation(errors));
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_reset(user.id)?;
    let expires_at = OffsetDateTime::now_utc()
        + TimeDuration::minutes(state.config.jwt.reset_ttl_minutes);
    User::set_reset_token(&state.db, user.id, &token, expires_at).await?;

    let reset_url = format!("{}/reset_password/{}", state.config.public_base_url, token);
    state.mailer.send_password_reset(&user.email, &reset_url).await?;

    info!(user_id = %user.id, "password reset email sent");
    Ok(Json(serde_json::json!({
        "message": "An email has been sent with instructions to reset your password.",
    }))
    .into_response())
}

#[instrument(skip(state, token, form))]
pub async fn reset_confirm(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Path(token): Path<String>,
    Json(form): Json<ResetPasswordForm>,
) -> Result<Response, ApiError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let keys = JwtKeys::from_ref(&state);
    let claims = match keys.verify_reset(&token) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "reset token rejected");
            return Err(ApiError::BadRequest(INVALID_RESET_TOKEN.into()));
        }
    };

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::BadRequest(INVALID_RESET_TOKEN.to_string()))?;

    if !reset_token_still_current(
        user.reset_token.as_deref(),
        user.reset_token_expires_at,
        &token,
        OffsetDateTime::now_utc(),
    ) {
        warn!(user_id = %user.id, "stale reset token");
        return Err(ApiError::BadRequest(INVALID_RESET_TOKEN.into()));
    }

    form.validate().into_result()?;

    let hash = hash_password(&form.password)?;
    User::set_password_and_clear_token(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(serde_json::json!({
        "message": "Your password has been updated! You are now able to log in.",
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_token_lifecycle() {
        let now = OffsetDateTime::now_utc();
        let soon = now + TimeDuration::minutes(30);
        let past = now - TimeDuration::minutes(1);

        // (stored token, stored expiry, presented token, accepted)
        let cases = [
            (Some("tok"), Some(soon), "tok", true),
            // cleared after a completed password change
            (None, None, "tok", false),
            // replaced by a newer request
            (Some("newer"), Some(soon), "tok", false),
            // expired even though it is still the stored one
            (Some("tok"), Some(past), "tok", false),
            // stored but expiry never recorded
            (Some("tok"), None, "tok", false),
        ];
        for (stored, expiry, presented, accepted) in cases {
            assert_eq!(
                reset_token_still_current(stored, expiry, presented, now),
                accepted,
                "stored={stored:?} expiry={expiry:?} presented={presented:?}"
            );
        }
    }
}
