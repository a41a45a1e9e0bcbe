//! Anonymous browser sessions carried in a signed cookie.
//!
//! The middleware resolves the caller's [`SessionId`] from the
//! `kushlbot_session` cookie, or mints a new one and sets the cookie on the
//! response. Handlers read the id from request extensions.

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use kushlbot_infra::crypto::session_token::SessionSigner;
use kushlbot_types::identity::SessionId;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "kushlbot_session";

/// Attach a [`SessionId`] to every request, issuing a cookie when needed.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = session_from_headers(request.headers(), &state.signer);
    let issued = existing.is_none();
    let session = existing.unwrap_or_else(SessionId::generate);

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if issued {
        let cookie = session_cookie(
            &state.signer.sign(&session),
            state.config.server.session_ttl_days,
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
                tracing::debug!("Issued new browser session");
            }
            Err(e) => tracing::warn!("Could not encode session cookie: {e}"),
        }
    }

    response
}

/// First session id in the `Cookie` headers whose signature verifies.
fn session_from_headers(headers: &HeaderMap, signer: &SessionSigner) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .find_map(|(_, token)| signer.verify(token.trim_matches('"')))
}

fn session_cookie(token: &str, ttl_days: u32) -> String {
    let max_age = u64::from(ttl_days) * 24 * 60 * 60;
    format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn signer() -> SessionSigner {
        SessionSigner::new(&SecretString::from("cookie-test-key")).unwrap()
    }

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(COOKIE, HeaderValue::from_str(c).unwrap());
        }
        map
    }

    #[test]
    fn finds_signed_session_among_other_cookies() {
        let signer = signer();
        let session = SessionId::generate();
        let token = signer.sign(&session);

        let map = headers(&[&format!("theme=dark; {SESSION_COOKIE}={token}; lang=en")]);
        assert_eq!(session_from_headers(&map, &signer), Some(session));
    }

    #[test]
    fn searches_every_cookie_header() {
        let signer = signer();
        let session = SessionId::generate();
        let token = signer.sign(&session);

        let map = headers(&["theme=dark", &format!("{SESSION_COOKIE}={token}")]);
        assert_eq!(session_from_headers(&map, &signer), Some(session));
    }

    #[test]
    fn rejects_forged_session() {
        let signer = signer();
        let forged = format!("{SESSION_COOKIE}={}.deadbeef", SessionId::generate());
        assert!(session_from_headers(&headers(&[&forged]), &signer).is_none());
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert!(session_from_headers(&HeaderMap::new(), &signer()).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("abc.def", 31);
        assert!(cookie.starts_with("kushlbot_session=abc.def;"));
        assert!(cookie.contains("Max-Age=2678400"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }
}
