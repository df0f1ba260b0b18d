use actix_session::{Session, SessionExt};
use actix_web::{dev, guard, FromRequest, HttpRequest};
use serde::Serialize;
use std::env;
use std::future::{ready, Ready as StdReady};

use crate::models::authority;

#[derive(Serialize)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        if let (Ok(Some(username)), Ok(Some(role))) = (session.get("username"), session.get("role"))
        {
            ready(Ok(AuthenticatedUser { username, role }))
        } else {
            ready(Err(actix_web::error::ErrorUnauthorized("Not logged in.")))
        }
    }
}

fn session_role(session: &Session) -> Option<String> {
    session.get::<String>("role").unwrap_or(None)
}

/// Any logged-in account whose role the party recognises. Custom display
/// roles parse to nothing and are kept out of the member workspace.
pub fn member_guard(session: &Session) -> bool {
    session_role(session)
        .map(|r| authority::Role::parse(&r).is_some())
        .unwrap_or(false)
}

/// Entry check for the management portal. Individual actions still verify
/// their own capability against the acting profile.
pub fn staff_guard(session: &Session) -> bool {
    session_role(session)
        .map(|r| authority::is_staff(&r))
        .unwrap_or(false)
}

/// Restricts the management login to an allow-list of source IPs, honouring
/// X-Forwarded-For when the server sits behind a reverse proxy.
pub fn ip_guard(ctx: &guard::GuardContext) -> bool {
    let allowed_ips_str = match env::var("ADMIN_LOGIN_ACCEPT_IP") {
        Ok(val) => val,
        Err(_) => {
            log::warn!("ADMIN_LOGIN_ACCEPT_IP is not set. Denying all management login attempts.");
            return false;
        }
    };

    if allowed_ips_str.trim() == "*" {
        return true;
    }

    let request_ip = ctx
        .head()
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| ctx.head().peer_addr.map(|addr| addr.ip().to_string()));

    let peer_addr = match request_ip {
        Some(ip) => ip,
        None => {
            log::warn!("Could not determine peer IP address for management login attempt.");
            return false;
        }
    };

    let is_allowed = allowed_ips_str.split(',').any(|ip| ip.trim() == peer_addr);

    if !is_allowed {
        log::warn!(
            "Blocked management login attempt from unauthorized IP: {}",
            peer_addr
        );
    }

    is_allowed
}
