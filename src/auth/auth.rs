use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use super::jwt::{Claims, verify_token};
use crate::config::Config;
use crate::error::{LeaveError, LeaveResult};
use crate::model::{actor::Actor, role::Role};

/// Caller identity taken from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Option<Self> {
        Some(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role: Role::from_id(claims.role)?,
            employee_id: claims.employee_id,
        })
    }

    /// The employee acting in leave operations.
    pub fn actor(&self) -> LeaveResult<Actor> {
        self.employee_id
            .map(|employee_id| Actor::new(employee_id, self.role))
            .ok_or_else(|| LeaveError::NotPermitted("this account is not linked to an employee".into()))
    }

    /// Reports and sprint administration.
    pub fn require_planner(&self) -> LeaveResult<()> {
        if matches!(self.role, Role::Admin | Role::Hr | Role::Ceo) {
            Ok(())
        } else {
            Err(LeaveError::NotPermitted("HR, CEO or Admin only".into()))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        match AuthUser::from_claims(claims) {
            Some(user) => ready(Ok(user)),
            None => ready(Err(ErrorUnauthorized("Invalid role"))),
        }
    }
}
