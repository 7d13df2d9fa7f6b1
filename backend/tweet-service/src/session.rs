/// Session provider
///
/// Bearer tokens are issued by the external identity provider and verified
/// here (HS256). Requests without an `Authorization` header proceed
/// anonymously; a header carrying a bad token is rejected with 401.
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Token claims accepted by this service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// The authenticated user a write is performed on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: Option<String>,
}

impl Actor {
    pub fn new(id: Uuid) -> Self {
        Self { id, username: None }
    }
}

/// Verifies bearer tokens against the shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> ServiceResult<Actor> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ServiceError::Unauthenticated
        })?;

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| ServiceError::Unauthenticated)?;

        Ok(Actor {
            id,
            username: data.claims.username,
        })
    }
}

/// Actix middleware that resolves the optional session into request extensions.
#[derive(Clone)]
pub struct SessionMiddleware {
    verifier: Arc<TokenVerifier>,
}

impl SessionMiddleware {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            verifier: Arc::new(TokenVerifier::new(secret)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().map(str::to_string));

            match header {
                None => {}
                Some(Ok(value)) => {
                    let token = value
                        .strip_prefix("Bearer ")
                        .ok_or(ServiceError::Unauthenticated)?;
                    let actor = verifier.verify(token.trim())?;
                    req.extensions_mut().insert(actor);
                }
                Some(Err(_)) => return Err(ServiceError::Unauthenticated.into()),
            }

            service.call(req).await
        })
    }
}

/// The caller's session, anonymous when no token was presented.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Actor>);

impl CurrentUser {
    /// The actor, or `Unauthenticated` for anonymous callers.
    pub fn require(&self) -> ServiceResult<&Actor> {
        self.0.as_ref().ok_or(ServiceError::Unauthenticated)
    }

    pub fn viewer_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|a| a.id)
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(CurrentUser(req.extensions().get::<Actor>().cloned())))
    }
}
