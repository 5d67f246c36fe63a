use super::csrf::{get_or_create_csrf_token, intent_token, verify_intent_token, Intent, TokenCheck};
use crate::error::AppError;
use crate::principal::Principal;
use crate::session::principal_from_session;
use actix_session::Session;
use actix_web::dev::{
    self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;

/// Who is making the request, resolved once by [`ClientCtx`] middleware.
#[derive(Clone, Debug, Default)]
pub struct RequestIdentity {
    /// `None` for guests.
    pub principal: Option<Principal>,
    /// Session secret behind every intent token. Empty when the session
    /// could not be written, in which case no token verifies.
    pub csrf_secret: String,
}

impl RequestIdentity {
    pub async fn resolve(session: &Session, db: &DatabaseConnection) -> Self {
        let principal = principal_from_session(session, db).await;
        let csrf_secret = match get_or_create_csrf_token(session) {
            Ok(secret) => secret,
            Err(e) => {
                log::error!("csrf secret unavailable for this request: {}", e);
                String::new()
            }
        };

        RequestIdentity {
            principal,
            csrf_secret,
        }
    }
}

/// Extractor and middleware in one: wrap the app with `ClientCtx::default()`
/// and take `client: ClientCtx` in handlers.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<RequestIdentity>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(RequestIdentity::default()))
    }
}

impl ClientCtx {
    /// Identity stored by the middleware, or a guest when the request
    /// bypassed it.
    fn from_extensions(extensions: &mut Extensions) -> Self {
        if let Some(identity) = extensions.get::<Data<RequestIdentity>>() {
            return Self(identity.clone());
        }
        let guest = Data::new(RequestIdentity::default());
        extensions.insert(guest.clone());
        Self(guest)
    }

    pub fn get_id(&self) -> Option<i32> {
        self.0.principal.as_ref().map(|p| p.id)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.0.principal.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.0.principal.is_some()
    }

    /// Token to embed in the form for `intent` on resource `id`.
    pub fn intent_token(&self, intent: Intent, id: i32) -> String {
        intent_token(&self.0.csrf_secret, intent, id)
    }

    pub fn check_intent(&self, intent: Intent, id: i32, provided: &str) -> TokenCheck {
        verify_intent_token(&self.0.csrf_secret, intent, id, provided)
    }

    pub fn require_login(&self) -> Result<&Principal, AppError> {
        self.principal().ok_or(AppError::LoginRequired)
    }
}

impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::from_extensions(&mut req.extensions_mut())))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct IdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let next = self.service.clone();

        // Session extraction needs the bare HttpRequest.
        let (http_req, payload) = req.into_parts();
        let session = Session::extract(&http_req).into_inner();
        let req = ServiceRequest::from_parts(http_req, payload);

        Box::pin(async move {
            let db = req.app_data::<Data<DatabaseConnection>>().cloned();
            match (db, session) {
                (Some(db), Ok(session)) => {
                    let identity = RequestIdentity::resolve(&session, &db).await;
                    req.extensions_mut().insert(Data::new(identity));
                }
                (None, _) => {
                    log::error!("no DatabaseConnection in app data, treating request as guest")
                }
                (_, Err(err)) => {
                    log::error!("session unreadable, treating request as guest: {}", err)
                }
            }

            next.call(req).await
        })
    }
}
