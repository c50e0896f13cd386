use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, MatchedPath, Query, RawPathParams, Request},
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde_json::Value;
use tower::{Layer, Service};
use tracing::{debug, error};

use crate::api::errors::ApiError;
use crate::application::{
    Arguments, FilterError, FilterReport, PayloadFilter, RequestContext, RouteInfo,
    ShortCircuitResponse, ValidationError,
};
use crate::config::PayloadInjectionOptions;

/// Argument name the JSON body is bound under
pub const DEFAULT_BODY_ARGUMENT: &str = "body";

/// Largest body buffered for scanning
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Logical endpoint name, set as a request extension by an outer layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointName(pub String);

/// Validation annotations attached to a short-circuited response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

#[derive(Clone)]
pub struct PayloadInjectionLayer {
    filter: Arc<PayloadFilter>,
    body_argument: Arc<str>,
    body_limit: usize,
}

impl PayloadInjectionLayer {
    pub fn new(filter: PayloadFilter) -> Self {
        Self {
            filter: Arc::new(filter),
            body_argument: Arc::from(DEFAULT_BODY_ARGUMENT),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn from_options(options: &PayloadInjectionOptions) -> Result<Self, FilterError> {
        Ok(Self::new(PayloadFilter::new(options)?))
    }

    /// Bind the JSON body under a different argument name
    pub fn with_body_argument(mut self, name: impl AsRef<str>) -> Self {
        self.body_argument = Arc::from(name.as_ref());
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn filter(&self) -> &PayloadFilter {
        &self.filter
    }
}

impl<S> Layer<S> for PayloadInjectionLayer
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Service = PayloadInjectionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PayloadInjectionService {
            inner,
            filter: Arc::clone(&self.filter),
            body_argument: Arc::clone(&self.body_argument),
            body_limit: self.body_limit,
        }
    }
}

#[derive(Clone)]
pub struct PayloadInjectionService<S> {
    inner: S,
    filter: Arc<PayloadFilter>,
    body_argument: Arc<str>,
    body_limit: usize,
}

impl<S> Service<Request> for PayloadInjectionService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let filter = Arc::clone(&self.filter);
        let body_argument = Arc::clone(&self.body_argument);
        let body_limit = self.body_limit;

        Box::pin(async move {
            // Skipped methods are forwarded without buffering the body
            if !filter.settings().allows_method(request.method().as_str()) {
                debug!(method = %request.method(), uri = %request.uri(), "payload filter skipped");
                return inner.call(request).await;
            }

            let (mut parts, body) = request.into_parts();
            let route = route_info(&parts);

            let (arguments, body) =
                match bind_arguments(&mut parts, body, &body_argument, body_limit).await {
                    Ok(bound) => bound,
                    Err(err) => {
                        error!(
                            method = %parts.method,
                            uri = %parts.uri,
                            error = %err,
                            "failed to bind request arguments"
                        );
                        return Ok(ApiError::from(err).into_response());
                    }
                };

            let mut context = RequestContext::new(parts.method.as_str(), route, arguments);
            let report = filter.on_request(&mut context);

            if let Some(response) = context.take_result() {
                let errors = ValidationErrors(context.validation_errors().to_vec());
                return Ok(short_circuit_response(response, errors, report));
            }

            parts.extensions.insert(report);
            inner.call(Request::from_parts(parts, Body::from(body))).await
        })
    }
}

/// Create a payload injection layer from options
pub fn create_payload_injection_middleware(
    options: &PayloadInjectionOptions,
) -> Result<PayloadInjectionLayer, FilterError> {
    PayloadInjectionLayer::from_options(options)
}

fn route_info(parts: &Parts) -> RouteInfo {
    RouteInfo {
        template: parts
            .extensions
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_string())
            .unwrap_or_default(),
        endpoint: parts
            .extensions
            .get::<EndpointName>()
            .map(|name| name.0.clone()),
    }
}

/// Bind path parameters, query parameters and the body, in that order.
///
/// A JSON body is bound as one argument; each field of a form-urlencoded body
/// becomes its own string argument.
///
/// Returns the arguments and the buffered body so the request can be rebuilt.
async fn bind_arguments(
    parts: &mut Parts,
    body: Body,
    body_argument: &str,
    body_limit: usize,
) -> Result<(Arguments, Bytes), FilterError> {
    let mut arguments = Arguments::new();

    if let Ok(params) = RawPathParams::from_request_parts(parts, &()).await {
        for (name, value) in &params {
            arguments.push(name, Value::String(value.to_string()));
        }
    }

    if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        for (name, value) in pairs {
            arguments.push(name, Value::String(value));
        }
    }

    let bytes = axum::body::to_bytes(body, body_limit)
        .await
        .map_err(|e| FilterError::Body(e.to_string()))?;

    // Bodies the filter cannot read are left for the endpoint's extractor to reject
    if bytes.is_empty() {
        return Ok((arguments, bytes));
    }
    if is_json(&parts.headers) {
        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            arguments.push(body_argument, value);
        }
    } else if is_form(&parts.headers) {
        for (name, value) in form_pairs(bytes.clone()).await {
            arguments.push(name, Value::String(value));
        }
    }

    Ok((arguments, bytes))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

/// Decode a form-urlencoded body the way `axum::Form` does for handlers
async fn form_pairs(bytes: Bytes) -> Vec<(String, String)> {
    let request = match axum::http::Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(bytes))
    {
        Ok(request) => request,
        Err(_) => return Vec::new(),
    };

    match Form::<Vec<(String, String)>>::from_request(request, &()).await {
        Ok(Form(pairs)) => pairs,
        Err(_) => Vec::new(),
    }
}

fn short_circuit_response(
    response: ShortCircuitResponse,
    errors: ValidationErrors,
    report: FilterReport,
) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_REQUEST);
    let mut http = (status, response.body).into_response();

    if let Ok(content_type) = HeaderValue::from_str(&response.content_type) {
        http.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    http.extensions_mut().insert(errors);
    http.extensions_mut().insert(report);
    http
}
