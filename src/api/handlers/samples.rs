use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleValuedModel {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiValuedModel {
    pub value1: String,
    pub value2: String,
    pub value3: String,
}

/// GET /api/test
pub async fn check_handler() -> StatusCode {
    StatusCode::OK
}

/// POST /api/test/single
pub async fn single_valued_handler(Json(_model): Json<SingleValuedModel>) -> StatusCode {
    StatusCode::OK
}

/// POST /api/test/multivalued
pub async fn multi_valued_handler(Json(_model): Json<MultiValuedModel>) -> StatusCode {
    StatusCode::OK
}
