//! YQL templates and search request bodies.
//!
//! Query text and tenant id never appear in the YQL string. They travel as
//! request parameters referenced from the template (`@qtext`, `@qtenant`),
//! so no input can change the query's structure or drop the tenant clause.

use serde_json::{json, Value};
use tenantgate::TenantId;

/// Parameter carrying the query text.
pub const TEXT_PARAM: &str = "qtext";
/// Parameter carrying the tenant id.
pub const TENANT_PARAM: &str = "qtenant";
/// Query tensor name used by the `semantic` rank profile.
pub const VECTOR_INPUT: &str = "input.query(qvec)";
pub const VECTOR_RANKING: &str = "semantic";

pub const LEXICAL_YQL: &str =
    "select * from doc where (title contains @qtext or body contains @qtext) and tenantId contains @qtenant";

/// Nearest-neighbour YQL asking for `target_hits` candidates.
pub fn vector_yql(target_hits: u32) -> String {
    format!(
        "select * from doc where ({{targetHits:{}}}nearestNeighbor(vector, qvec)) and tenantId contains @qtenant",
        target_hits
    )
}

pub fn lexical_request(tenant: &TenantId, text: &str) -> Value {
    json!({
        "yql": LEXICAL_YQL,
        TEXT_PARAM: text,
        TENANT_PARAM: tenant.as_str(),
    })
}

pub fn vector_request(tenant: &TenantId, vector: &[f32], target_hits: u32) -> Value {
    json!({
        "yql": vector_yql(target_hits),
        TENANT_PARAM: tenant.as_str(),
        "ranking": VECTOR_RANKING,
        VECTOR_INPUT: vector,
    })
}
