//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/users/{user_id}', use [format_endpoint].

/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to get a single user.
pub const USER: &str = "/api/users/{user_id}";
/// The route for a user's dashboard report.
pub const DASHBOARD: &str = "/api/users/{user_id}/dashboard";
/// The route for a user's analytics report.
pub const ANALYTICS: &str = "/api/users/{user_id}/analytics";
/// The route to list a user's transactions or add one by hand.
pub const USER_TRANSACTIONS: &str = "/api/users/{user_id}/transactions";
/// The route to download a user's transactions as CSV.
pub const EXPORT_TRANSACTIONS: &str = "/api/users/{user_id}/transactions/export";
/// The route to list or connect a user's sources.
pub const USER_SOURCES: &str = "/api/users/{user_id}/sources";
/// The route to delete a source.
pub const SOURCE: &str = "/api/sources/{source_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// The parameter is the first `{...}` segment, e.g. `{user_id}`. Paths without
/// a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => {
            format!(
                "{}{id}{}",
                &endpoint_path[..start],
                &endpoint_path[end + 1..]
            )
        }
        _ => endpoint_path.to_owned(),
    }
}
