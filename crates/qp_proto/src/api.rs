//! Key-service and profile-service response bodies.
//! These map directly to JSON bodies on the wire; the key endpoints
//! themselves return bare hex strings, not JSON.

use serde::{Deserialize, Serialize};

/// `GET /users/{uid}` — display data only, no crypto relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}

/// Error body the services return alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parses() {
        let profile: UserProfile = serde_json::from_str(r#"{"name":"Jane Smith"}"#).unwrap();
        assert_eq!(profile.name, "Jane Smith");
    }
}
