#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::json;

/// Header carrying the encoded identity on Sources API requests and event messages.
pub const IDENTITY_HEADER: &str = "x-rh-identity";

/// Identity context used to authenticate collaborator calls for one tenant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    account: String,
    encoded: String,
}

impl Identity {
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn header(&self) -> (String, String) {
        (IDENTITY_HEADER.to_string(), self.encoded.clone())
    }
}

pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, account: &str) -> Identity;
}

/// Encodes the account number into the base64 JSON identity document the platform expects.
#[derive(Clone, Debug, Default)]
pub struct AccountIdentityResolver;

impl IdentityResolver for AccountIdentityResolver {
    fn resolve(&self, account: &str) -> Identity {
        let document = json!({
            "identity": {
                "account_number": account,
                "user": { "is_org_admin": true }
            }
        });
        Identity {
            account: account.to_string(),
            encoded: BASE64_STANDARD.encode(document.to_string()),
        }
    }
}

/// Identity headers for an optional account; no account means unauthenticated calls.
pub fn identity_headers(
    resolver: &dyn IdentityResolver,
    account: Option<&str>,
) -> Vec<(String, String)> {
    account
        .map(|account| vec![resolver.resolve(account).header()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_identity_round_trips_account_number() {
        let identity = AccountIdentityResolver.resolve("1460290");
        let decoded = BASE64_STANDARD
            .decode(identity.encoded())
            .expect("valid base64");
        let document: serde_json::Value = serde_json::from_slice(&decoded).expect("valid json");
        assert_eq!(document["identity"]["account_number"], "1460290");
    }

    #[test]
    fn missing_account_produces_no_headers() {
        assert!(identity_headers(&AccountIdentityResolver, None).is_empty());
        let headers = identity_headers(&AccountIdentityResolver, Some("12"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, IDENTITY_HEADER);
    }
}
