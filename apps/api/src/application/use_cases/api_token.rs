use sha2::{Digest, Sha256};

/// Static web API tokens, kept only as SHA-256 digests.
#[derive(Debug, Clone, Default)]
pub struct ApiTokenVerifier {
    token_hashes: Vec<String>,
}

impl ApiTokenVerifier {
    /// Build from a comma-separated token list. Blank entries are ignored.
    pub fn from_comma_separated(raw: &str) -> Self {
        let token_hashes = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(hash_api_token)
            .collect();
        Self { token_hashes }
    }

    pub fn is_empty(&self) -> bool {
        self.token_hashes.is_empty()
    }

    pub fn verify(&self, raw_token: &str) -> bool {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return false;
        }
        let hash = hash_api_token(raw_token);
        self.token_hashes.iter().any(|h| *h == hash)
    }
}

/// Hash an API token using SHA-256, returning hex-encoded hash.
fn hash_api_token(raw_token: &str) -> String {
    let hash = Sha256::digest(raw_token.as_bytes());
    hex::encode(hash)
}
