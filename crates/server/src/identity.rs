//! Identity exchange contract.
//!
//! A client obtains an opaque authorization code from its platform and the
//! server trades it for a bearer credential before joining. The exchange
//! itself lives outside the session core; only the contract is fixed here.

use crate::error::IdentityError;

/// Credential returned by a successful exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential {
    pub access_token: String,
    pub expires_in_secs: u64,
}

impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerCredential")
            .field("access_token", &"<redacted>")
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

pub trait IdentityExchange: Send + Sync {
    /// Trade `code` for a credential. Implementations call the provider.
    fn exchange_code(&self, code: &str) -> Result<BearerCredential, IdentityError>;

    /// Reject empty codes before calling out.
    fn exchange(&self, code: &str) -> Result<BearerCredential, IdentityError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(IdentityError::EmptyCode);
        }
        self.exchange_code(code)
    }
}

// ============================================================================
// Tests
// ============================================================================
