//! Signing JSON documents.
//!
//! A document is signed by embedding the proof metadata under `"proof"`,
//! canonicalizing the result with JCS (RFC 8785), hashing it with SHA-256 and
//! signing the digest with Ed25519. The metadata carries no `proofValue` while
//! it is being signed.

use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use anchors_core::{Ed25519PublicKey, Ed25519Signature, Keypair};

use crate::error::{ProofError, Result};

/// Signature suite produced by [`Ed25519JcsSigner`].
pub const JCS_ED25519_SIGNATURE_2020: &str = "JcsEd25519Signature2020";

/// Proof purpose for every signature and proof in this crate.
pub const DATA_VERIFICATION: &str = "dataVerification";

/// A detached signature over a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedDataSignature {
    #[serde(rename = "type")]
    pub signature_type: String,
    pub verification_method: String,
    pub proof_purpose: String,
    /// RFC 3339 timestamp, kept verbatim since it is part of the signed bytes.
    pub created: String,
    /// Hex-encoded Ed25519 signature.
    pub proof_value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofOptions<'a> {
    #[serde(rename = "type")]
    signature_type: &'a str,
    verification_method: &'a str,
    proof_purpose: &'a str,
    created: &'a str,
}

impl<'a> From<&'a LinkedDataSignature> for ProofOptions<'a> {
    fn from(signature: &'a LinkedDataSignature) -> Self {
        Self {
            signature_type: &signature.signature_type,
            verification_method: &signature.verification_method,
            proof_purpose: &signature.proof_purpose,
            created: &signature.created,
        }
    }
}

/// An Ed25519 signing secret. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Keypair::from_seed(&self.0).public_key()
    }

    fn keypair(&self) -> Keypair {
        Keypair::from_seed(&self.0)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&"[redacted]").finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Signer
// ─────────────────────────────────────────────────────────────────────────────

/// Produces detached signatures over JSON documents.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Identifier of the key controller, e.g. a DID.
    fn controller(&self) -> &str;

    /// Sign `document` with `secret`.
    ///
    /// `verification_method` is a fragment under the controller; the
    /// signature names it as `"<controller>#<verification_method>"`.
    async fn sign_json(
        &self,
        document: &Value,
        verification_method: &str,
        secret: &SecretKey,
    ) -> Result<LinkedDataSignature>;
}

/// JCS + SHA-256 + Ed25519 signer.
#[derive(Debug, Clone)]
pub struct Ed25519JcsSigner {
    controller: String,
}

impl Ed25519JcsSigner {
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
        }
    }
}

#[async_trait]
impl Signer for Ed25519JcsSigner {
    fn controller(&self) -> &str {
        &self.controller
    }

    async fn sign_json(
        &self,
        document: &Value,
        verification_method: &str,
        secret: &SecretKey,
    ) -> Result<LinkedDataSignature> {
        let mut signature = LinkedDataSignature {
            signature_type: JCS_ED25519_SIGNATURE_2020.to_string(),
            verification_method: format!("{}#{}", self.controller, verification_method),
            proof_purpose: DATA_VERIFICATION.to_string(),
            created: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            proof_value: String::new(),
        };

        let digest = signing_digest(document, ProofOptions::from(&signature))?;
        signature.proof_value = secret.keypair().sign(&digest).to_hex();

        debug!(method = %signature.verification_method, "signed document");
        Ok(signature)
    }
}

/// Check a JCS Ed25519 signature over `document`.
///
/// Returns `Ok(false)` for a signature that does not match, and an error only
/// when the inputs cannot be processed at all.
pub fn verify_json(document: &Value, signature: &LinkedDataSignature, public_key: &Ed25519PublicKey) -> Result<bool> {
    if signature.signature_type != JCS_ED25519_SIGNATURE_2020 {
        return Ok(false);
    }
    let proof_value = Ed25519Signature::from_hex(&signature.proof_value)
        .map_err(|e| ProofError::MalformedSignature(e.to_string()))?;
    let digest = signing_digest(document, ProofOptions::from(signature))?;
    Ok(public_key.verify(&digest, &proof_value).is_ok())
}

fn signing_digest(document: &Value, options: ProofOptions<'_>) -> Result<[u8; 32]> {
    let Value::Object(fields) = document else {
        return Err(ProofError::InvalidDataType);
    };
    let mut fields: Map<String, Value> = fields.clone();
    fields.insert("proof".to_string(), serde_json::to_value(options)?);

    let canonical =
        serde_jcs::to_vec(&Value::Object(fields)).map_err(|e| ProofError::Canonicalization(e.to_string()))?;
    Ok(Sha256::digest(&canonical).into())
}
