//! Request and response envelopes.

use serde::{Deserialize, Serialize};
use sshca_core::{CertificateKind, KeyError, PublicKey, SignRequest};

/// A call from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Request {
    /// Echoed back in the matching [`Response`].
    pub seq: u64,
    pub call: Call,
}

/// The remote-call methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Method", content = "Params")]
pub enum Call {
    #[serde(rename = "GetCAPublicKey")]
    GetCaPublicKey,
    SignPublicKey(SignArgs),
}

impl Call {
    /// Method name as it appears on the wire.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetCaPublicKey => "GetCAPublicKey",
            Self::SignPublicKey(_) => "SignPublicKey",
        }
    }
}

/// Parameters of `SignPublicKey`. The key travels as raw bytes only and is
/// parsed by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignArgs {
    pub identity: String,
    pub certificate_kind: CertificateKind,
    pub principals: Vec<String>,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
}

impl SignArgs {
    /// Parse the carried key and rebuild the request.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidKeyFormat` if the key bytes don't parse.
    pub fn into_request(self) -> Result<SignRequest, KeyError> {
        let public_key = PublicKey::parse(self.public_key)?;
        Ok(SignRequest::new(
            self.identity,
            self.certificate_kind,
            self.principals,
            public_key,
        ))
    }
}

impl From<&SignRequest> for SignArgs {
    fn from(request: &SignRequest) -> Self {
        Self {
            identity: request.identity.clone(),
            certificate_kind: request.kind,
            principals: request.principals.clone(),
            public_key: request.public_key.as_bytes().to_vec(),
        }
    }
}

/// The server's answer to one [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Response {
    pub seq: u64,
    pub result: Result<Reply, RpcError>,
}

/// Successful results, one per method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    PublicKey {
        #[serde(rename = "CAPublicKey", with = "base64_bytes")]
        ca_public_key: Vec<u8>,
    },
    Signed {
        #[serde(rename = "Certificate", with = "base64_bytes")]
        certificate: Vec<u8>,
    },
}

/// Failure classes a peer can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidKeyFormat,
    SigningFailed,
    ConfirmationAborted,
    BadRequest,
    Internal,
}

/// A failed call. The message is safe to show to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "PascalCase")]
#[error("{message}")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
