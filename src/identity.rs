//! Long-term node identity and its JSON file format.
//!
//! The identity is a secp256k1 keypair. On disk it is stored as
//! `{"id": .., "privKey": .., "pubKey": ..}` with hex-encoded values, where
//! `id` is the discv5 node id derived from the public key.

use std::fmt;
use std::path::Path;

use discv5::enr::{CombinedKey, EnrKey, EnrPublicKey, NodeId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::IdentityPolicy;
use crate::error::{Error, Result};
use crate::persist::write_atomic;

/// A node's long-term keypair.
pub struct Identity {
    secret: [u8; 32],
    key: CombinedKey,
    node_id: NodeId,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityFile {
    id: String,
    priv_key: String,
    pub_key: String,
}

impl Identity {
    /// Generate a fresh random secp256k1 identity.
    pub fn generate() -> Self {
        let key = CombinedKey::generate_secp256k1();
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&key.encode());
        Self::with_key(secret, key)
    }

    /// Build an identity from a raw 32-byte secp256k1 secret.
    pub fn from_secret_bytes(bytes: &[u8]) -> std::result::Result<Self, String> {
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| format!("secret key must be 32 bytes, got {}", bytes.len()))?;
        let mut scratch = secret;
        let key =
            CombinedKey::secp256k1_from_bytes(&mut scratch).map_err(|e| format!("{e:?}"))?;
        Ok(Self::with_key(secret, key))
    }

    fn with_key(secret: [u8; 32], key: CombinedKey) -> Self {
        let node_id = NodeId::from(key.public());
        Self {
            secret,
            key,
            node_id,
        }
    }

    /// The signing key, as expected by the discovery engine.
    pub fn key(&self) -> CombinedKey {
        // `CombinedKey` is not `Clone`; rebuild it from the stored secret.
        let mut scratch = self.secret;
        CombinedKey::secp256k1_from_bytes(&mut scratch).expect("stored secret is a valid key")
    }

    /// The node id derived from the public key.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Compressed public key bytes.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.key.public().encode()
    }

    /// Serialize to the identity file format.
    pub fn to_json(&self) -> String {
        let file = IdentityFile {
            id: hex::encode(self.node_id().raw()),
            priv_key: hex::encode(self.secret),
            pub_key: hex::encode(self.public_key_bytes()),
        };
        serde_json::to_string_pretty(&file).expect("identity serialization cannot fail")
    }

    /// Parse the identity file format, checking that `id` and `pubKey` agree with `privKey`.
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        let file: IdentityFile = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let secret = decode_hex(&file.priv_key).map_err(|e| format!("privKey: {e}"))?;
        let identity = Self::from_secret_bytes(&secret)?;

        let public = decode_hex(&file.pub_key).map_err(|e| format!("pubKey: {e}"))?;
        if public != identity.public_key_bytes() {
            return Err("pubKey does not match privKey".to_string());
        }
        let id = decode_hex(&file.id).map_err(|e| format!("id: {e}"))?;
        if id.as_slice() != identity.node_id().raw().as_slice() {
            return Err("id does not match privKey".to_string());
        }
        Ok(identity)
    }
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Self::with_key(self.secret, self.key())
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.secret == other.secret
    }
}

impl Eq for Identity {}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("node_id", &self.node_id())
            .finish_non_exhaustive()
    }
}

fn decode_hex(value: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value.trim().trim_start_matches("0x"))
}

/// Read the identity file, applying `policy` when it does not exist.
pub async fn read_identity(path: &Path, policy: IdentityPolicy) -> Result<Identity> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Identity::from_json(&contents).map_err(|reason| Error::InvalidIdentity {
            path: path.to_path_buf(),
            reason,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => match policy {
            IdentityPolicy::Require => Err(Error::IdentityMissing(path.to_path_buf())),
            IdentityPolicy::CreateIfMissing => {
                let identity = Identity::generate();
                write_identity(path, &identity).await?;
                info!(
                    path = %path.display(),
                    node_id = %identity.node_id(),
                    "Generated new peer identity"
                );
                Ok(identity)
            }
        },
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Write the identity file, replacing any previous one.
pub async fn write_identity(path: &Path, identity: &Identity) -> Result<()> {
    let mut json = identity.to_json();
    json.push('\n');
    write_atomic(path, json.as_bytes()).await
}
