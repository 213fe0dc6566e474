//! Capability card
//!
//! The card is the discovery document callers fetch before invoking
//! anything: which actions exist, what parameters they take, and which
//! authentication scheme to present. It deliberately carries no per-action
//! role requirements.
//!
//! [`CapabilityCardCache`] rebuilds the card lazily whenever the registry
//! generation has moved since the last build and otherwise hands out the
//! same immutable `Arc<CapabilityCard>`.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::ActionDescriptor;
use crate::error::CardError;
use crate::params::ParamSpec;
use crate::registry::ActionRegistry;

/// Signature algorithm label written into signed cards
pub const SIGNATURE_ALGORITHM: &str = "Ed25519";

/// Discovery document advertising the registered actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityCard {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub actions: Vec<CardAction>,
    pub authentication_scheme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<CardSignature>,
}

impl CapabilityCard {
    pub fn action(&self, name: &str) -> Option<&CardAction> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Serialized document as served to callers
    pub fn to_document(&self) -> Result<Vec<u8>, CardError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Bytes covered by the signature: the card without its signature
    fn signing_payload(&self) -> Result<Vec<u8>, CardError> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        unsigned.to_document()
    }
}

/// Public projection of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAction {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl From<&ActionDescriptor> for CardAction {
    fn from(descriptor: &ActionDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            description: descriptor.description().to_string(),
            parameters: descriptor.parameters().to_vec(),
        }
    }
}

/// Detached signature over the unsigned card document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSignature {
    pub algorithm: String,
    pub key_id: String,
    /// Base64 (standard alphabet) signature bytes
    pub value: String,
}

/// Ed25519 key used to sign cards
#[derive(Clone)]
pub struct CardSigningKey {
    key_id: String,
    signing_key: SigningKey,
}

impl CardSigningKey {
    pub fn from_seed(key_id: impl Into<String>, seed: [u8; 32]) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    fn sign(&self, card: &mut CapabilityCard) -> Result<(), CardError> {
        let payload = card.signing_payload()?;
        let signature = self.signing_key.sign(&payload);
        card.signature = Some(CardSignature {
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            key_id: self.key_id.clone(),
            value: STANDARD.encode(signature.to_bytes()),
        });
        Ok(())
    }
}

impl fmt::Debug for CardSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardSigningKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// Check a card's signature against a known verifying key
pub fn verify_card(
    card: &CapabilityCard,
    key_id: &str,
    key: &VerifyingKey,
) -> Result<(), CardError> {
    let signature = card.signature.as_ref().ok_or(CardError::Unsigned)?;
    if signature.algorithm != SIGNATURE_ALGORITHM {
        return Err(CardError::UnsupportedAlgorithm(signature.algorithm.clone()));
    }
    if signature.key_id != key_id {
        return Err(CardError::KeyMismatch(signature.key_id.clone()));
    }

    let bytes = STANDARD
        .decode(&signature.value)
        .map_err(|e| CardError::MalformedSignature(e.to_string()))?;
    let signature = Signature::from_slice(&bytes)
        .map_err(|e| CardError::MalformedSignature(e.to_string()))?;

    let payload = card.signing_payload()?;
    key.verify_strict(&payload, &signature)
        .map_err(|_| CardError::VerificationFailed)
}

/// Static card fields supplied at startup
#[derive(Debug, Clone)]
pub struct CardConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    pub url: Option<String>,
    /// Scheme callers must use, e.g. `Basic`. Never inferred.
    pub authentication_scheme: String,
    pub signing_key: Option<CardSigningKey>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            name: "a2a-agent".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            url: None,
            authentication_scheme: "Basic".to_string(),
            signing_key: None,
        }
    }
}

impl CardConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn authentication_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.authentication_scheme = scheme.into();
        self
    }

    pub fn signing_key(mut self, key: CardSigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }
}

struct CachedCard {
    generation: u64,
    card: Arc<CapabilityCard>,
}

/// Lazily rebuilt, registry-invalidated capability card
pub struct CapabilityCardCache {
    registry: Arc<ActionRegistry>,
    config: CardConfig,
    cached: RwLock<Option<CachedCard>>,
}

impl CapabilityCardCache {
    pub fn new(registry: Arc<ActionRegistry>, config: CardConfig) -> Self {
        Self {
            registry,
            config,
            cached: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Current card, rebuilt first if the registry changed since the last
    /// build. Concurrent rebuilds may race; each one works from a single
    /// registry snapshot and the newest generation wins the slot.
    pub fn get_card(&self) -> Result<Arc<CapabilityCard>, CardError> {
        let current = self.registry.generation();
        if let Some(cached) = self.cached.read().as_ref() {
            if cached.generation == current {
                return Ok(Arc::clone(&cached.card));
            }
        }

        let snapshot = self.registry.snapshot();
        let card = Arc::new(self.build(&snapshot.actions)?);
        debug!(
            generation = snapshot.generation,
            actions = card.actions.len(),
            "Rebuilt capability card"
        );

        let mut slot = self.cached.write();
        match slot.as_ref() {
            Some(existing) if existing.generation >= snapshot.generation => {
                Ok(Arc::clone(&existing.card))
            }
            _ => {
                *slot = Some(CachedCard {
                    generation: snapshot.generation,
                    card: Arc::clone(&card),
                });
                Ok(card)
            }
        }
    }

    /// Serialized form of [`get_card`](Self::get_card)
    pub fn document(&self) -> Result<Vec<u8>, CardError> {
        self.get_card()?.to_document()
    }

    fn build(&self, actions: &[Arc<ActionDescriptor>]) -> Result<CapabilityCard, CardError> {
        let mut card = CapabilityCard {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            version: self.config.version.clone(),
            url: self.config.url.clone(),
            actions: actions.iter().map(|d| CardAction::from(d.as_ref())).collect(),
            authentication_scheme: self.config.authentication_scheme.clone(),
            signature: None,
        };
        if let Some(key) = &self.config.signing_key {
            key.sign(&mut card)?;
        }
        Ok(card)
    }
}
