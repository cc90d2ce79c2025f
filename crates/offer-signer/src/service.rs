//! # Key Service
//!
//! Application service implementing [`KeyServiceApi`].
//!
//! ## Architecture
//!
//! - Implements the inbound port (`KeyServiceApi`)
//! - Uses the outbound port (`KeyManagementGateway`) for key custody and signing
//! - Delegates DER conversion and public key compression to the domain layer

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use offer_telemetry::{log_signing_event, time_histogram};
use offer_telemetry::{
    SIGNATURES_CONVERTED, SIGNATURES_NORMALIZED, SIGNING_DURATION, SIGNING_FAILURES,
};

use crate::config::SignerConfig;
use crate::domain::codec::SignatureCodec;
use crate::domain::entities::{
    Approval, CanonicalSignature, DeployHash, KeyAlgorithm, KeyPair, DEPLOY_HASH_LEN,
};
use crate::domain::public_key::CompressedPublicKey;
use crate::ports::inbound::{KeyServiceApi, KeyServiceError};
use crate::ports::outbound::KeyManagementGateway;

/// KMS alias under which a key is published.
pub fn alias_for(public_key_hex: &str) -> String {
    format!("alias/{public_key_hex}")
}

/// Key service backed by a [`KeyManagementGateway`].
pub struct KeyService<G: KeyManagementGateway> {
    gateway: G,
    codec: SignatureCodec,
    public_key_prefix: String,
    algorithm: KeyAlgorithm,
}

impl<G: KeyManagementGateway> KeyService<G> {
    /// Create a key service.
    ///
    /// # Arguments
    /// * `gateway` - KMS used for key custody and signing
    /// * `config` - Prefixes and algorithm
    pub fn new(gateway: G, config: &SignerConfig) -> Self {
        Self {
            gateway,
            codec: SignatureCodec::new(config.codec_config()),
            public_key_prefix: config.public_key_prefix.clone(),
            algorithm: config.algorithm,
        }
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The signature codec in use.
    pub fn codec(&self) -> &SignatureCodec {
        &self.codec
    }

    /// Sign a deploy hash and return the fixed-width signature.
    pub async fn sign_deploy(
        &self,
        deploy_hash: &DeployHash,
        public_key_hex: &str,
    ) -> Result<CanonicalSignature, KeyServiceError> {
        let _timer = time_histogram!(SIGNING_DURATION);

        let result = self.sign_inner(deploy_hash, public_key_hex).await;
        if let Err(err) = &result {
            SIGNING_FAILURES.with_label_values(&[err.kind().as_str()]).inc();
            log_signing_event!(
                warn,
                "Signing failed",
                public_key_hex,
                deploy_hash = %deploy_hash,
                error = %err,
                cause = ?err.fault()
            );
        }
        result
    }

    async fn sign_inner(
        &self,
        deploy_hash: &DeployHash,
        public_key_hex: &str,
    ) -> Result<CanonicalSignature, KeyServiceError> {
        let key_id = self
            .gateway
            .resolve_alias(&alias_for(public_key_hex))
            .await
            .map_err(|e| KeyServiceError::signing("Error resolving signing key", e))?;

        let der = self
            .gateway
            .sign(&key_id, deploy_hash.as_bytes())
            .await
            .map_err(|e| KeyServiceError::signing("Error signing deploy", e))?;

        let decoded = self
            .codec
            .decode_detailed(&der)
            .map_err(|e| KeyServiceError::signing("Error converting KMS signature", e))?;

        SIGNATURES_CONVERTED
            .with_label_values(&[decoded.form.as_str()])
            .inc();
        if decoded.s_normalized {
            SIGNATURES_NORMALIZED.inc();
        }

        log_signing_event!(
            debug,
            "Deploy signed",
            key_id,
            deploy_hash = %deploy_hash,
            form = decoded.form.as_str(),
            s_normalized = decoded.s_normalized
        );

        Ok(decoded.signature)
    }
}

#[async_trait::async_trait]
impl<G: KeyManagementGateway> KeyServiceApi for KeyService<G> {
    async fn generate_keypair(&self) -> Result<KeyPair, KeyServiceError> {
        let key_id = self
            .gateway
            .create_key()
            .await
            .map_err(|e| KeyServiceError::key_generation("Error creating key", e))?;

        let spki = self
            .gateway
            .public_key_der(&key_id)
            .await
            .map_err(|e| KeyServiceError::key_generation("Error fetching public key", e))?;

        let compressed = CompressedPublicKey::from_spki_der(&spki)
            .map_err(|e| KeyServiceError::key_generation("Error reading public key", e))?;

        let public_key_hex = format!("{}{}", self.public_key_prefix, compressed.to_hex());

        self.gateway
            .create_alias(&alias_for(&public_key_hex), &key_id)
            .await
            .map_err(|e| KeyServiceError::key_generation("Error creating key alias", e))?;

        log_signing_event!(info, "Key pair generated", key_id, public_key = %public_key_hex);

        Ok(KeyPair {
            id: public_key_hex.clone(),
            key_type: self.algorithm,
            public_key_hex,
        })
    }

    async fn sign(
        &self,
        deploy_hash_base64: &str,
        public_key_hex: &str,
    ) -> Result<String, KeyServiceError> {
        let deploy_hash = DeployHash::from_base64(deploy_hash_base64).ok_or_else(|| {
            SIGNING_FAILURES.with_label_values(&["invalid_request"]).inc();
            KeyServiceError::invalid_request(format!(
                "Deploy hash must be {DEPLOY_HASH_LEN} bytes of base64"
            ))
        })?;

        let signature = self.sign_deploy(&deploy_hash, public_key_hex).await?;
        Ok(self.codec.encode_base64(&signature))
    }

    async fn approve(
        &self,
        deploy_hash: &DeployHash,
        key_pair: &KeyPair,
    ) -> Result<Approval, KeyServiceError> {
        let signature = self
            .sign_deploy(deploy_hash, &key_pair.public_key_hex)
            .await?;

        Ok(Approval {
            signer: key_pair.tagged_public_key(),
            signature: format!(
                "{}{}",
                key_pair.key_type.tag(),
                self.codec.encode_hex(&signature)
            ),
        })
    }
}
