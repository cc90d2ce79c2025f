//! # Signing Flow
//!
//! 1. **Key generation**: KMS key → SPKI → compressed key → alias
//! 2. **Signing**: alias → KMS DER signature → `r||s` → base64
//! 3. **Approval**: tagged signer and signature for a deploy

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use k256::ecdsa::signature::hazmat::PrehashVerifier;
    use k256::ecdsa::{Signature, VerifyingKey};
    use sha2::{Digest, Sha256};

    use offer_signer::{
        alias_for, CompressedPublicKey, DeployHash, InMemoryKms, KeyAlgorithm, KeyId,
        KeyManagementGateway, KeyPair, KeyService, KeyServiceApi, KeyServiceErrorKind, KmsError,
        ServiceFault, SignerConfig,
    };
    use offer_telemetry::{register_metrics, SIGNATURES_NORMALIZED, SIGNING_FAILURES};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// KMS signature with a high `s` (sign pad present).
    const HIGH_S_DER: &str =
        "MEUCIASKOyv1PF6jyESy1sl5/OYzwVBegblC/bTX0+1kUdJ9AiEA/Pnlsqj6lR5Qbmm1T0vYaPHJO4XuABHuyexccISYWF4=";
    const HIGH_S_CANONICAL: &str = concat!(
        "048a3b2bf53c5ea3c844b2d6c979fce633c1505e81b942fdb4d7d3ed6451d27d",
        "03061a4d57056ae1af91964ab0b42795c8e5a160c1488e4cf5e6021c4b9de8e3"
    );

    /// Gateway that answers every signing request with a fixed response.
    struct FixedKms {
        response: Result<Vec<u8>, KmsError>,
    }

    #[async_trait::async_trait]
    impl KeyManagementGateway for FixedKms {
        async fn create_key(&self) -> Result<KeyId, KmsError> {
            Err(KmsError::Communication("read-only".to_string()))
        }

        async fn public_key_der(&self, key_id: &KeyId) -> Result<Vec<u8>, KmsError> {
            Err(KmsError::NotFound(key_id.to_string()))
        }

        async fn create_alias(&self, _alias: &str, _key_id: &KeyId) -> Result<(), KmsError> {
            Err(KmsError::Communication("read-only".to_string()))
        }

        async fn resolve_alias(&self, _alias: &str) -> Result<KeyId, KmsError> {
            Ok(KeyId("fixed".to_string()))
        }

        async fn sign(&self, _key_id: &KeyId, _message: &[u8]) -> Result<Vec<u8>, KmsError> {
            self.response.clone()
        }
    }

    fn deploy_hash(seed: &[u8]) -> DeployHash {
        DeployHash::from_bytes(Sha256::digest(seed).into())
    }

    fn verify(key_pair: &KeyPair, deploy_hash: &DeployHash, signature: &[u8]) -> bool {
        let sec1 = hex::decode(&key_pair.public_key_hex).unwrap();
        let public_key = CompressedPublicKey::from_sec1_bytes(&sec1)
            .unwrap()
            .to_public_key()
            .unwrap();
        let signature = Signature::from_slice(signature).unwrap();
        VerifyingKey::from(public_key)
            .verify_prehash(&Sha256::digest(deploy_hash.as_bytes()), &signature)
            .is_ok()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_generate_sign_verify() {
        let service = KeyService::new(InMemoryKms::new(), &SignerConfig::default());
        let key_pair = service.generate_keypair().await.unwrap();
        let hash = deploy_hash(b"offer #1");

        let encoded = service
            .sign(&hash.to_base64(), &key_pair.public_key_hex)
            .await
            .unwrap();

        assert!(verify(&key_pair, &hash, &BASE64.decode(encoded).unwrap()));
    }

    #[tokio::test]
    async fn test_signature_prefix_is_prepended() {
        let config = SignerConfig {
            signature_prefix: vec![0x01],
            ..SignerConfig::default()
        };
        let service = KeyService::new(InMemoryKms::new(), &config);
        let key_pair = service.generate_keypair().await.unwrap();
        let hash = deploy_hash(b"offer #2");

        let encoded = service
            .sign(&hash.to_base64(), &key_pair.public_key_hex)
            .await
            .unwrap();
        let bytes = BASE64.decode(encoded).unwrap();

        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x01);
        assert!(verify(&key_pair, &hash, &bytes[1..]));
    }

    #[tokio::test]
    async fn test_kms_fixture_is_normalized() {
        register_metrics().unwrap();
        let before = SIGNATURES_NORMALIZED.get();

        let service = KeyService::new(
            FixedKms {
                response: Ok(BASE64.decode(HIGH_S_DER).unwrap()),
            },
            &SignerConfig::default(),
        );

        let encoded = service
            .sign(&deploy_hash(b"fixture").to_base64(), "02aa")
            .await
            .unwrap();

        assert_eq!(hex::encode(BASE64.decode(encoded).unwrap()), HIGH_S_CANONICAL);
        assert!(SIGNATURES_NORMALIZED.get() >= before + 1.0);
    }

    #[tokio::test]
    async fn test_unparseable_kms_signature_is_a_signing_error() {
        register_metrics().unwrap();
        let failures = SIGNING_FAILURES.with_label_values(&["signing"]);
        let before = failures.get();

        let service = KeyService::new(
            FixedKms {
                response: Ok(vec![0x31; 72]),
            },
            &SignerConfig::default(),
        );

        let err = service
            .sign(&deploy_hash(b"garbage").to_base64(), "02aa")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), KeyServiceErrorKind::Signing);
        assert!(matches!(err.fault(), Some(ServiceFault::Codec(_))));
        assert!(failures.get() >= before + 1.0);
    }

    #[tokio::test]
    async fn test_kms_outage_is_a_signing_error() {
        let service = KeyService::new(
            FixedKms {
                response: Err(KmsError::Communication("timeout".to_string())),
            },
            &SignerConfig::default(),
        );

        let key_pair = KeyPair {
            id: "02aa".to_string(),
            key_type: KeyAlgorithm::Secp256k1,
            public_key_hex: "02aa".to_string(),
        };

        let err = service
            .approve(&deploy_hash(b"outage"), &key_pair)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), KeyServiceErrorKind::Signing);
        assert_eq!(
            err.fault(),
            Some(&ServiceFault::Kms(KmsError::Communication(
                "timeout".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_key_generation_failure() {
        let service = KeyService::new(
            FixedKms {
                response: Ok(Vec::new()),
            },
            &SignerConfig::default(),
        );

        let err = service.generate_keypair().await.unwrap_err();
        assert_eq!(err.kind(), KeyServiceErrorKind::KeyGeneration);
    }

    #[tokio::test]
    async fn test_concurrent_signing_with_high_s_kms() {
        let service = Arc::new(KeyService::new(InMemoryKms::new(), &SignerConfig::default()));
        service.gateway().emit_high_s(true);
        let key_pair = service.generate_keypair().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let service = Arc::clone(&service);
            let key_pair = key_pair.clone();
            handles.push(tokio::spawn(async move {
                let hash = deploy_hash(&[i]);
                let approval = service.approve(&hash, &key_pair).await.unwrap();
                (hash, approval)
            }));
        }

        for handle in handles {
            let (hash, approval) = handle.await.unwrap();
            assert_eq!(approval.signer, key_pair.tagged_public_key());
            let signature = hex::decode(&approval.signature[2..]).unwrap();
            assert!(verify(&key_pair, &hash, &signature));
        }
    }

    #[tokio::test]
    async fn test_two_keys_use_separate_aliases() {
        let service = KeyService::new(InMemoryKms::new(), &SignerConfig::default());
        let first = service.generate_keypair().await.unwrap();
        let second = service.generate_keypair().await.unwrap();
        assert_ne!(first.public_key_hex, second.public_key_hex);

        let first_id = service
            .gateway()
            .resolve_alias(&alias_for(&first.public_key_hex))
            .await
            .unwrap();
        let second_id = service
            .gateway()
            .resolve_alias(&alias_for(&second.public_key_hex))
            .await
            .unwrap();
        assert_ne!(first_id, second_id);
        assert_eq!(service.gateway().key_count(), 2);

        // A signature from one key does not verify under the other
        let hash = deploy_hash(b"offer #3");
        let encoded = service
            .sign(&hash.to_base64(), &first.public_key_hex)
            .await
            .unwrap();
        let bytes = BASE64.decode(encoded).unwrap();
        assert!(verify(&first, &hash, &bytes));
        assert!(!verify(&second, &hash, &bytes));
    }
}
