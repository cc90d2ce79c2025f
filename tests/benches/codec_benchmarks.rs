//! # Offer-Signer Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | DER → r‖s conversion | < 10μs |
//! | Canonical passthrough | < 1μs |
//! | In-memory KMS sign + convert | < 1ms |

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use offer_signer::{
    normalize_s, DeployHash, InMemoryKms, KeyService, KeyServiceApi, SignatureCodec,
    SignerConfig,
};
use sha2::{Digest, Sha256};

const FIXTURES: [(&str, &str); 3] = [
    (
        "low_s",
        "MEQCICTfgzylgrlhiNEK/bXgz48fv828is9OdQxN2pkDPolsAiBP92yyQCQwSSCUTx09JAw00M3wWXMfnGLO+y4Gds2cXA=",
    ),
    (
        "high_s",
        "MEUCIASKOyv1PF6jyESy1sl5/OYzwVBegblC/bTX0+1kUdJ9AiEA/Pnlsqj6lR5Qbmm1T0vYaPHJO4XuABHuyexccISYWF4=",
    ),
    (
        "high_r_high_s",
        "MEYCIQCAf2B+txlyCj7uxuSr5DefJ7cZsmC1ZaJJfYUpb/sk9wIhAM/f2mVwgHf+6FkGghXmxzFfmaWPWPVu2Wq0QMs4+mgo",
    ),
];

fn bench_der_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/der_to_canonical");
    group.throughput(Throughput::Elements(1));
    let codec = SignatureCodec::default();

    for (name, encoded) in FIXTURES {
        let der = BASE64.decode(encoded).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", name), &der, |b, der| {
            b.iter(|| codec.decode(black_box(der)).unwrap())
        });
    }

    let canonical = codec.decode_base64(FIXTURES[1].1).unwrap();
    group.bench_function("passthrough", |b| {
        b.iter(|| codec.decode(black_box(canonical.as_bytes())).unwrap())
    });
    group.bench_function("decode_base64", |b| {
        b.iter(|| codec.decode_base64(black_box(FIXTURES[1].1)).unwrap())
    });

    group.finish();
}

fn bench_normalize_s(c: &mut Criterion) {
    let high_s: [u8; 32] = [0xF0; 32];
    c.bench_function("codec/normalize_s", |b| {
        b.iter(|| normalize_s(black_box(&high_s)).unwrap())
    });
}

fn bench_sign_flow(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let service = KeyService::new(InMemoryKms::new(), &SignerConfig::default());
    service.gateway().emit_high_s(true);
    let key_pair = runtime.block_on(service.generate_keypair()).unwrap();
    let hash = DeployHash::from_bytes(Sha256::digest(b"benchmark offer").into());

    let mut group = c.benchmark_group("service/sign");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("approve", |b| {
        b.iter(|| {
            runtime
                .block_on(service.approve(black_box(&hash), &key_pair))
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_der_conversion, bench_normalize_s, bench_sign_flow);
criterion_main!(benches);
