//! # Secret Reactions Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Content ids | keccak of a slug |
//! | Permits | sign a permit digest, recover its signer |
//! | Resolver | registry lookup for the active network |
//! | Synchronizer | full handle refresh against the local ledger |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use k256::ecdsa::SigningKey;
use sr_reaction_sync::algorithms::{recover_signer, sign_digest};
use sr_reaction_sync::{
    id_from_slug, keccak256, resolve_contract, Address, ContractRegistry, LocalDeployment,
    NetworkId, ReactionSyncConfig, RegistryEntry, POSTS, REACTIONS,
};
use std::time::Duration;

// ============================================================================
// Content ids
// ============================================================================

fn bench_content_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("content-ids");

    group.bench_function("id_from_slug", |b| {
        b.iter(|| black_box(id_from_slug(black_box("hello-world"))))
    });

    let keys = POSTS.len() * REACTIONS.len();
    group.throughput(Throughput::Elements(keys as u64));
    group.bench_function("catalogue_keys", |b| {
        b.iter(|| {
            for post in POSTS.iter() {
                for reaction in REACTIONS.iter() {
                    black_box(post.key(reaction));
                }
            }
        })
    });

    group.finish();
}

// ============================================================================
// Permit signatures
// ============================================================================

fn bench_permit_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("permit-signatures");
    group.measurement_time(Duration::from_secs(10));

    let key = SigningKey::random(&mut rand::thread_rng());
    let digest = keccak256(b"decryption permit for benchmark");
    let signature = match sign_digest(&key, &digest) {
        Ok(signature) => signature,
        Err(e) => panic!("signing failed: {}", e),
    };

    group.bench_function("sign_digest", |b| {
        b.iter(|| black_box(sign_digest(&key, black_box(&digest))))
    });

    group.bench_function("recover_signer", |b| {
        b.iter(|| black_box(recover_signer(black_box(&digest), &signature)))
    });

    group.finish();
}

// ============================================================================
// Contract resolution
// ============================================================================

fn bench_contract_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract-resolver");

    for size in [1u64, 16, 256] {
        let registry = (0..size).fold(ContractRegistry::new(), |registry, i| {
            let mut bytes = [0u8; 20];
            bytes[12..].copy_from_slice(&(i + 1).to_be_bytes());
            registry.with_entry(NetworkId(i + 1), RegistryEntry::new(Address::new(bytes)))
        });

        group.bench_with_input(BenchmarkId::new("resolve", size), &registry, |b, registry| {
            b.iter(|| black_box(resolve_contract(registry, Some(NetworkId(size)))))
        });
    }

    group.bench_function("resolve_unsupported", |b| {
        let registry = ContractRegistry::new();
        b.iter(|| black_box(resolve_contract(&registry, Some(NetworkId(1)))))
    });

    group.finish();
}

// ============================================================================
// Handle refresh
// ============================================================================

fn bench_handle_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronizer");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => panic!("runtime: {}", e),
    };
    let deployment = LocalDeployment::new();
    let service = deployment.service(ReactionSyncConfig::for_testing());
    let key = POSTS[0].key(&REACTIONS[0]);

    group.bench_function("refresh_key", |b| {
        b.iter(|| black_box(runtime.block_on(service.refresh_key(key))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_content_ids,
    bench_permit_signatures,
    bench_contract_resolution,
    bench_handle_refresh,
);

criterion_main!(benches);
