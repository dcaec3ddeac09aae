//! Benchmarks for SigilVM
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use sigilvm::{EnclaveConfig, MemoryHost, SigilVm, SimulatedPlatform};

fn crypto_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto");

    group.throughput(Throughput::Bytes(1024));
    group.bench_function("sha256_1kb", |b| {
        let data = vec![0u8; 1024];
        b.iter(|| sigilvm::crypto::sha256(black_box(&data)));
    });

    group.throughput(Throughput::Bytes(1024));
    group.bench_function("seal_1kb", |b| {
        let vm = test_vm();
        let data = vec![0u8; 1024];
        b.iter(|| vm.seal(black_box(&data)));
    });

    group.finish();
}

fn vm_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("vm");

    // PUSH/ADD chain ending in HALT
    let mut arith = Vec::new();
    for i in 0..64u64 {
        arith.push(0x01);
        arith.extend_from_slice(&i.to_le_bytes());
    }
    for _ in 0..63 {
        arith.push(0x03);
    }
    arith.push(0xFF);

    group.bench_function("validate_arith_chain", |b| {
        b.iter(|| sigilvm::vm::validate(black_box(&arith)));
    });

    group.bench_function("execute_arith_chain", |b| {
        b.iter(|| sigilvm::vm::execute(black_box(&arith), &[], 1_000_000));
    });

    group.bench_function("generate_proof", |b| {
        let vm = test_vm();
        b.iter(|| vm.generate_proof(black_box(&arith), &[], 1_000_000));
    });

    group.finish();
}

fn test_vm() -> SigilVm {
    SigilVm::new(
        EnclaveConfig::default(),
        Box::new(SimulatedPlatform::new()),
        Box::new(MemoryHost::new()),
    )
    .expect("verifier init")
}

criterion_group!(benches, crypto_benchmarks, vm_benchmarks);
criterion_main!(benches);
