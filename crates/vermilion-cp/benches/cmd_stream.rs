#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
#[cfg(not(target_arch = "wasm32"))]
use vermilion_cp::packets::pkt_id;
#[cfg(not(target_arch = "wasm32"))]
use vermilion_cp::regs::{cp_packet3, P3_3D_DRAW_IMMD, P3_LOAD_VBPNTR};
#[cfg(not(target_arch = "wasm32"))]
use vermilion_cp::{
    dispatch_cmdbuf, ApertureMap, ClientId, CmdStreamWriter, DeviceContext, Microcode,
    SessionContext, VecRing,
};

#[cfg(not(target_arch = "wasm32"))]
fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(50)
}

/// A plausible frame: state packets, vertex array pointers, scalar
/// constants, and a batch of draws.
#[cfg(not(target_arch = "wasm32"))]
fn build_frame_stream(draws: u32) -> Vec<u8> {
    let mut w = CmdStreamWriter::new();

    let mut ctx = [0u32; 7];
    ctx[4] = 0x4000; // depth offset, zero-based
    w.packet(pkt_id::CTX_MISC, &ctx);
    w.packet(pkt_id::GE_ZBIAS, &[0, 0]);
    w.scalars(0, 1, &[0x3f80_0000; 6]);
    w.vectors(0, 2, &[0; 16]);

    for i in 0..draws {
        let vbpntr = [cp_packet3(P3_LOAD_VBPNTR, 3), 2, 0x11, 0x1000, 0x2000];
        w.packet3(&vbpntr);
        let draw = [cp_packet3(P3_3D_DRAW_IMMD, 1), i, 3];
        w.packet3(&draw);
    }
    w.finish()
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("cmd_stream_dispatch");
    for draws in [16u32, 256] {
        let bytes = build_frame_stream(draws);
        group.throughput(criterion::Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("frame", draws),
            &bytes,
            |b, bytes| {
                let mut dev = DeviceContext::new(
                    ApertureMap {
                        fb_base: 0x1000_0000,
                        fb_size: 0x0100_0000,
                        gart_base: 0x2000_0000,
                        gart_size: 0x0100_0000,
                    },
                    Microcode::V1,
                    4,
                );
                let mut session = SessionContext::new(ClientId(1));
                session.fb_delta = 0x1000_0000;
                b.iter(|| {
                    let mut ring = VecRing::new();
                    dispatch_cmdbuf(&mut dev, &mut session, &mut ring, black_box(bytes), &[])
                        .unwrap();
                    black_box(ring.words.len());
                });
            },
        );
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_dispatch
}
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
