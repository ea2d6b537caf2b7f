use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use lumen_core::Handle;
use lumen_core::sampler::SamplerParams;
use lumen_driver::backend::noop::NoopDriver;
use lumen_driver::{
    BlendFunction, CommandStream, DriverConfig, PipelineState, RasterState, Sampler,
    SamplerBuffer, ThreadingMode,
};

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

fn bench_sampler_buffer(c: &mut Criterion) {
    let mut samplers = SamplerBuffer::new(16);
    for i in 0..16 {
        samplers.set_sampler(i, Sampler::new(Handle::new(i as u32), SamplerParams::linear()));
    }

    c.bench_function("sampler_buffer_clone_16", |b| {
        b.iter(|| black_box(samplers.clone()));
    });

    c.bench_function("sampler_buffer_to_command_stream_4_dirty", |b| {
        b.iter(|| {
            for i in [1, 5, 9, 13] {
                samplers.set_sampler(i, Sampler::new(Handle::new(i as u32), SamplerParams::new()));
            }
            black_box(samplers.to_command_stream())
        });
    });
}

fn bench_raster_state(c: &mut Criterion) {
    let mut a = RasterState::default();
    a.set_blend_functions(
        BlendFunction::SrcAlpha,
        BlendFunction::One,
        BlendFunction::OneMinusSrcAlpha,
        BlendFunction::OneMinusSrcAlpha,
    );
    let b_state = a;

    c.bench_function("raster_state_compare", |b| {
        b.iter(|| black_box(black_box(a) == black_box(b_state)));
    });
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

fn bench_record_inline(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = DriverConfig::new().with_threading(ThreadingMode::Inline);
    let driver = Arc::new(NoopDriver::new(&config));
    let mut stream = CommandStream::with_driver(driver.clone(), config).expect("stream");
    let primitive = stream.create_render_primitive();
    let program = stream.create_program(Default::default());
    let target = stream.create_default_render_target();
    let pipeline = PipelineState::new(program);

    c.bench_function("record_render_pass_64_draws", |b| {
        b.iter(|| {
            stream.begin_render_pass(target, Default::default());
            for _ in 0..64 {
                stream.draw(pipeline, primitive, 1);
            }
            stream.end_render_pass();
            stream.flush().expect("flush");
            driver.clear_trace();
        });
    });
}

criterion_group!(benches, bench_sampler_buffer, bench_raster_state, bench_record_inline);
criterion_main!(benches);
