//! Three-stage demo: a block source feeding a gain stage feeding a sink,
//! each on its own worker thread.
//!
//! Run with `cargo run --example pipeline`.

use flowrt::metadata::{DataFormat, DataType, Metadata};
use flowrt::prelude::*;
use flowrt::utils::logger::LoggerConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct SampleBlock {
    meta: Metadata,
    samples: Vec<f32>,
}

/// Emits `total` ramp blocks, then raises EOS and finishes.
struct BlockSource {
    out: Arc<OutputPort<SampleBlock>>,
    produced: u32,
    total: u32,
}

impl Worker for BlockSource {
    fn process(&mut self) -> Status {
        if self.produced >= self.total {
            self.out.set_eos(true);
            return Status::Finish;
        }
        let meta = Metadata {
            format: DataFormat {
                is_complex: false,
                data_type: DataType::F32,
                ..DataFormat::default()
            },
            sample_rate: 48_000.0,
            ..Metadata::default()
        };
        let base = self.produced as f32;
        let block = SampleBlock {
            meta,
            samples: (0..64).map(|i| base + i as f32).collect(),
        };
        self.out.send(block, Timestamp::now());
        self.produced += 1;
        Status::Normal
    }
}

/// Scales samples in place; the exclusive input makes that copy-free.
struct GainStage {
    input: Arc<InputPort<SampleBlock>>,
    out: Arc<OutputPort<SampleBlock>>,
    gain: f32,
}

impl Worker for GainStage {
    fn declare_properties(&self, props: &mut PropertySet) {
        props.register("gain", 1.0f32);
    }

    fn initialize(&mut self, props: &PropertySet) {
        self.gain = props.get("gain").unwrap_or(1.0);
    }

    fn process(&mut self) -> Status {
        match self.input.get_data() {
            Some((mut buf, ts)) => {
                if let Some(block) = buf.payload_mut() {
                    for sample in &mut block.samples {
                        *sample *= self.gain;
                    }
                }
                self.out.send(buf.into_owned(), ts);
                Status::Normal
            }
            None if self.input.eos() => {
                self.out.set_eos(true);
                Status::Finish
            }
            None => Status::Noop,
        }
    }
}

/// Counts delivered blocks and samples.
struct BlockSink {
    input: Arc<InputPort<SampleBlock>>,
    totals: Arc<Mutex<(u64, f64)>>,
}

impl Worker for BlockSink {
    fn process(&mut self) -> Status {
        match self.input.get_data() {
            Some((buf, _ts)) => {
                let mut totals = self.totals.lock();
                totals.0 += 1;
                totals.1 += buf.samples.iter().map(|s| f64::from(*s)).sum::<f64>();
                Status::Normal
            }
            None if self.input.eos() => Status::Finish,
            None => Status::Noop,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _guard = LoggerConfig::from_env().init()?;

    let totals = Arc::new(Mutex::new((0u64, 0.0f64)));

    let source_out = Arc::new(OutputPort::<SampleBlock>::exclusive("out"));
    let source = Component::new(
        "source",
        BlockSource {
            out: source_out.clone(),
            produced: 0,
            total: 200,
        },
    )
    .with_port(source_out);

    let gain_in = Arc::new(InputPort::<SampleBlock>::exclusive("in"));
    let gain_out = Arc::new(OutputPort::<SampleBlock>::shared("out"));
    let gain = Component::new(
        "gain",
        GainStage {
            input: gain_in.clone(),
            out: gain_out.clone(),
            gain: 1.0,
        },
    )
    .with_port(gain_in)
    .with_port(gain_out);
    gain.set_property("gain", 0.5f32);

    let sink_in = Arc::new(InputPort::<SampleBlock>::shared("in"));
    let sink = Component::new(
        "sink",
        BlockSink {
            input: sink_in.clone(),
            totals: totals.clone(),
        },
    )
    .with_port(sink_in);

    let mut app = Application::new("demo-pipeline");
    let source = app.add_component(source);
    let gain = app.add_component(gain);
    let sink = app.add_component(sink);

    assert!(source.connect("out", &gain, "in"));
    assert!(gain.connect("out", &sink, "in"));

    tracing::info!("{}", serde_json::to_string_pretty(&app.describe())?);

    app.initialize();
    app.start();
    while totals.lock().0 < 200 {
        thread::sleep(Duration::from_millis(10));
    }
    app.stop();

    let totals = totals.lock();
    tracing::info!(blocks = totals.0, sample_sum = totals.1, "pipeline drained");
    Ok(())
}
