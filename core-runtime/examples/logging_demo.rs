//! Logging bootstrap walkthrough.
//!
//! Run with:
//! ```bash
//! cargo run --example logging_demo
//! cargo run --example logging_demo -- json
//! cargo run --example logging_demo -- compact "core_runtime=trace"
//! ```

use std::env;
use std::time::Duration;

use bridge_traits::log::LogLevel;
use core_runtime::events::{CoreEvent, EventBus, ScrubEvent};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use core_waveform::SegmentModel;
use tracing::{debug, info, info_span, instrument, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_pii_redaction(true)
        .with_spans(true);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }
    init_logging(config)?;
    info!(?format, "Logging initialized");

    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let model = SegmentModel::default();

    simulate_drag(&model, &bus, Duration::from_secs(200), -500.0).await;
    while let Ok(event) = events.try_recv() {
        info!(severity = ?event.severity(), "{}", event.description());
    }

    info!(
        server = %redact_if_sensitive("authorization", "Bearer abc123"),
        file = %strip_path("/home/me/music/intro.mp3"),
        "Redaction example"
    );
    Ok(())
}

#[instrument(skip(model, bus), fields(duration_secs = duration.as_secs()))]
async fn simulate_drag(model: &SegmentModel, bus: &EventBus, duration: Duration, dx: f32) {
    let span = info_span!("drag", session = 1);
    let _enter = span.enter();

    let offset = model.clamp_offset(dx);
    let segment = model.segment_for_offset(offset);
    let position = model.time_for_segment(segment, duration);
    debug!(offset = offset.px(), segment, "Drag released");

    if bus
        .emit(CoreEvent::Scrub(ScrubEvent::DragEnded {
            session_id: 1,
            segment,
        }))
        .is_err()
    {
        warn!("Nobody is listening");
    }
    info!(position_secs = position.as_secs_f64(), "Seek issued");
}
