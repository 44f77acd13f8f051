//! Observability setup for personachat: structured logging and optional
//! OpenTelemetry trace export.

pub mod tracing_setup;
