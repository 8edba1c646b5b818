//! Span timing for the search hot paths.
//!
//! Compiled only with `--features instrumentation`. Functions marked with
//! `#[cfg_attr(feature = "instrumentation", instrument(skip_all))]` report
//! into a per-thread table, and `print_timing_statistics` merges the tables
//! once a command finishes.

use std::cmp::Reverse;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use thread_local::ThreadLocal;
use tracing::span;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// (calls, total nanoseconds) per span name.
type SpanTimings = FxHashMap<&'static str, (u64, u64)>;

// Root-parallel search enters spans on rayon threads, so every thread
// fills its own table and the lock is only contended while printing.
static THREAD_TIMINGS: Lazy<ThreadLocal<Mutex<SpanTimings>>> = Lazy::new(ThreadLocal::new);

struct TimingLayer;

impl<S> Layer<S> for TimingLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(Instant::now());
        }
    }

    fn on_exit(&self, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let Some(started) = span.extensions_mut().remove::<Instant>() else {
            return;
        };
        let elapsed = started.elapsed().as_nanos() as u64;

        let cell = THREAD_TIMINGS.get_or(|| Mutex::new(SpanTimings::default()));
        let mut timings = cell.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = timings.entry(span.name()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += elapsed;
    }
}

/// Installs the timing layer. With RUST_LOG unset or `off` spans are only
/// timed; otherwise span events are printed as well.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_default();

    let result = if env_filter.is_empty() || env_filter == "off" {
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("trace"))
            .with(TimingLayer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(false)
            .compact();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(TimingLayer)
            .with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(error) = result {
        eprintln!("failed to install the timing subscriber: {}", error);
    }
}

fn merged_timings() -> Vec<(&'static str, (u64, u64))> {
    let mut merged = SpanTimings::default();
    for cell in THREAD_TIMINGS.iter() {
        let timings = cell.lock().unwrap_or_else(PoisonError::into_inner);
        for (name, (calls, nanos)) in timings.iter() {
            let entry = merged.entry(*name).or_insert((0, 0));
            entry.0 += calls;
            entry.1 += nanos;
        }
    }

    let mut entries: Vec<_> = merged.into_iter().collect();
    entries.sort_by_key(|(_, (_, nanos))| Reverse(*nanos));
    entries
}

/// Prints call count, total and average time of every span, slowest
/// first, to stderr.
pub fn print_timing_statistics() {
    let entries = merged_timings();
    if entries.is_empty() {
        eprintln!("\nNo timing data collected.");
        return;
    }

    eprintln!("\n{:=<80}", "");
    eprintln!("Span timings (sorted by total time)");
    eprintln!("{:=<80}", "");
    eprintln!(
        "{:<40} {:>12} {:>12} {:>12}",
        "Span", "Calls", "Total (ms)", "Avg (µs)"
    );
    eprintln!("{:-<80}", "");

    let mut total_nanos = 0u64;
    for (name, (calls, nanos)) in entries.iter().filter(|(_, (calls, _))| *calls > 0) {
        total_nanos += nanos;
        eprintln!(
            "{:<40} {:>12} {:>12.2} {:>12.2}",
            name,
            calls,
            *nanos as f64 / 1_000_000.0,
            *nanos as f64 / *calls as f64 / 1_000.0
        );
    }

    eprintln!("{:-<80}", "");
    eprintln!(
        "Total instrumented time: {:.2} ms\n",
        total_nanos as f64 / 1_000_000.0
    );
}
