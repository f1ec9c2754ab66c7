//! Foreign Log Forwarding
//!
//! The host registers a callback at startup (the Android binding does this
//! from its JNI init, the iOS binding from app launch) and every `log`
//! record produced on the native side is forwarded through it. Panics are
//! routed into the same channel via `log_panics`, so a crash inside a render
//! call shows up in logcat / os_log instead of vanishing.
//!
//! The callback receives the target and message as owned [`BridgeBuffer`]s
//! and must release both through `shashlik_rustbuffer_free`.

use std::sync::Once;

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::RwLock;

use crate::bridge::buffer::BridgeBuffer;
use crate::bridge::serialize::Lower;

/// Host-side log sink. Levels use the `log` crate numbering:
/// 1 = error, 2 = warn, 3 = info, 4 = debug, 5 = trace.
pub type ForeignLogCallback =
    extern "C" fn(level: i32, target: BridgeBuffer, message: BridgeBuffer);

static FORWARDER: ForeignLogForwarder = ForeignLogForwarder {
    callback: RwLock::new(None),
};
static INSTALL: Once = Once::new();

struct ForeignLogForwarder {
    callback: RwLock<Option<ForeignLogCallback>>,
}

impl Log for ForeignLogForwarder {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && self.callback.read().is_some()
    }

    fn log(&self, record: &Record<'_>) {
        let Some(callback) = *self.callback.read() else {
            return;
        };
        if record.level() > log::max_level() {
            return;
        }
        let target = record.target().lower();
        let message = record.args().to_string().lower();
        callback(record.level() as i32, target, message);
    }

    fn flush(&self) {}
}

/// Map a host-provided level number to a filter. Out-of-range values clamp
/// to the nearest end rather than erroring, matching the original Android
/// init which always requested the most verbose level it knew.
pub fn level_filter_from_i32(level: i32) -> LevelFilter {
    match level {
        i32::MIN..=0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install or replace the host log callback. Passing `None` detaches the
/// current callback; records are then dropped until a new one is installed.
///
/// The `log` logger and the panic hook are installed on the first call and
/// stay in place for the process lifetime.
pub fn install_log_callback(callback: Option<ForeignLogCallback>, max_level: LevelFilter) {
    *FORWARDER.callback.write() = callback;
    log::set_max_level(max_level);
    INSTALL.call_once(|| {
        // Only fails if another logger was installed first; the bridge owns
        // logging in the embedding it is built for, so keep the max level
        // and carry on.
        if log::set_logger(&FORWARDER).is_ok() {
            log_panics::init();
        }
    });
}
