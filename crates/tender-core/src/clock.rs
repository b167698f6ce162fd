//! Creation timestamps that never repeat within the process.
//!
//! Listings are ordered by `created_at`, so two records created on the same
//! clock tick must still get distinct, increasing timestamps.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_NANOS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Returns the current time, moved one nanosecond past the previous result
/// when the wall clock has not advanced since then.
pub(crate) fn creation_time() -> DateTime<Utc> {
	let now = Utc::now();
	let Some(now_nanos) = now.timestamp_nanos_opt() else {
		return now;
	};

	let mut last = LAST_NANOS.load(Ordering::Acquire);
	loop {
		let next = now_nanos.max(last.saturating_add(1));
		match LAST_NANOS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire) {
			Ok(_) => return DateTime::from_timestamp_nanos(next),
			Err(actual) => last = actual,
		}
	}
}
