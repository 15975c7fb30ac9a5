//! Internal constants for fetching.

use std::ops::Range;
use std::time::Duration;

/// Default HTTP timeout for GET requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status codes treated as success. Redirect codes count, as in XHR.
pub(crate) const SUCCESS_STATUS: Range<u16> = 200..400;
