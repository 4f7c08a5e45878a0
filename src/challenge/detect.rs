//! Challenge detection.

use crate::transport::ApiFailure;

/// True when the failure body carries the challenge marker.
///
/// The body flag alone decides, whatever the status code. A bare 403 with no
/// marker is an ordinary failure, and a flagged 500 is still a challenge.
pub fn needs_challenge(failure: &ApiFailure) -> bool {
    failure.body().is_some_and(|body| body.need_challenge)
}
