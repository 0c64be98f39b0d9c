//! Random free port selection.

use std::net::{Ipv4Addr, TcpListener};
use std::ops::RangeInclusive;

use rand::Rng;

use crate::error::{LocalError, Result};

/// Ports DynamoDB Local may be started on.
pub const PORT_RANGE: RangeInclusive<u16> = 25000..=55000;

const MAX_ATTEMPTS: u32 = 100;

/// Draws a port from [`PORT_RANGE`].
pub fn candidate(rng: &mut impl Rng) -> u16 {
    rng.random_range(PORT_RANGE)
}

/// Whether nothing is listening on `port` on the loopback interface.
pub fn is_free(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// Picks a random port in [`PORT_RANGE`] that is free right now.
pub fn random_port() -> Result<u16> {
    let mut rng = rand::rng();
    for _ in 0..MAX_ATTEMPTS {
        let port = candidate(&mut rng);
        if is_free(port) {
            return Ok(port);
        }
        tracing::debug!(port, "Port in use, trying another");
    }

    Err(LocalError::NoFreePort {
        start: *PORT_RANGE.start(),
        end: *PORT_RANGE.end(),
        attempts: MAX_ATTEMPTS,
    })
}
