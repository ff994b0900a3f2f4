//! Best-effort DNS SRV discovery.
//!
//! A server may publish `_minecraft._tcp.<host>` pointing at the machine and
//! port that actually serve it. The lookup never fails a query: any error,
//! an empty answer, or cancellation leaves the target unchanged.

use hickory_resolver::TokioAsyncResolver;
use std::io;
use std::net::IpAddr;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::utils::cancel::CancelContext;
use crate::utils::timeout::deadline;

/// Host and port published by an SRV record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvTarget {
    pub hostname: String,
    pub port: u16,
}

/// Record name queried for `hostname`, e.g. `_minecraft._tcp.example.net`.
pub fn srv_name(prefix: &str, hostname: &str) -> String {
    format!("{prefix}.{}", hostname.trim_end_matches('.'))
}

/// Query the first SRV record for `hostname`.
///
/// IP literals have no SRV records and return `Ok(None)` without a lookup.
pub async fn lookup_srv(prefix: &str, hostname: &str) -> Result<Option<SrvTarget>> {
    if hostname.parse::<IpAddr>().is_ok() {
        return Ok(None);
    }

    let resolver = TokioAsyncResolver::tokio_from_system_conf()
        .map_err(|e| ProtocolError::Io(io::Error::other(e)))?;
    let lookup = resolver
        .srv_lookup(srv_name(prefix, hostname))
        .await
        .map_err(|e| ProtocolError::Io(io::Error::other(e)))?;

    Ok(lookup.iter().next().map(|record| SrvTarget {
        hostname: record.target().to_utf8().trim_end_matches('.').to_string(),
        port: record.port(),
    }))
}

/// Resolve `(hostname, port)` through SRV, falling back to the input on any
/// failure. The lookup is bounded by `ctx`.
pub async fn resolve_target(
    prefix: &str,
    hostname: &str,
    port: u16,
    ctx: Option<&CancelContext>,
) -> (String, u16) {
    match deadline(ctx, lookup_srv(prefix, hostname)).await {
        Ok(Some(target)) => {
            debug!(
                from = %hostname,
                to = %target.hostname,
                port = target.port,
                "SRV record redirects target"
            );
            (target.hostname, target.port)
        }
        Ok(None) => (hostname.to_string(), port),
        Err(e) => {
            debug!(error = %e, %hostname, "SRV lookup failed, using original target");
            (hostname.to_string(), port)
        }
    }
}
