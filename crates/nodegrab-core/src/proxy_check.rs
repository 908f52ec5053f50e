//! Proxy validation against an IP-echo endpoint.
//!
//! A proxy counts as usable only when a probe through it succeeds AND the
//! reported egress address differs from a direct call's. Identical addresses
//! mean the proxy is passing traffic through unchanged (or not at all).

use crate::transport::{truncate_msg, FetchError, RequestOptions, Transport};
use serde::Deserialize;
use std::time::Duration;

/// Service reporting the caller's apparent source address.
pub const IP_ECHO_URL: &str = "https://httpbin.org/ip";

/// Outcome of one probe. Ephemeral; whether to apply or persist the proxy is
/// entirely the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyProbe {
    pub usable: bool,
    /// Egress address seen through the proxy, when the probe got that far.
    pub observed_address: Option<String>,
}

impl ProxyProbe {
    fn unusable() -> Self {
        Self {
            usable: false,
            observed_address: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpEcho {
    origin: String,
}

/// Probe `proxy` with a pair of IP-echo requests (through it, then direct).
///
/// Never returns an error: any timeout, connection failure, non-2xx status,
/// or unparseable body is folded into `usable = false`. An empty or
/// malformed proxy address short-circuits without touching the network.
pub fn probe(transport: &dyn Transport, proxy: &str, timeout: Duration) -> ProxyProbe {
    let proxy = proxy.trim();
    if proxy.is_empty() {
        tracing::debug!("no proxy configured, skipping validation");
        return ProxyProbe::unusable();
    }
    if let Err(e) = url::Url::parse(proxy) {
        tracing::warn!("proxy address {} does not parse: {}", proxy, e);
        return ProxyProbe::unusable();
    }

    let proxied = match echo(
        transport,
        &RequestOptions::new(Some(proxy.to_string()), timeout),
    ) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!(
                "proxy probe through {} failed: {}",
                proxy,
                truncate_msg(&e.to_string(), 50)
            );
            return ProxyProbe::unusable();
        }
    };

    let direct = match echo(transport, &RequestOptions::direct(timeout)) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!(
                "direct probe failed, cannot compare egress: {}",
                truncate_msg(&e.to_string(), 50)
            );
            return ProxyProbe {
                usable: false,
                observed_address: Some(proxied),
            };
        }
    };

    if proxied == direct {
        tracing::warn!("proxy {} not in effect, egress unchanged ({})", proxy, direct);
        return ProxyProbe {
            usable: false,
            observed_address: Some(proxied),
        };
    }

    tracing::info!("proxy {} usable, egress {}", proxy, proxied);
    ProxyProbe {
        usable: true,
        observed_address: Some(proxied),
    }
}

fn echo(transport: &dyn Transport, opts: &RequestOptions) -> Result<String, FetchError> {
    let body = transport.get(IP_ECHO_URL, opts)?;
    let parsed: IpEcho =
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(parsed.origin)
}
