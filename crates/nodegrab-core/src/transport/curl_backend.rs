//! libcurl-backed transport: one Easy handle per request.

use super::{FetchError, RequestOptions, Transport, USER_AGENT};

/// Real transport used outside of tests. Stateless; every `get` builds a
/// fresh Easy handle so proxy/timeout settings never leak between requests.
#[derive(Debug, Default)]
pub struct CurlTransport;

impl CurlTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for CurlTransport {
    fn get(&self, url: &str, opts: &RequestOptions) -> Result<String, FetchError> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)
            .map_err(|e| FetchError::Connect(format!("invalid URL: {e}")))?;
        easy.get(true).map_err(curl_err)?;
        easy.useragent(USER_AGENT).map_err(curl_err)?;
        easy.follow_location(true).map_err(curl_err)?;
        easy.max_redirections(10).map_err(curl_err)?;
        easy.timeout(opts.timeout).map_err(curl_err)?;
        // Node-share sources routinely run self-signed certs; verification is
        // off for every request, mirroring the operator's accepted tradeoff.
        easy.ssl_verify_peer(false).map_err(curl_err)?;
        easy.ssl_verify_host(false).map_err(curl_err)?;
        if let Some(proxy) = &opts.proxy {
            // Scheme prefix (http://, socks5://) selects the proxy type.
            easy.proxy(proxy).map_err(curl_err)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_err)?;
            transfer.perform().map_err(curl_err)?;
        }

        let code = easy
            .response_code()
            .map_err(|e| FetchError::Connect(e.to_string()))?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Status(code));
        }

        // Undecodable bytes are replaced rather than failing the fetch; the
        // output file is plain UTF-8 text.
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn curl_err(e: curl::Error) -> FetchError {
    if e.is_operation_timedout() {
        FetchError::Timeout
    } else {
        FetchError::Connect(e.to_string())
    }
}
