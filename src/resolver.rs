//! DOI landing-page resolution.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Gave up resolving {doi} after {attempts} attempts")]
    Exhausted { doi: String, attempts: u32 },

    #[error("Resolver HTTP error: {0}")]
    Http(String),
}

/// Turns a DOI into the URL it redirects to.
pub trait DoiResolver {
    /// `Ok(None)` when the DOI is not registered.
    fn landing_page(&self, doi: &str) -> Result<Option<String>, ResolveError>;
}

/// Resolver that never looks anything up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl DoiResolver for NoResolver {
    fn landing_page(&self, _doi: &str) -> Result<Option<String>, ResolveError> {
        Ok(None)
    }
}

/// Calls `attempt_fn` until it succeeds, a non-transient error comes back or
/// `max_retries` retries have been spent, sleeping `delay` in between.
pub(crate) fn retry_fixed<T>(
    doi: &str,
    max_retries: u32,
    delay: std::time::Duration,
    mut attempt_fn: impl FnMut() -> Result<T, Attempt>,
) -> Result<T, ResolveError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(Attempt::Fatal(message)) => return Err(ResolveError::Http(message)),
            Err(Attempt::Transient(message)) if attempt < max_retries => {
                attempt += 1;
                log::warn!("{doi}: attempt {attempt}/{max_retries} failed: {message}, retrying...");
                std::thread::sleep(delay);
            }
            Err(Attempt::Transient(message)) => {
                log::error!("{doi}: failed permanently: {message}");
                return Err(ResolveError::Exhausted {
                    doi: doi.to_string(),
                    attempts: attempt + 1,
                });
            }
        }
    }
}

/// Outcome of one failed resolution attempt.
#[derive(Debug)]
pub(crate) enum Attempt {
    Transient(String),
    Fatal(String),
}

#[cfg(feature = "http")]
pub use http::HttpResolver;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::StatusCode;
    use reqwest::blocking::Client;

    use super::{Attempt, DoiResolver, ResolveError, retry_fixed};

    /// Follows the doi.org redirect chain with `reqwest::blocking`.
    #[derive(Debug, Clone)]
    pub struct HttpResolver {
        client: Client,
        max_retries: u32,
        delay: Duration,
    }

    impl HttpResolver {
        pub fn new(timeout: Duration, max_retries: u32, delay: Duration) -> Result<Self, ResolveError> {
            let client = Client::builder()
                .timeout(timeout)
                .user_agent(format!("bibingest/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|err| ResolveError::Http(err.to_string()))?;
            Ok(Self {
                client,
                max_retries,
                delay,
            })
        }
    }

    impl DoiResolver for HttpResolver {
        fn landing_page(&self, doi: &str) -> Result<Option<String>, ResolveError> {
            retry_fixed(doi, self.max_retries, self.delay, || {
                let response = self.client.get(doi).send().map_err(|err| {
                    if err.is_connect() || err.is_timeout() || err.is_request() {
                        Attempt::Transient(err.to_string())
                    } else {
                        Attempt::Fatal(err.to_string())
                    }
                })?;
                match response.status() {
                    StatusCode::NOT_FOUND => Ok(None),
                    status if status.is_server_error() => {
                        Err(Attempt::Transient(format!("status {status}")))
                    }
                    _ => Ok(Some(response.url().to_string())),
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_retry_until_success() {
        let mut calls = 0;
        let result = retry_fixed("10.1/x", 5, Duration::ZERO, || {
            calls += 1;
            if calls < 3 {
                Err(Attempt::Transient("timeout".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn test_retry_exhausted() {
        let result: Result<(), _> = retry_fixed("10.1/x", 5, Duration::ZERO, || {
            Err(Attempt::Transient("timeout".into()))
        });
        assert_eq!(
            result,
            Err(ResolveError::Exhausted {
                doi: "10.1/x".into(),
                attempts: 6
            })
        );
    }

    #[test]
    fn test_fatal_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = retry_fixed("10.1/x", 5, Duration::ZERO, || {
            calls += 1;
            Err(Attempt::Fatal("bad url".into()))
        });
        assert_eq!(calls, 1);
        assert_eq!(result, Err(ResolveError::Http("bad url".into())));
    }

    #[test]
    fn test_no_resolver() {
        assert_eq!(NoResolver.landing_page("https://doi.org/10.1/x"), Ok(None));
    }
}
