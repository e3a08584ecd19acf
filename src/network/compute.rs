// src/network/compute.rs
use crate::utils::error::ClientError;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Result of a remote hash computation
#[derive(Debug, Clone, PartialEq)]
pub struct HashOutcome {
    /// 64-char lowercase hex digest
    pub hash_hex: String,
    /// Seconds spent by the hash engine
    pub computation_time: f64,
}

/// Request/response access to the random source and the hash engine
///
/// Implementations never retry; retry policy belongs to the mining loop.
pub trait ComputeService: Send + Sync + 'static {
    /// Fetches one random number from the random source
    fn fetch_random(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Asks the hash engine to hash `number` with `difficulty` rounds
    fn compute_hash(
        &self,
        number: u64,
        difficulty: u32,
    ) -> impl Future<Output = Result<HashOutcome, ClientError>> + Send;
}

#[derive(Debug, Deserialize)]
struct RandomReply {
    number: u64,
}

#[derive(Debug, Serialize)]
struct HashRequest {
    number: u64,
    complexity: u32,
}

#[derive(Debug, Deserialize)]
struct HashReply {
    input_number: u64,
    hash_result: String,
    computation_time: f64,
}

/// HTTP client for the two collaborator services
#[derive(Debug, Clone)]
pub struct HttpComputeClient {
    client: Client,
    random_url: Url,
    hash_url: Url,
}

impl HttpComputeClient {
    /// Creates a client for the given base URLs
    ///
    /// # Arguments
    /// * `rng_base` - Base URL of the random source (e.g. "http://rng:8000")
    /// * `hasher_base` - Base URL of the hash engine
    /// * `timeout` - Upper bound for each individual request
    pub fn new(rng_base: &Url, hasher_base: &Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(HttpComputeClient {
            client,
            random_url: endpoint(rng_base, "random")?,
            hash_url: endpoint(hasher_base, "hash")?,
        })
    }

    /// Full URL used for random number requests
    #[cfg(test)]
    pub(crate) fn random_url(&self) -> &Url {
        &self.random_url
    }

    /// Full URL used for hash requests
    #[cfg(test)]
    pub(crate) fn hash_url(&self) -> &Url {
        &self.hash_url
    }
}

impl ComputeService for HttpComputeClient {
    async fn fetch_random(&self) -> Result<u64, ClientError> {
        let response = self.client.get(self.random_url.clone()).send().await?;
        let reply: RandomReply = success(response, "rng")?.json().await?;
        Ok(reply.number)
    }

    async fn compute_hash(&self, number: u64, difficulty: u32) -> Result<HashOutcome, ClientError> {
        let response = self
            .client
            .post(self.hash_url.clone())
            .json(&HashRequest {
                number,
                complexity: difficulty,
            })
            .send()
            .await?;
        let reply: HashReply = success(response, "hasher")?.json().await?;
        validate_hash_reply(number, reply)
    }
}

/// Joins `path` onto a base URL, tolerating a missing trailing slash
fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| ClientError::Malformed(format!("Cannot build {} endpoint: {}", path, e)))
}

fn success(response: Response, service: &'static str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            service,
            status: status.as_u16(),
        })
    }
}

fn validate_hash_reply(number: u64, reply: HashReply) -> Result<HashOutcome, ClientError> {
    if reply.input_number != number {
        return Err(ClientError::Malformed(format!(
            "hash engine answered for {} instead of {}",
            reply.input_number, number
        )));
    }

    let hash = reply.hash_result;
    let is_lower_hex = hash
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if hash.len() != 64 || !is_lower_hex || hex::decode(&hash).is_err() {
        return Err(ClientError::Malformed(format!(
            "hash_result is not a 64-char lowercase hex digest: {:?}",
            hash
        )));
    }

    let time = reply.computation_time;
    if !time.is_finite() || time < 0.0 {
        return Err(ClientError::Malformed(format!(
            "computation_time out of range: {}",
            time
        )));
    }

    Ok(HashOutcome {
        hash_hex: hash,
        computation_time: time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn reply(hash: &str, time: f64) -> HashReply {
        HashReply {
            input_number: 7,
            hash_result: hash.to_string(),
            computation_time: time,
        }
    }

    #[test]
    fn endpoints_join_with_or_without_trailing_slash() {
        let a = Url::parse("http://rng:8000").unwrap();
        let b = Url::parse("http://hasher:8001/api/").unwrap();
        let client = HttpComputeClient::new(&a, &b, Duration::from_secs(1)).unwrap();
        assert_eq!(client.random_url().as_str(), "http://rng:8000/random");
        assert_eq!(client.hash_url().as_str(), "http://hasher:8001/api/hash");

        let nested = Url::parse("http://hasher:8001/api").unwrap();
        assert_eq!(
            endpoint(&nested, "hash").unwrap().as_str(),
            "http://hasher:8001/api/hash"
        );
    }

    #[test]
    fn accepts_well_formed_hash_reply() {
        let outcome = validate_hash_reply(7, reply(DIGEST, 0.25)).unwrap();
        assert_eq!(outcome.hash_hex, DIGEST);
        assert_eq!(outcome.computation_time, 0.25);
    }

    #[test]
    fn rejects_uppercase_or_short_digest() {
        let upper = DIGEST.to_uppercase();
        assert!(matches!(
            validate_hash_reply(7, reply(&upper, 0.1)),
            Err(ClientError::Malformed(_))
        ));
        assert!(matches!(
            validate_hash_reply(7, reply("abc123", 0.1)),
            Err(ClientError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_reply_for_another_number() {
        assert!(matches!(
            validate_hash_reply(8, reply(DIGEST, 0.1)),
            Err(ClientError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_negative_or_nan_time() {
        assert!(validate_hash_reply(7, reply(DIGEST, -0.1)).is_err());
        assert!(validate_hash_reply(7, reply(DIGEST, f64::NAN)).is_err());
    }

    #[test]
    fn decodes_collaborator_payloads() {
        let random: RandomReply = serde_json::from_str(r#"{"number": 4242}"#).unwrap();
        assert_eq!(random.number, 4242);

        let body = format!(
            r#"{{"input_number": 1, "hash_result": "{}", "computation_time": 0.003, "timestamp": "2024-01-01T00:00:00"}}"#,
            DIGEST
        );
        let hash: HashReply = serde_json::from_str(&body).unwrap();
        assert_eq!(hash.hash_result, DIGEST);

        let request = serde_json::to_value(HashRequest {
            number: 5,
            complexity: 3,
        })
        .unwrap();
        assert_eq!(request, serde_json::json!({"number": 5, "complexity": 3}));
    }

    #[tokio::test]
    async fn unreachable_service_is_transient_http_error() {
        // port 9 (discard) is essentially never bound on test hosts
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let client = HttpComputeClient::new(&base, &base, Duration::from_millis(500)).unwrap();
        assert!(matches!(
            client.fetch_random().await,
            Err(ClientError::Http(_))
        ));
        assert!(matches!(
            client.compute_hash(1, 1).await,
            Err(ClientError::Http(_))
        ));
    }
}
