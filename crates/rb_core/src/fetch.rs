//! Outbound HTTP shared by every pipeline stage.

use std::path::Path;

use reqwest::{header, Certificate, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::{Error, Result};

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds the client. Problems with the extra trust roots are logged and
    /// the platform defaults are used instead.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| Error::Configuration(format!("Invalid USER_AGENT: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        if let Some(path) = &config.extra_ca_certs_path {
            match load_extra_certificates(path) {
                Ok(certs) => {
                    let builder = certs.into_iter().fold(
                        Client::builder().default_headers(headers.clone()),
                        |builder, cert| builder.add_root_certificate(cert),
                    );
                    match builder.build() {
                        Ok(client) => {
                            debug!("🔐 Loaded extra CA certificates from {}", path.display());
                            return Ok(Self { client });
                        }
                        Err(e) => warn!(
                            "⚠️ Failed to use extra CA certs from {}: {}",
                            path.display(),
                            e
                        ),
                    }
                }
                Err(e) => warn!(
                    "⚠️ Failed to load extra CA certs from {}: {}",
                    path.display(),
                    e
                ),
            }
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("🌐 GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = check_status(url, response)?;
        Ok(response.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!("🌐 GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        let response = check_status(url, response)?;
        decode_json(response).await
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B, bearer: Option<&str>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("🌐 POST {}", url);
        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = check_status(url, request.send().await?)?;
        decode_json(response).await
    }
}

// The error carries the caller's url, never the query string with credentials.
fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

// A body that arrived but does not parse is a serialization problem, not a
// transport one.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Reads a PEM bundle, or a single DER certificate when no PEM markers exist.
pub fn load_extra_certificates(path: &Path) -> Result<Vec<Certificate>> {
    let raw = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&raw);

    if !text.contains(PEM_BEGIN) {
        return Ok(vec![Certificate::from_der(&raw)?]);
    }

    let certs = pem_blocks(&text)
        .into_iter()
        .map(|block| Certificate::from_pem(block.as_bytes()))
        .collect::<reqwest::Result<Vec<_>>>()?;
    if certs.is_empty() {
        return Err(Error::Configuration(format!(
            "No complete certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn pem_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(PEM_BEGIN) {
        let Some(end) = rest[start..].find(PEM_END) else {
            break;
        };
        let stop = start + end + PEM_END.len();
        blocks.push(&rest[start..stop]);
        rest = &rest[stop..];
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use std::io::Write;

    #[test]
    fn test_pem_blocks() {
        let text = format!(
            "junk\n{b}\nAAAA\n{e}\n{b}\nBBBB\n{e}\n{b}\nunterminated",
            b = PEM_BEGIN,
            e = PEM_END
        );
        let blocks = pem_blocks(&text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("AAAA"));
        assert!(blocks[1].contains("BBBB"));
    }

    #[test]
    fn test_missing_ca_file_degrades_to_default_roots() {
        let config = FetchConfig {
            extra_ca_certs_path: Some("/definitely/not/here.pem".into()),
            ..Default::default()
        };
        assert!(Fetcher::new(&config).is_ok());
    }

    #[test]
    fn test_malformed_ca_file_degrades_to_default_roots() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}\nnot base64 at all\n{}", PEM_BEGIN, PEM_END).unwrap();

        let config = FetchConfig {
            extra_ca_certs_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(Fetcher::new(&config).is_ok());
    }

    const TEST_ROOT_PEM: &str = include_str!("../tests/fixtures/test_root.pem");
    const TEST_ROOT_DER: &[u8] = include_bytes!("../tests/fixtures/test_root.der");

    fn ca_config(file: &tempfile::NamedTempFile) -> FetchConfig {
        FetchConfig {
            extra_ca_certs_path: Some(file.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_pem_bundle_loads_every_certificate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# extra roots\n{}{}", TEST_ROOT_PEM, TEST_ROOT_PEM).unwrap();

        let certs = load_extra_certificates(file.path()).unwrap();
        assert_eq!(certs.len(), 2);
        assert!(Fetcher::new(&ca_config(&file)).is_ok());
    }

    #[test]
    fn test_der_certificate_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEST_ROOT_DER).unwrap();

        let certs = load_extra_certificates(file.path()).unwrap();
        assert_eq!(certs.len(), 1);
        assert!(Fetcher::new(&ca_config(&file)).is_ok());
    }

    #[tokio::test]
    async fn test_fetcher_with_extra_roots_still_fetches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", TEST_ROOT_PEM).unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let fetcher = Fetcher::new(&ca_config(&file)).unwrap();
        let body = fetcher.get_text(&format!("{}/ok", server.url())).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_serialization_error() {
        #[derive(serde::Deserialize, Debug)]
        struct Reply {
            #[allow(dead_code)]
            ok: bool,
        }

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<html>rate limited</html>")
            .create_async()
            .await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("{\"ok\": ")
            .create_async()
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher
            .get_json::<Reply>(&format!("{}/search.json", server.url()), &[("q", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(!err.is_transport());

        let err = fetcher
            .post_json::<_, Reply>(&format!("{}/chat/completions", server.url()), &serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_get_text_sends_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/blogs/")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .with_status(200)
            .with_body("<html></html>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let body = fetcher
            .get_text(&format!("{}/blogs/", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher
            .get_text(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, Error::Status { status: 404, .. }));
    }
}
