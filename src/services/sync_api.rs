use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::StatusResponse;
use std::future::Future;

const STATUS_PATH: &str = "/api/obsidian/sync/";
const DOWNLOAD_PATH: &str = "/api/obsidian/download/";
const DOWNLOAD_SUCCESS_PATH: &str = "/api/obsidian/download-success/";

/// The three export endpoints, keyed by the client credential
pub trait SyncApi: Send + Sync {
    /// Starts the export job if needed and returns its current status
    fn fetch_status(
        &self,
        api_key: &str,
    ) -> impl Future<Output = Result<StatusResponse, AppError>> + Send;

    /// Downloads the finished export archive
    fn download_archive(&self, api_key: &str)
        -> impl Future<Output = Result<Vec<u8>, AppError>> + Send;

    /// Tells the server the archive was merged
    fn acknowledge_download(&self, api_key: &str)
        -> impl Future<Output = Result<(), AppError>> + Send;
}

/// HTTP implementation of [`SyncApi`]
pub struct HttpSyncApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSyncApi {
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(std::time::Duration::from_secs(10))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .user_agent(concat!("rrread-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Transport(format!("Client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, api_key: &str) -> Result<reqwest::Response, AppError> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key)])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "{} returned status: {}",
                url,
                response.status()
            )));
        }
        Ok(response)
    }
}

impl SyncApi for HttpSyncApi {
    async fn fetch_status(&self, api_key: &str) -> Result<StatusResponse, AppError> {
        let response = self.get(STATUS_PATH, api_key).await?;
        response
            .json::<StatusResponse>()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to parse status: {}", e)))
    }

    async fn download_archive(&self, api_key: &str) -> Result<Vec<u8>, AppError> {
        let response = self.get(DOWNLOAD_PATH, api_key).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read archive: {}", e)))?;
        log::info!("Downloaded export archive ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn acknowledge_download(&self, api_key: &str) -> Result<(), AppError> {
        self.get(DOWNLOAD_SUCCESS_PATH, api_key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = ClientConfig {
            base_url: "https://rrread.me/".to_string(),
            ..ClientConfig::default()
        };
        let api = HttpSyncApi::new(&config).unwrap();
        assert_eq!(
            api.endpoint(STATUS_PATH),
            "https://rrread.me/api/obsidian/sync/"
        );
        assert_eq!(
            api.endpoint(DOWNLOAD_SUCCESS_PATH),
            "https://rrread.me/api/obsidian/download-success/"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..ClientConfig::default()
        };
        let api = HttpSyncApi::new(&config).unwrap();

        let result = api.fetch_status("key").await;
        assert!(matches!(result, Err(AppError::Transport(_))));
    }
}
