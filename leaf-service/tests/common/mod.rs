#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use leaf_service::config::{GeminiSettings, LeafConfig, LimitsConfig, StorageConfig};
use leaf_service::services::providers::MockProvider;
use leaf_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub const ANALYSIS_REPLY: &str = "```json\n{\"plant\": \"Tomato\", \"suggestion\": \"Remove yellowing leaves.\\nWater at the base.\", \"thresholds\": {\"yellow_max\": 8, \"brown_max\": 4, \"solidity_min\": 90}}\n```";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub provider: Arc<MockProvider>,
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockProvider::replying(ANALYSIS_REPLY)).await
    }

    pub async fn spawn_with(provider: MockProvider) -> Self {
        service_core::observability::init_metrics();

        let run_id = Uuid::new_v4();
        let upload_dir = PathBuf::from(format!("target/test-uploads-{}", run_id));
        let report_dir = PathBuf::from(format!("target/test-reports-{}", run_id));

        let config = LeafConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
                log_level: "debug".to_string(),
            },
            gemini: GeminiSettings {
                api_key: "test-key".to_string(),
                api_base: "http://127.0.0.1:9".to_string(),
                chat_model: "gemini-2.0-flash-001".to_string(),
                vision_model: "gemini-2.0-flash".to_string(),
                timeout_secs: 5,
            },
            storage: StorageConfig {
                upload_dir: upload_dir.display().to_string(),
                report_dir: report_dir.display().to_string(),
            },
            limits: LimitsConfig {
                body_limit_bytes: 16 * 1024 * 1024,
            },
            otlp_endpoint: None,
        };

        let provider = Arc::new(provider);
        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            client,
            provider,
            upload_dir,
            report_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn upload(&self, bytes: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("leaf.png")
            .mime_str("image/png")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("file", part);

        self.client
            .post(self.url("/analyze"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub fn report_files(&self) -> Vec<String> {
        std::fs::read_dir(&self.report_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
        let _ = std::fs::remove_dir_all(&self.report_dir);
    }
}

/// PNG of a single flat color.
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
