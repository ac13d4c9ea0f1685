//! Progress tracking for downloads

use std::time::Duration;

/// Progress of a single file transfer
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Advertised size; `None` when the server sent no Content-Length
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: u64,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
    pub status: DownloadStatus,
}

impl DownloadProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            total_bytes: total_bytes.filter(|&t| t > 0),
            downloaded_bytes: 0,
            speed: 0.0,
            eta: None,
            status: DownloadStatus::Initializing,
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;
        self.status = DownloadStatus::Downloading;

        self.eta = match self.total_bytes {
            Some(total) if downloaded_bytes >= total => Some(Duration::from_secs(0)),
            Some(total) if speed > 0.0 => Some(Duration::from_secs_f64(
                (total - downloaded_bytes) as f64 / speed,
            )),
            _ => None,
        };
    }

    /// Mark as completed
    pub fn complete(&mut self) {
        self.status = DownloadStatus::Completed;
        self.eta = Some(Duration::from_secs(0));
    }

    /// Mark as failed
    pub fn failed(&mut self, error: String) {
        self.status = DownloadStatus::Failed(error);
    }

    /// Progress between 0.0 and 1.0, only when the total is known
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes
            .map(|total| (self.downloaded_bytes as f64 / total as f64).min(1.0))
    }
}

/// Download status
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadStatus {
    #[default]
    Initializing,
    Downloading,
    Completed,
    Failed(String),
}
