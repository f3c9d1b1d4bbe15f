//! Publish progress tracking for real-time SSE updates.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tokio::sync::broadcast;
use uuid::Uuid;

static RE_PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());
static RE_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)/(\d+)\)").unwrap());
static RE_BYTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*(bytes?|[KMGT]iB|[KMGT]B)").unwrap());
static RE_SPEED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*([\d.]+)\s*([KMGT]?i?B)/s").unwrap());

/// Phase of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishPhase {
    Starting,
    Cloning,
    CheckingOut,
    /// Writing the bundle into the working tree.
    Copying,
    StagingFiles,
    Committing,
    Pushing,
    // Transfer phases reported by git itself.
    Counting,
    Compressing,
    Writing,
    Receiving,
    Resolving,
    CleaningUp,
    Completed,
    Failed,
}

impl PublishPhase {
    /// Whether the publish has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishPhase::Completed | PublishPhase::Failed)
    }
}

impl std::fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishPhase::Starting => write!(f, "Starting..."),
            PublishPhase::Cloning => write!(f, "Cloning repository..."),
            PublishPhase::CheckingOut => write!(f, "Checking out branch..."),
            PublishPhase::Copying => write!(f, "Copying files..."),
            PublishPhase::StagingFiles => write!(f, "Staging files..."),
            PublishPhase::Committing => write!(f, "Committing..."),
            PublishPhase::Pushing => write!(f, "Pushing..."),
            PublishPhase::Counting => write!(f, "Counting objects..."),
            PublishPhase::Compressing => write!(f, "Compressing objects..."),
            PublishPhase::Writing => write!(f, "Writing objects..."),
            PublishPhase::Receiving => write!(f, "Receiving objects..."),
            PublishPhase::Resolving => write!(f, "Resolving deltas..."),
            PublishPhase::CleaningUp => write!(f, "Cleaning up..."),
            PublishPhase::Completed => write!(f, "Completed"),
            PublishPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// A publish progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishProgressEvent {
    /// Identifies one publish; all events of a publish share it.
    pub operation_id: String,
    pub phase: PublishPhase,
    pub message: String,
    /// Progress percentage (0-100), if determinable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_transferred: Option<u64>,
    /// Bytes per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PublishProgressEvent {
    pub fn new(operation_id: &str, phase: PublishPhase, message: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            phase,
            message: message.to_string(),
            progress: None,
            current: None,
            total: None,
            bytes_transferred: None,
            transfer_speed: None,
            raw_output: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn completed(operation_id: &str, message: &str) -> Self {
        let mut event = Self::new(operation_id, PublishPhase::Completed, message);
        event.progress = Some(100);
        event
    }

    pub fn failed(operation_id: &str, error: &str) -> Self {
        let mut event = Self::new(operation_id, PublishPhase::Failed, "Publish failed");
        event.error = Some(error.to_string());
        event
    }

    pub fn with_progress(mut self, current: u64, total: u64) -> Self {
        self.current = Some(current);
        self.total = Some(total);
        if total > 0 {
            self.progress = Some(((current * 100) / total).min(100) as u8);
        }
        self
    }

    pub fn with_transfer(mut self, bytes: u64, speed: Option<u64>) -> Self {
        self.bytes_transferred = Some(bytes);
        self.transfer_speed = speed;
        self
    }

    pub fn with_raw_output(mut self, output: &str) -> Self {
        self.raw_output = Some(output.to_string());
        self
    }
}

/// Progress information extracted from one line of git output.
#[derive(Debug, Clone, Default)]
pub struct ParsedProgress {
    pub phase: Option<PublishPhase>,
    pub current: Option<u64>,
    pub total: Option<u64>,
    pub percentage: Option<u8>,
    pub bytes: Option<u64>,
    pub speed: Option<u64>,
}

/// Parses a git `--progress` line.
///
/// Recognized shapes:
/// - `Counting objects: 100% (10/10), done.`
/// - `Compressing objects:  50% (5/10)`
/// - `Writing objects:  33% (1/3), 256 bytes | 256.00 KiB/s`
/// - `Receiving objects:  75% (75/100), 1.00 MiB | 512.00 KiB/s`
/// - `Resolving deltas: 100% (5/5), done.`
///
/// Clone prefixes lines with `remote: `; that is ignored.
pub fn parse_git_progress(line: &str) -> ParsedProgress {
    let mut result = ParsedProgress::default();

    let line_lower = line.to_lowercase();
    if line_lower.contains("counting") || line_lower.contains("enumerating") {
        result.phase = Some(PublishPhase::Counting);
    } else if line_lower.contains("compressing") {
        result.phase = Some(PublishPhase::Compressing);
    } else if line_lower.contains("writing") {
        result.phase = Some(PublishPhase::Writing);
    } else if line_lower.contains("receiving") || line_lower.contains("unpacking") {
        result.phase = Some(PublishPhase::Receiving);
    } else if line_lower.contains("resolving") {
        result.phase = Some(PublishPhase::Resolving);
    }

    if let Some(caps) = RE_PERCENTAGE.captures(line) {
        result.percentage = caps.get(1).and_then(|m| m.as_str().parse().ok());
    }

    if let Some(caps) = RE_COUNT.captures(line) {
        if let (Some(current), Some(total)) = (caps.get(1), caps.get(2)) {
            result.current = current.as_str().parse().ok();
            result.total = total.as_str().parse().ok();
        }
    }

    if let Some(caps) = RE_BYTES.captures(line) {
        if let (Some(num), Some(unit)) = (caps.get(1), caps.get(2)) {
            if let Ok(num) = num.as_str().parse::<f64>() {
                result.bytes = Some((num * unit_multiplier(unit.as_str())) as u64);
            }
        }
    }

    if let Some(caps) = RE_SPEED.captures(line) {
        if let (Some(num), Some(unit)) = (caps.get(1), caps.get(2)) {
            if let Ok(num) = num.as_str().parse::<f64>() {
                result.speed = Some((num * unit_multiplier(unit.as_str())) as u64);
            }
        }
    }

    result
}

fn unit_multiplier(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "kib" | "kb" => 1024.0,
        "mib" | "mb" => 1024.0 * 1024.0,
        "gib" | "gb" => 1024.0 * 1024.0 * 1024.0,
        "tib" | "tb" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    }
}

/// Reports progress for a single publish.
pub struct PublishProgress {
    operation_id: String,
    sender: Arc<broadcast::Sender<PublishProgressEvent>>,
}

impl PublishProgress {
    pub fn new(sender: Arc<broadcast::Sender<PublishProgressEvent>>) -> Self {
        Self {
            operation_id: Uuid::new_v4().to_string(),
            sender,
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn phase(&self, phase: PublishPhase, message: &str) {
        self.send(PublishProgressEvent::new(&self.operation_id, phase, message));
    }

    /// Forwards a line of git stderr. Lines without a recognizable transfer
    /// phase are dropped.
    pub fn git_output(&self, line: &str) {
        let parsed = parse_git_progress(line);
        let Some(phase) = parsed.phase else {
            return;
        };

        let mut event = PublishProgressEvent::new(&self.operation_id, phase, &phase.to_string());
        if let (Some(current), Some(total)) = (parsed.current, parsed.total) {
            event = event.with_progress(current, total);
        } else if let Some(pct) = parsed.percentage {
            event.progress = Some(pct);
        }
        if let Some(bytes) = parsed.bytes {
            event = event.with_transfer(bytes, parsed.speed);
        }

        self.send(event.with_raw_output(line));
    }

    pub fn completed(&self, message: &str) {
        self.send(PublishProgressEvent::completed(&self.operation_id, message));
    }

    pub fn failed(&self, error: &str) {
        self.send(PublishProgressEvent::failed(&self.operation_id, error));
    }

    fn send(&self, event: PublishProgressEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}
