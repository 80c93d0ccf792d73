use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestStats {
    pub file_count: u64,
    pub total_size: u64,
}

impl ManifestStats {
    pub fn add_object(&mut self, size: u64) {
        self.file_count += 1;
        self.total_size += size;
    }
}

#[derive(Debug, Clone)]
pub struct CommandStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub bytes_written: u64,
    pub files_created: u64,
    pub files_failed: u64,
}

impl CommandStats {
    pub fn new() -> Self {
        CommandStats {
            start_time: Utc::now(),
            end_time: None,
            bytes_written: 0,
            files_created: 0,
            files_failed: 0,
        }
    }

    pub fn end(&mut self) -> Duration {
        let end_time = Utc::now();
        self.end_time = Some(end_time);
        self.elapsed_time()
    }

    pub fn elapsed_time(&self) -> Duration {
        let end_time = self.end_time.unwrap_or_else(Utc::now);
        (end_time - self.start_time).to_std().unwrap_or_default()
    }
}

impl Default for CommandStats {
    fn default() -> Self {
        CommandStats::new()
    }
}
