//! Per-request/per-response log files under `log_directory`, date/time partitioned,
//! alongside the structured `tracing` events emitted at each stage.

use std::io::Write;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

fn timestamped_path(log_directory: &Path, subdir: &str) -> std::io::Result<PathBuf> {
    let now = OffsetDateTime::now_utc();
    let date = now
        .format(&time::format_description::well_known::Iso8601::DATE)
        .unwrap_or_else(|_| "unknown-date".to_string());
    let dir = log_directory.join(subdir).join(date);
    std::fs::create_dir_all(&dir)?;
    let stamp = format!("{}-{:09}", now.unix_timestamp(), now.nanosecond());
    Ok(dir.join(format!("{stamp}.log")))
}

pub fn log_request(log_directory: &Path, method: &str, query: &str, remote_ip: &str) {
    let Ok(path) = timestamped_path(log_directory, "requests") else {
        tracing::warn!("failed to prepare request log directory");
        return;
    };
    if let Ok(mut file) = std::fs::File::create(&path) {
        let _ = writeln!(file, "remote: {remote_ip}\nmethod: {method}\nquery:\n{query}");
    }
    tracing::info!(method, remote_ip, "received query");
}

pub fn log_response(log_directory: &Path, status: u16, body_len: usize) {
    let Ok(path) = timestamped_path(log_directory, "responses") else {
        tracing::warn!("failed to prepare response log directory");
        return;
    };
    if let Ok(mut file) = std::fs::File::create(&path) {
        let _ = writeln!(file, "status: {status}\nbody_len: {body_len}");
    }
    tracing::info!(status, body_len, "sent response");
}
