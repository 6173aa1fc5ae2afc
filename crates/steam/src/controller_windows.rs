//! Windows Steam process probe.

/// Checks if Steam is running via `tasklist`.
pub async fn is_running() -> bool {
    let output = tokio::process::Command::new("tasklist")
        .args(["/FI", "IMAGENAME eq steam.exe", "/NH"])
        .output()
        .await;

    match output {
        Ok(o) => String::from_utf8_lossy(&o.stdout)
            .to_lowercase()
            .contains("steam.exe"),
        Err(_) => false,
    }
}
