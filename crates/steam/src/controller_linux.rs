//! Linux Steam process probe.

/// Process names the Steam client runs under (native and Flatpak/Snap wrappers).
const STEAM_PROCESS_NAMES: [&str; 2] = ["steam", "steamwebhelper"];

/// Checks if Steam is running via `pgrep -x`.
pub async fn is_running() -> bool {
    for name in STEAM_PROCESS_NAMES {
        let output = tokio::process::Command::new("pgrep")
            .args(["-x", name])
            .output()
            .await;

        if let Ok(o) = output
            && o.status.success()
            && !o.stdout.is_empty()
        {
            return true;
        }
    }
    false
}
