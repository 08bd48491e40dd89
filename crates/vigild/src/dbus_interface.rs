use zbus::interface;

use crate::engine::MonitorHandle;

/// Well-known bus name claimed by the daemon.
pub const BUS_NAME: &str = "org.freedesktop.Vigil1";
/// Object path of [`VigilService`].
pub const OBJECT_PATH: &str = "/org/freedesktop/Vigil1";

/// D-Bus session control for the Vigil monitoring daemon.
///
/// Bus name: org.freedesktop.Vigil1
/// Object path: /org/freedesktop/Vigil1
pub struct VigilService {
    pub engine: MonitorHandle,
    pub tick_interval_ms: u64,
}

fn failed(e: impl std::fmt::Display) -> zbus::fdo::Error {
    tracing::error!(error = %e, "engine request failed");
    zbus::fdo::Error::Failed(e.to_string())
}

#[interface(name = "org.freedesktop.Vigil1")]
impl VigilService {
    /// Begin monitoring. Returns the session id (the running one if a
    /// session is already active).
    async fn start(&self) -> zbus::fdo::Result<String> {
        tracing::info!("start requested");
        self.engine.start().await.map_err(failed)
    }

    /// Stop monitoring and clear the attention state.
    ///
    /// Returns false if no session was running.
    async fn stop(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("stop requested");
        self.engine.stop().await.map_err(failed)
    }

    /// Reset the away-event count and risk score.
    async fn reset(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("reset requested");
        self.engine.reset().await.map_err(failed)?;
        Ok(true)
    }

    /// Return monitor status as JSON.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status().await.map_err(failed)?;
        let mut value = serde_json::to_value(&status).map_err(failed)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("version".into(), env!("CARGO_PKG_VERSION").into());
            obj.insert("tick_interval_ms".into(), self.tick_interval_ms.into());
        }
        Ok(value.to_string())
    }
}
