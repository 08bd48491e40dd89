//! Session control commands talking to `vigild` over D-Bus.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use zbus::zvariant::Type;

const BUS_NAME: &str = "org.freedesktop.Vigil1";
const OBJECT_PATH: &str = "/org/freedesktop/Vigil1";

async fn connect(session_bus: bool) -> Result<zbus::Connection> {
    let conn = if session_bus {
        zbus::Connection::session().await
    } else {
        zbus::Connection::system().await
    };
    conn.context("failed to connect to D-Bus (is vigild running?)")
}

async fn call<R>(session_bus: bool, method: &str) -> Result<R>
where
    R: DeserializeOwned + Type,
{
    let conn = connect(session_bus).await?;
    tracing::debug!(method, "calling vigild");
    let reply = conn
        .call_method(Some(BUS_NAME), OBJECT_PATH, Some(BUS_NAME), method, &())
        .await
        .with_context(|| format!("{method} call to vigild failed"))?;
    let value = reply
        .body()
        .deserialize::<R>()
        .with_context(|| format!("unexpected {method} reply from vigild"))?;
    Ok(value)
}

pub async fn start(session_bus: bool) -> Result<()> {
    let session: String = call(session_bus, "Start").await?;
    println!("Monitoring started (session {session}). Keep your eyes on the screen.");
    Ok(())
}

pub async fn stop(session_bus: bool) -> Result<()> {
    let stopped: bool = call(session_bus, "Stop").await?;
    if stopped {
        println!("Monitoring stopped.");
    } else {
        println!("No monitoring session was running.");
    }
    Ok(())
}

pub async fn reset(session_bus: bool) -> Result<()> {
    let _: bool = call(session_bus, "Reset").await?;
    println!("Warnings reset.");
    Ok(())
}

pub async fn status(session_bus: bool) -> Result<()> {
    let json: String = call(session_bus, "Status").await?;
    let value: serde_json::Value =
        serde_json::from_str(&json).context("vigild returned malformed status")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
