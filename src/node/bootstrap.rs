//! # Repository bootstrap.
//!
//! Every run starts from a fresh repository:
//! 1. remove the repository directory
//! 2. `init --empty-repo`
//! 3. apply [`NodeSettings`] through `config` subcommands
//! 4. write the fixed identity straight into the config file
//!
//! The node refuses to change its private key through `config`, so step 4
//! edits the JSON document directly.

use std::io;
use std::path::Path;

use serde_json::{Value, json};
use tokio::fs;

use crate::config::{Config, NodeSettings};
use crate::error::MonitorError;
use crate::node::NodeCli;

/// Wipes, initializes and configures the repository at `cfg.repo_path`.
pub async fn bootstrap(cli: &NodeCli, cfg: &Config) -> Result<(), MonitorError> {
    match fs::remove_dir_all(&cfg.repo_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    cli.run(&["init", "--empty-repo"]).await?;
    for args in config_commands(&cfg.node) {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        cli.run(&args).await?;
    }
    write_identity(&cfg.repo_path.join("config"), &cfg.node).await?;

    tracing::info!(
        interval = %cfg.node.interval_literal(),
        strategy = %cfg.node.strategy,
        peer_id = %cfg.node.peer_id,
        "repository configured"
    );
    Ok(())
}

/// `config` invocations that apply `node`, in order.
pub fn config_commands(node: &NodeSettings) -> Vec<Vec<String>> {
    let interval = Value::from(node.interval_literal()).to_string();
    let swarm = Value::from(node.swarm_addrs.clone()).to_string();
    let cmd = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();

    vec![
        cmd(&["config", "--json", "Provide.DHT.Interval", &interval]),
        cmd(&["config", "Provide.Strategy", &node.strategy]),
        cmd(&["config", "Addresses.API", &node.api_addr]),
        cmd(&["config", "Addresses.Gateway", &node.gateway_addr]),
        cmd(&["config", "--json", "Addresses.Swarm", &swarm]),
        cmd(&["config", "Plugins.Plugins.telemetry.Config.Mode", "off"]),
    ]
}

/// Replaces the `Identity` section of the config file at `path`.
pub async fn write_identity(path: &Path, node: &NodeSettings) -> Result<(), MonitorError> {
    let config_err = |reason: String| MonitorError::Config {
        path: path.to_path_buf(),
        reason,
    };

    let raw = fs::read(path)
        .await
        .map_err(|e| config_err(format!("read: {e}")))?;
    let mut doc: Value =
        serde_json::from_slice(&raw).map_err(|e| config_err(format!("parse: {e}")))?;
    let Some(root) = doc.as_object_mut() else {
        return Err(config_err("not a JSON object".to_string()));
    };
    root.insert(
        "Identity".to_string(),
        json!({ "PeerID": node.peer_id, "PrivKey": node.priv_key }),
    );

    let out = serde_json::to_vec_pretty(&doc).map_err(|e| config_err(format!("encode: {e}")))?;
    fs::write(path, out)
        .await
        .map_err(|e| config_err(format!("write: {e}")))?;
    restrict_permissions(path).await.map_err(|e| config_err(format!("chmod: {e}")))
}

/// The config holds a private key: owner read/write only.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
