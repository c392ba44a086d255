use std::{fs, path::Path, sync::Arc};

use crate::networks::{BeaconNetworkSpec, DEV, MAINNET};

/// Resolve `--network`: a preset name or the path of a consensus `config.yaml`.
pub fn beacon_network_parser(network_string: &str) -> Result<Arc<BeaconNetworkSpec>, String> {
    match network_string {
        "mainnet" => Ok(MAINNET.clone()),
        "dev" => Ok(DEV.clone()),
        path => read_network_spec(Path::new(path)),
    }
}

fn read_network_spec(path: &Path) -> Result<Arc<BeaconNetworkSpec>, String> {
    let contents = fs::read_to_string(path).map_err(|err| format!("Failed to read file: {err}"))?;
    Ok(Arc::new(serde_yaml::from_str(&contents).map_err(
        |err| format!("Failed to parse YAML from: {err}"),
    )?))
}
