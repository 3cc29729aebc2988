use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::parse::parse_snapshot;
use super::snapshot::NetworkSnapshot;

pub fn load_snapshot(path: &Path) -> Result<NetworkSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read network snapshot {}", path.display()))?;

    let snapshot = parse_snapshot(&raw)
        .with_context(|| format!("failed to parse network snapshot {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        peers = snapshot.topology.peer_count(),
        connections = snapshot.topology.connections.len(),
        contracts = snapshot.contracts.len(),
        events = snapshot.events.len(),
        "loaded network snapshot"
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_snapshot_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"topology": {{"a": {{"location": 0.1}}}}, "contracts": {{"c": {{"subscribers": ["a"]}}}}}}"#
        )
        .unwrap();

        let snapshot = load_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.topology.peer_count(), 1);
        assert_eq!(snapshot.contract_ids(), vec!["c".to_owned()]);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let error = load_snapshot(&path).unwrap_err();
        assert!(format!("{error:#}").contains("absent.json"));
    }
}
