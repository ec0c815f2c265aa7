//! Parsing helpers for `lsblk -J` and `losetup -J` output.
//!
//! util-linux changed several JSON columns from strings to numbers/booleans over time,
//! so numeric and flag columns accept either form.

use crate::hal::{BlockDevice, BlockKind, LoopDevice};
use crate::{HalError, HalResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

/// Columns requested from lsblk; keep in sync with [`LsblkRow`].
pub const LSBLK_COLUMNS: &str = "NAME,TYPE,SIZE,FSTYPE,LABEL,MOUNTPOINT,PKNAME";

#[derive(Debug, Deserialize)]
struct LsblkReport {
    #[serde(default)]
    blockdevices: Vec<LsblkRow>,
}

#[derive(Debug, Deserialize)]
struct LsblkRow {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Value,
    fstype: Option<String>,
    label: Option<String>,
    mountpoint: Option<String>,
    pkname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LosetupReport {
    #[serde(default)]
    loopdevices: Vec<LosetupRow>,
}

#[derive(Debug, Deserialize)]
struct LosetupRow {
    name: String,
    #[serde(rename = "back-file")]
    back_file: Option<String>,
    #[serde(default)]
    ro: Value,
}

fn value_u64(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn value_flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() == Some(1),
        Value::String(s) => s.trim() == "1",
        _ => false,
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse `lsblk -J -l -b -p -o LSBLK_COLUMNS` into rows, preserving order.
///
/// List mode prints a device with several parents (an md array) once per parent;
/// only the first of those rows is kept.
pub fn parse_lsblk_json(content: &str) -> HalResult<Vec<BlockDevice>> {
    let report: LsblkReport = serde_json::from_str(content)
        .map_err(|e| HalError::Parse(format!("lsblk output: {}", e)))?;

    let mut seen = HashSet::new();
    Ok(report
        .blockdevices
        .into_iter()
        .filter(|row| seen.insert(row.name.clone()))
        .map(|row| BlockDevice {
            path: PathBuf::from(row.name),
            kind: BlockKind::from_lsblk(&row.kind),
            size_bytes: value_u64(&row.size),
            fstype: non_empty(row.fstype),
            label: non_empty(row.label),
            mountpoint: non_empty(row.mountpoint).map(PathBuf::from),
            parent: non_empty(row.pkname).map(PathBuf::from),
        })
        .collect())
}

/// Parse `losetup -J -l` output.
pub fn parse_losetup_json(content: &str) -> HalResult<Vec<LoopDevice>> {
    if content.trim().is_empty() {
        // losetup prints nothing at all when no loop device is attached.
        return Ok(Vec::new());
    }
    let report: LosetupReport = serde_json::from_str(content)
        .map_err(|e| HalError::Parse(format!("losetup output: {}", e)))?;

    Ok(report
        .loopdevices
        .into_iter()
        .filter_map(|row| {
            let back_file = non_empty(row.back_file)?;
            Some(LoopDevice {
                device: PathBuf::from(row.name),
                backing_file: PathBuf::from(back_file.trim_end_matches(" (deleted)")),
                read_only: value_flag(&row.ro),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSBLK: &str = r#"{
   "blockdevices": [
      {"name":"/dev/sda", "type":"disk", "size":500107862016, "fstype":null, "label":null, "mountpoint":null, "pkname":null},
      {"name":"/dev/sda1", "type":"part", "size":"104857600", "fstype":"vfat", "label":"EFI", "mountpoint":"/boot/efi", "pkname":"/dev/sda"},
      {"name":"/dev/sda2", "type":"part", "size":1048576, "fstype":"", "label":null, "mountpoint":null, "pkname":"/dev/sda"},
      {"name":"/dev/md0", "type":"raid1", "size":1048576, "fstype":"ext4", "label":null, "mountpoint":null, "pkname":"/dev/sdb"}
   ]
}"#;

    #[test]
    fn lsblk_rows_keep_order_and_accept_string_sizes() {
        let rows = parse_lsblk_json(LSBLK).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].kind, BlockKind::Disk);
        assert_eq!(rows[1].size_bytes, 104_857_600);
        assert_eq!(rows[1].mountpoint, Some(PathBuf::from("/boot/efi")));
        assert_eq!(rows[1].parent, Some(PathBuf::from("/dev/sda")));
        assert_eq!(rows[2].fstype, None);
        assert_eq!(rows[3].kind, BlockKind::Raid);
    }

    #[test]
    fn lsblk_md_array_listed_per_member_appears_once() {
        let json = r#"{"blockdevices":[
            {"name":"/dev/sdb", "type":"disk", "size":1073741824, "fstype":"linux_raid_member", "label":null, "mountpoint":null, "pkname":null},
            {"name":"/dev/md0", "type":"raid1", "size":1072693248, "fstype":"ext4", "label":null, "mountpoint":null, "pkname":"/dev/sdb"},
            {"name":"/dev/sdc", "type":"disk", "size":1073741824, "fstype":"linux_raid_member", "label":null, "mountpoint":null, "pkname":null},
            {"name":"/dev/md0", "type":"raid1", "size":1072693248, "fstype":"ext4", "label":null, "mountpoint":null, "pkname":"/dev/sdc"},
            {"name":"/dev/sdd1", "type":"part", "size":1048576, "fstype":"xfs", "label":null, "mountpoint":null, "pkname":"/dev/sdd"}
        ]}"#;
        let paths: Vec<PathBuf> = parse_lsblk_json(json)
            .unwrap()
            .into_iter()
            .map(|d| d.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/dev/sdb"),
                PathBuf::from("/dev/md0"),
                PathBuf::from("/dev/sdc"),
                PathBuf::from("/dev/sdd1"),
            ]
        );
    }

    #[test]
    fn lsblk_garbage_is_a_parse_error() {
        let err = parse_lsblk_json("not json").unwrap_err();
        assert!(matches!(err, HalError::Parse(_)));
    }

    #[test]
    fn losetup_rows_map_backing_files() {
        let json = r#"{"loopdevices":[
            {"name":"/dev/loop0","sizelimit":0,"offset":0,"autoclear":false,"ro":true,"back-file":"/srv/a.img","dio":false},
            {"name":"/dev/loop1","ro":"0","back-file":"/srv/b.img (deleted)"},
            {"name":"/dev/loop2","ro":false,"back-file":null}
        ]}"#;
        let loops = parse_losetup_json(json).unwrap();
        assert_eq!(loops.len(), 2);
        assert!(loops[0].read_only);
        assert_eq!(loops[1].backing_file, PathBuf::from("/srv/b.img"));
        assert!(!loops[1].read_only);
    }

    #[test]
    fn losetup_empty_output_means_no_devices() {
        assert!(parse_losetup_json("").unwrap().is_empty());
    }
}
