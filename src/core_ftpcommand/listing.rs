// Directory entry formatting for LIST/NLST/STAT and the MLSx fact lists.
// https://cr.yp.to/ftp/list/binls.html

use chrono::{DateTime, Local, Utc};
use std::fs::Metadata;
use std::io;
use std::path::Path;

/// Gathers the entries a listing command reports for `path`.
///
/// A directory yields its children, a plain file yields itself, a missing
/// path yields `None`.
pub fn collect_dir_entries(path: &Path) -> io::Result<Option<Vec<(String, Metadata)>>> {
    if !path.exists() {
        return Ok(None);
    }
    if path.is_dir() {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            match entry.metadata() {
                Ok(metadata) => entries.push((name, metadata)),
                Err(_) => continue,
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Some(entries))
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = path.metadata()?;
        Ok(Some(vec![(name, metadata)]))
    }
}

/// One fixed-width Unix-style `ls -l` line.
pub fn format_unix_line(name: &str, metadata: &Metadata) -> String {
    let modified: DateTime<Local> = metadata
        .modified()
        .map(Into::into)
        .unwrap_or_else(|_| Local::now());

    format!(
        "{}{} 1 {} {} {:>13} {} {:>3} {} {}",
        if metadata.is_dir() { 'd' } else { '-' },
        permission_string(metadata),
        owner_name(metadata),
        group_name(metadata),
        metadata.len(),
        modified.format("%b"),
        modified.format("%-d").to_string(),
        modified.format("%H:%M"),
        name
    )
}

/// One semicolon-delimited fact line for MLST/MLSD.
///
/// `entry_type` is `file`, `dir`, or the MLSD pseudo-entries `cdir`/`pdir`.
pub fn format_fact_line(name: &str, metadata: &Metadata, lang: &str, entry_type: &str) -> String {
    let modified: DateTime<Utc> = metadata
        .modified()
        .map(Into::into)
        .unwrap_or_else(|_| Utc::now());

    format!(
        "type={};modify={};perm={};lang={};size={}; {}",
        entry_type,
        modified.format("%Y%m%d%H%M%S"),
        perm_fact(metadata),
        lang,
        metadata.len(),
        name
    )
}

fn perm_fact(metadata: &Metadata) -> String {
    let mut perm = String::new();
    if metadata.is_dir() {
        perm.push('e');
        if is_readable(metadata) {
            perm.push('l');
        }
        if is_writable(metadata) {
            perm.push_str("cdfmp");
        }
    } else {
        if is_readable(metadata) {
            perm.push('r');
        }
        if is_writable(metadata) {
            perm.push_str("adw");
        }
    }
    perm
}

#[cfg(unix)]
fn permission_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = mode >> shift;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permission_string(metadata: &Metadata) -> String {
    // Best-effort probe when POSIX permission bits are unavailable.
    let w = if metadata.permissions().readonly() { '-' } else { 'w' };
    let mut out = String::with_capacity(9);
    for _ in 0..3 {
        out.push('r');
        out.push(w);
        out.push('-');
    }
    out
}

#[cfg(unix)]
fn is_readable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o400 != 0
}

#[cfg(not(unix))]
fn is_readable(_metadata: &Metadata) -> bool {
    true
}

#[cfg(unix)]
fn is_writable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o200 != 0
}

#[cfg(not(unix))]
fn is_writable(metadata: &Metadata) -> bool {
    !metadata.permissions().readonly()
}

#[cfg(unix)]
fn owner_name(metadata: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    metadata.uid().to_string()
}

#[cfg(not(unix))]
fn owner_name(_metadata: &Metadata) -> String {
    String::from("owner")
}

#[cfg(unix)]
fn group_name(metadata: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    metadata.gid().to_string()
}

#[cfg(not(unix))]
fn group_name(_metadata: &Metadata) -> String {
    String::from("group")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unix_line_has_fixed_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, b"0123456789").unwrap();
        let metadata = path.metadata().unwrap();

        let line = format_unix_line("report.txt", &metadata);
        assert!(line.starts_with('-'), "line: {line}");
        assert!(line.ends_with(" report.txt"), "line: {line}");

        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields[1], "1");
        assert_eq!(fields[4], "10");
        // HH:MM
        assert_eq!(fields[7].len(), 5);
        assert!(fields[7].contains(':'));
    }

    #[test]
    fn directories_are_marked_in_the_type_column() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("inner");
        fs::create_dir(&sub).unwrap();
        let line = format_unix_line("inner", &sub.metadata().unwrap());
        assert!(line.starts_with('d'));
    }

    #[test]
    fn size_field_is_right_justified_to_thirteen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny");
        fs::write(&path, b"x").unwrap();
        let line = format_unix_line("tiny", &path.metadata().unwrap());
        // permissions + link count + owner + group, then the padded size
        let after_group: Vec<&str> = line.splitn(5, ' ').collect();
        let size_field = &after_group[4][..13];
        assert!(size_field.ends_with('1'));
        assert!(size_field.starts_with(' '));
    }

    #[test]
    fn fact_line_carries_the_expected_facts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.bin");
        fs::write(&path, b"abc").unwrap();
        let line = format_fact_line("facts.bin", &path.metadata().unwrap(), "en", "file");

        assert!(line.starts_with("type=file;modify="));
        assert!(line.contains(";lang=en;"));
        assert!(line.contains(";size=3; facts.bin"));
        let modify = line
            .split("modify=")
            .nth(1)
            .unwrap()
            .split(';')
            .next()
            .unwrap();
        assert_eq!(modify.len(), 14);
        assert!(modify.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn fact_perm_distinguishes_files_from_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("w.txt");
        fs::write(&file, b"w").unwrap();
        let file_line = format_fact_line("w.txt", &file.metadata().unwrap(), "en", "file");
        assert!(file_line.contains("perm=radw;") || file_line.contains("perm=r;"));

        let sub = dir.path().join("d");
        fs::create_dir(&sub).unwrap();
        let dir_line = format_fact_line("d", &sub.metadata().unwrap(), "en", "dir");
        assert!(dir_line.contains("perm=el"));
    }

    #[test]
    fn collecting_a_missing_path_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(collect_dir_entries(&missing).unwrap().is_none());
    }

    #[test]
    fn collecting_a_file_yields_the_file_itself() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solo.txt");
        fs::write(&path, b"solo").unwrap();
        let entries = collect_dir_entries(&path).unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "solo.txt");
    }

    #[test]
    fn collecting_a_directory_yields_sorted_children() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let entries = collect_dir_entries(dir.path()).unwrap().unwrap();
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }
}
