//! Locating the elasticsearch-hadoop jar Hive needs for the storage handler.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static JAR_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^elasticsearch-hadoop(?:-hive)?-(\d[\w.-]*)\.jar$").expect("jar name regex")
});

/// Directories searched when no explicit path is configured.
pub const DEFAULT_JAR_SEARCH_PATHS: [&str; 6] = [
    ".",
    "/usr/hdp/current/hive-client/auxlib",
    "/usr/hdp/current/hive-client/lib",
    "/usr/lib/hive/lib",
    "/opt/elasticsearch-hadoop/dist",
    "/usr/share/java",
];

fn is_es_hadoop_jar(name: &str) -> bool {
    JAR_NAME.is_match(name) && !name.ends_with("-sources.jar") && !name.ends_with("-javadoc.jar")
}

/// Numeric release components of a jar name: `7.17.0` is `[7, 17, 0]`.
/// Parsing stops at the first non-numeric component, so `8.0.0-rc1` is
/// `[8, 0, 0]`.
fn version_key(name: &str) -> Vec<u64> {
    let Some(version) = JAR_NAME.captures(name).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    version
        .as_str()
        .split(['.', '-'])
        .map_while(|part| part.parse::<u64>().ok())
        .collect()
}

/// Find an elasticsearch-hadoop jar.
///
/// Each entry may be a jar file or a directory. Directories are searched in
/// order; within the first directory that has candidates the highest
/// release number wins.
pub fn find_es_hadoop_jar<P: AsRef<Path>>(search_paths: &[P]) -> Option<PathBuf> {
    for path in search_paths {
        let path = path.as_ref();
        if path.is_file() {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_es_hadoop_jar);
            if matches {
                return Some(path.to_path_buf());
            }
            continue;
        }
        let Ok(entries) = std::fs::read_dir(path) else {
            continue;
        };
        let mut candidates: Vec<(Vec<u64>, PathBuf)> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_es_hadoop_jar)
            })
            .map(|p| {
                let key = p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(version_key)
                    .unwrap_or_default();
                (key, p)
            })
            .collect();
        candidates.sort();
        if let Some((_, jar)) = candidates.pop() {
            tracing::debug!(jar = %jar.display(), "Found elasticsearch-hadoop jar");
            return Some(jar);
        }
    }
    None
}
