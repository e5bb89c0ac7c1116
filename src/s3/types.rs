//! Object key helpers

/// Keys ending in the path separator are folder placeholders, not files
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with('/')
}

/// File name offered for a CSV export of `key`.
///
/// The `.csv` suffix is appended to the full object name, so `report.xlsx`
/// exports as `report.xlsx.csv`.
pub fn export_file_name(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    format!("{}.csv", name)
}
