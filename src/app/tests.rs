use super::logging::CappedLog;
use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn unique_log_path(prefix: &str) -> std::path::PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    env::temp_dir().join(format!("{prefix}_{unique}.log"))
}

#[test]
fn capped_log_appends_until_limit() {
    let path = unique_log_path("lora_panel_capped");
    let mut log = CappedLog::open(path.clone(), 64).unwrap();
    log.append("first line\n");
    log.append("second line\n");
    assert_eq!(log.len(), 23);
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "first line\nsecond line\n");
    let _ = fs::remove_file(path);
}

#[test]
fn capped_log_truncates_when_line_would_overflow() {
    let path = unique_log_path("lora_panel_overflow");
    let mut log = CappedLog::open(path.clone(), 16).unwrap();
    log.append("0123456789\n");
    log.append("abcdefghij\n");
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "abcdefghij\n");
    assert_eq!(log.len(), 11);
    let _ = fs::remove_file(path);
}

#[test]
fn capped_log_discards_oversized_existing_file() {
    let path = unique_log_path("lora_panel_oversized");
    fs::write(&path, "x".repeat(128)).unwrap();
    let log = CappedLog::open(path.clone(), 32).unwrap();
    assert_eq!(log.len(), 0);
    let _ = fs::remove_file(path);
}

#[test]
fn log_debug_reaches_the_log_file_only_when_enabled() {
    use super::{log_debug, log_debug_content, log_file_path, set_logging_for_tests};
    let marker = format!("marker-{}", unique_log_path("m").display());

    set_logging_for_tests(true, false);
    log_debug(&format!("{marker} visible"));
    log_debug_content(&format!("{marker} content"));
    set_logging_for_tests(false, false);
    log_debug(&format!("{marker} after"));

    let contents = fs::read_to_string(log_file_path()).unwrap_or_default();
    assert!(contents.contains(&format!("{marker} visible")));
    assert!(!contents.contains(&format!("{marker} content")));
    assert!(!contents.contains(&format!("{marker} after")));
}
