use super::console::{TextGrid, GRID_COLS, GRID_ROWS};
use super::{ConsoleRenderer, DrawCommand, RecordingRenderer, StatusRenderer};

#[test]
fn grid_matches_ssd1306_panel() {
    assert_eq!(GRID_COLS, 21);
    assert_eq!(GRID_ROWS, 4);
}

#[test]
fn grid_snaps_text_to_cells() {
    let mut grid = TextGrid::new();
    grid.put("LoRaWAN Gateway", 15, 0);
    grid.put("SF: ", 65, 8);
    grid.put("ttn", 0, 20);
    let lines = grid.lines();
    assert!(lines[0].starts_with("  LoRaWAN Gateway"));
    assert_eq!(&lines[1][10..14], "SF: ");
    assert_eq!(&lines[2][..3], "ttn");
}

#[test]
fn grid_clips_at_right_edge_and_ignores_offscreen_text() {
    let mut grid = TextGrid::new();
    grid.put(&"x".repeat(40), 0, 0);
    grid.put("hidden", 200, 0);
    grid.put("hidden", 0, 40);
    grid.put("hidden", -5, 0);
    let lines = grid.lines();
    assert_eq!(lines[0], "x".repeat(GRID_COLS));
    assert!(lines.iter().all(|line| !line.contains("hidden")));
}

#[test]
fn grid_skips_control_characters() {
    let mut grid = TextGrid::new();
    grid.put("a\tb\x1bc", 0, 8);
    assert!(grid.lines()[1].starts_with("abc"));
}

#[test]
fn grid_keeps_wide_glyphs_within_width() {
    let mut grid = TextGrid::new();
    grid.put(&"你".repeat(12), 0, 0);
    let line = &grid.lines()[0];
    assert_eq!(line.chars().filter(|ch| *ch == '你').count(), 10);
}

#[test]
fn console_renderer_writes_boxed_frame_once_per_change() {
    let mut renderer = ConsoleRenderer::new(Vec::new());
    renderer.clear().unwrap();
    renderer.text("hello", 0, 0).unwrap();
    renderer.present().unwrap();
    renderer.present().unwrap();
    renderer.clear().unwrap();
    renderer.text("world", 0, 0).unwrap();
    renderer.present().unwrap();
    let out = String::from_utf8(renderer.into_inner()).unwrap();
    assert_eq!(out.matches("|hello").count(), 1);
    assert_eq!(out.matches("|world").count(), 1);
    assert!(out.starts_with(&format!("+{}+\n", "-".repeat(GRID_COLS))));
}

#[test]
fn recording_renderer_groups_presented_frames() {
    let mut renderer = RecordingRenderer::new();
    renderer.clear().unwrap();
    renderer.text("one", 0, 0).unwrap();
    renderer.present().unwrap();
    renderer.clear().unwrap();
    renderer.text("two", 0, 0).unwrap();
    renderer.text("three", 0, 10).unwrap();
    renderer.present().unwrap();
    renderer.text("unpresented", 0, 20).unwrap();

    assert_eq!(
        renderer.presented_frames(),
        vec![vec!["one".to_string()], vec!["two".to_string(), "three".to_string()]]
    );
    assert_eq!(renderer.texts(), vec!["one", "two", "three", "unpresented"]);
    assert_eq!(
        renderer.commands()[1],
        DrawCommand::Text {
            text: "one".into(),
            x: 0,
            y: 0
        }
    );
}
