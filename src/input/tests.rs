use super::{parse_button_line, Button, ButtonState, InputSource, PressDetector, StdinButtons, TriggerMode};
use std::io::Cursor;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn from_mask_maps_bits_to_buttons() {
    assert_eq!(ButtonState::from_mask(0), ButtonState::RELEASED);
    assert_eq!(ButtonState::from_mask(0b001), ButtonState::pressed(Button::A));
    assert_eq!(ButtonState::from_mask(0b010), ButtonState::pressed(Button::B));
    assert_eq!(ButtonState::from_mask(0b100), ButtonState::pressed(Button::C));
    assert_eq!(
        ButtonState::from_mask(0b111),
        ButtonState {
            a: true,
            b: true,
            c: true
        }
    );
}

#[test]
fn first_pressed_follows_priority_for_every_mask() {
    for mask in 0u8..8 {
        let state = ButtonState::from_mask(mask);
        let expected = if mask & 0b001 != 0 {
            Some(Button::A)
        } else if mask & 0b010 != 0 {
            Some(Button::B)
        } else if mask & 0b100 != 0 {
            Some(Button::C)
        } else {
            None
        };
        assert_eq!(state.first_pressed(), expected, "mask {mask:03b}");
        assert_eq!(state.any(), mask != 0);
    }
}

#[test]
fn level_trigger_fires_every_poll_while_held() {
    let mut detector = PressDetector::new(TriggerMode::Level);
    let held = ButtonState::pressed(Button::B);
    assert_eq!(detector.observe(held), Some(Button::B));
    assert_eq!(detector.observe(held), Some(Button::B));
    assert_eq!(detector.observe(ButtonState::RELEASED), None);
}

#[test]
fn edge_trigger_fires_once_per_press() {
    let mut detector = PressDetector::new(TriggerMode::Edge);
    let held = ButtonState::pressed(Button::C);
    assert_eq!(detector.observe(held), Some(Button::C));
    assert_eq!(detector.observe(held), None);
    assert_eq!(detector.observe(ButtonState::RELEASED), None);
    assert_eq!(detector.observe(held), Some(Button::C));
}

#[test]
fn edge_trigger_picks_newly_pressed_button_over_held_one() {
    let mut detector = PressDetector::new(TriggerMode::Edge);
    assert_eq!(detector.observe(ButtonState::pressed(Button::A)), Some(Button::A));
    // A is still held, B just went down.
    assert_eq!(detector.observe(ButtonState::from_mask(0b011)), Some(Button::B));
}

#[test]
fn parse_button_line_ignores_noise() {
    assert_eq!(parse_button_line("a\n"), ButtonState::pressed(Button::A));
    assert_eq!(parse_button_line("B"), ButtonState::pressed(Button::B));
    assert_eq!(parse_button_line(" c!\r\n"), ButtonState::pressed(Button::C));
    assert_eq!(parse_button_line("ac"), ButtonState::from_mask(0b101));
    assert_eq!(parse_button_line("xyz\n"), ButtonState::RELEASED);
}

fn read_until_pressed(source: &mut StdinButtons) -> ButtonState {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let state = source.read().unwrap();
        if state.any() || Instant::now() > deadline {
            return state;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn stdin_buttons_report_press_for_a_single_poll() {
    let mut source = StdinButtons::from_reader(Cursor::new(b"b\n".to_vec()));
    assert_eq!(read_until_pressed(&mut source), ButtonState::pressed(Button::B));
    assert_eq!(source.read().unwrap(), ButtonState::RELEASED);
}

#[test]
fn stdin_buttons_release_after_eof() {
    let mut source = StdinButtons::from_reader(Cursor::new(Vec::new()));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(source.read().unwrap(), ButtonState::RELEASED);
}
