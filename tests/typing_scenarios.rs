use chrono::{DateTime, Duration, TimeZone, Utc};

use bookdr::keyboard::mapping::resolve_expected_key;
use bookdr::session::input::{KeyIdentity, KeyInput, Transition, interpret};
use bookdr::session::typing::{SessionPhase, TypingSession};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn loaded(text: &str) -> TypingSession {
    let mut session = TypingSession::new();
    session.load("book", "Book", text, None, t0());
    session.start_session(t0());
    session
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

#[test]
fn hi_there_typed_cleanly() {
    let mut session = loaded("Hi there");
    let keys = [
        KeyInput::char('H').with_shift(),
        KeyInput::char('i'),
        KeyInput::char(' '),
        KeyInput::char('t'),
        KeyInput::char('h'),
        KeyInput::char('e'),
        KeyInput::char('r'),
        KeyInput::char('e'),
    ];
    for (i, key) in keys.iter().enumerate() {
        session.handle_key(key, t0() + Duration::seconds(i as i64 + 1));
    }

    assert_eq!(session.position(), 8);
    assert_eq!(session.phase(), SessionPhase::Complete);
    let stats = session.stats();
    assert_eq!(stats.total_typed, 8);
    assert_eq!(stats.total_errors, 0);
    assert_eq!(stats.accuracy, 100);
    // 8 chars in 8 seconds: (8/5) / (8/60) = 12 wpm.
    assert_eq!(stats.wpm, 12);
}

#[test]
fn short_uppercase_run_accepts_caps_lock() {
    let buffer = chars("AB");
    let expected = resolve_expected_key(&buffer, 0);
    assert!(expected.needs_shift);
    assert!(!expected.needs_caps_lock);
    assert_eq!(expected.physical_key, 'a');

    let mut session = loaded("AB");
    session.handle_key(&KeyInput::char('a').with_caps_lock(), t0());
    session.handle_key(&KeyInput::char('b').with_caps_lock(), t0());
    assert!(session.is_complete());
    assert_eq!(session.stats().total_errors, 0);
}

#[test]
fn caps_lock_runs_from_three_letters() {
    let buffer = chars("I saw NASA and the UK");
    for (pos, caps) in [(0, false), (6, true), (7, true), (8, false), (19, false)] {
        let key = resolve_expected_key(&buffer, pos);
        assert_eq!(key.needs_caps_lock, caps, "caps lock at {pos}");
        assert_eq!(key.needs_shift, !caps, "shift at {pos}");
    }
}

#[test]
fn paragraph_break_before_letter_takes_one_space_per_newline() {
    let buffer = chars("A\n\nB");
    assert_eq!(resolve_expected_key(&buffer, 1).physical_key, ' ');

    let mut session = loaded("A\n\nB");
    session.handle_key(&KeyInput::char('A').with_shift(), t0());
    session.handle_key(&KeyInput::char(' '), t0());
    assert_eq!(session.position(), 2);
    session.handle_key(&KeyInput::char(' '), t0());
    assert_eq!(session.position(), 3);
    session.handle_key(&KeyInput::char('B').with_shift(), t0());

    assert!(session.is_complete());
    assert_eq!(session.stats().total_typed, 4);
    assert_eq!(session.stats().total_errors, 0);
}

#[test]
fn newlines_before_punctuation_are_skipped() {
    let mut session = loaded("end.\n\n\"Quote");
    for ch in "end.".chars() {
        session.handle_key(&KeyInput::char(ch), t0());
    }
    let applied = session.handle_key(&KeyInput::char('"').with_shift(), t0());
    assert_eq!(applied.len(), 3);
    assert_eq!(session.position(), 7);
    assert_eq!(session.stats().total_errors, 0);
}

#[test]
fn backspace_at_start_changes_nothing() {
    let mut session = loaded("abc");
    let before_stats = session.stats().clone();
    let applied = session.handle_key(&KeyInput::backspace(), t0() + Duration::seconds(3));
    assert_eq!(applied, vec![Transition::Retreat]);
    assert_eq!(session.position(), 0);
    assert!(session.typed().is_empty());
    assert_eq!(session.stats(), &before_stats);
}

#[test]
fn score_then_retreat_round_trips() {
    let text = "The quick brown fox!";
    let buffer = chars(text);
    for pos in 0..buffer.len() {
        for correct in [true, false] {
            let mut session = loaded(text);
            for _ in 0..pos {
                session.score('x', pos % 3 == 0, t0());
            }
            let position = session.position();
            let typed = session.typed().clone();
            let (total, errors) = (session.stats().total_typed, session.stats().total_errors);

            session.score(buffer[pos], correct, t0());
            session.retreat(t0());

            assert_eq!(session.position(), position);
            assert_eq!(session.typed(), &typed);
            assert_eq!(session.stats().total_typed, total);
            assert_eq!(session.stats().total_errors, errors);
        }
    }
}

#[test]
fn stats_stay_in_range_while_mashing_keys() {
    let mut session = loaded("It was the best of times, it was the worst of times.");
    let keys = ['x', 'I', ' ', '\u{8}', 't', '!', '\u{8}', '\u{8}', 'q', ' '];
    for i in 0..200 {
        let key = match keys[i % keys.len()] {
            '\u{8}' => KeyInput::backspace(),
            ch => KeyInput::char(ch),
        };
        session.handle_key(&key, t0() + Duration::milliseconds(150 * i as i64));
        let stats = session.stats();
        assert!(stats.accuracy <= 100);
        assert!(stats.total_errors <= stats.total_typed);
        assert!(session.position() <= session.len());
    }
}

#[test]
fn keystrokes_after_completion_are_dropped() {
    let mut session = loaded("ok\n");
    session.handle_key(&KeyInput::char('o'), t0());
    session.handle_key(&KeyInput::char('k'), t0());
    // The trailing newline is skipped with the next keystroke.
    session.handle_key(&KeyInput::char('z'), t0());
    assert!(session.is_complete());
    let typed = session.stats().total_typed;

    assert!(session.handle_key(&KeyInput::char('z'), t0()).is_empty());
    assert_eq!(session.stats().total_typed, typed);
}

#[test]
fn interpret_ignores_modifier_presses() {
    let buffer = chars("abc");
    assert!(interpret(&buffer, 0, &KeyInput::new(KeyIdentity::Modifier)).is_empty());
    assert!(interpret(&buffer, 0, &KeyInput::char('c').with_ctrl()).is_empty());
}
