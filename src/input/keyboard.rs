// SPDX-License-Identifier: GPL-3.0-only

//! The virtual keyboard.
//!
//! [`VirtualKeyboard`] owns all keyboard state: the active language, the caps
//! state machine, the buffered text and the processing/enabled flags. Key
//! presses arrive as identifier strings; every accepted press is reported to
//! the current subscriber over an unbounded channel before `press` returns, so
//! the subscriber observes presses in order.
//!
//! The keyboard is shared with the command pipeline on a single thread as a
//! [`SharedKeyboard`].

use crate::config::KioskConfig;
use crate::input::caps::{CapsMode, CapsState};
use crate::input::keycode::{KeyId, parse_key_id};
use crate::layout::{KeyLayoutProvider, Language};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Keyboard shared between the input source and the command pipeline.
pub type SharedKeyboard = Rc<RefCell<VirtualKeyboard>>;

/// Notification sent to the subscriber after an accepted press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardEvent {
    /// The buffered text changed; carries the full text.
    InputChanged(String),
    /// Key labels changed (caps mode or language).
    LayoutChanged,
    /// The submit key was accepted; carries the buffered text.
    Submitted(String),
}

/// Kind of a key, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Character,
    Backspace,
    Caps,
    Language,
    Space,
    Submit,
}

impl From<&KeyId> for KeyKind {
    fn from(key: &KeyId) -> Self {
        match key {
            KeyId::Backspace => KeyKind::Backspace,
            KeyId::Caps => KeyKind::Caps,
            KeyId::Language => KeyKind::Language,
            KeyId::Space => KeyKind::Space,
            KeyId::Submit => KeyKind::Submit,
            KeyId::Character(_) => KeyKind::Character,
        }
    }
}

/// Snapshot of one key for the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyView {
    /// Identifier from the layout table
    pub id: String,
    /// Text drawn on the key
    pub label: String,
    pub kind: KeyKind,
    /// Whether the key currently rejects presses
    pub disabled: bool,
    /// Whether a new row starts after this key
    pub row_break: bool,
    /// Caps mode, set on the caps key only
    pub caps_mode: Option<CapsMode>,
}

/// Stateful on-screen keyboard.
#[derive(Debug)]
pub struct VirtualKeyboard {
    provider: KeyLayoutProvider,
    language: Language,
    caps: CapsState,
    buffer: String,
    processing: bool,
    enabled: bool,
    min_length: usize,
    max_length: usize,
    subscriber: Option<UnboundedSender<KeyboardEvent>>,
}

impl VirtualKeyboard {
    /// Creates an enabled keyboard with an empty buffer.
    pub fn new(provider: KeyLayoutProvider, config: &KioskConfig) -> Self {
        Self {
            provider,
            language: config.keyboard.default_language,
            caps: CapsState::new(config.keyboard.double_tap_window()),
            buffer: String::new(),
            processing: false,
            enabled: true,
            min_length: config.terminal.validation.min_length,
            max_length: config.terminal.validation.max_length,
            subscriber: None,
        }
    }

    /// Wraps the keyboard for sharing with the pipeline.
    pub fn into_shared(self) -> SharedKeyboard {
        Rc::new(RefCell::new(self))
    }

    // ========================================================================
    // Subscription
    // ========================================================================

    /// Replaces the current subscriber and returns its event stream.
    pub fn subscribe(&mut self) -> UnboundedReceiver<KeyboardEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.subscriber = Some(tx);
        rx
    }

    /// Drops the current subscriber, which ends its event stream.
    pub fn unsubscribe(&mut self) {
        self.subscriber = None;
    }

    /// Sends `event` to the subscriber. Returns `false` if nobody received it.
    fn notify(&mut self, event: KeyboardEvent) -> bool {
        let Some(tx) = &self.subscriber else {
            return false;
        };
        if tx.unbounded_send(event).is_err() {
            tracing::debug!("Keyboard subscriber went away");
            self.subscriber = None;
            return false;
        }
        true
    }

    // ========================================================================
    // Key presses
    // ========================================================================

    /// Presses a key by identifier. Returns `true` if the press was accepted.
    pub fn press(&mut self, key: &str) -> bool {
        self.press_at(key, Instant::now())
    }

    /// Presses a key at an explicit time, which drives caps double-tap detection.
    pub fn press_at(&mut self, key: &str, now: Instant) -> bool {
        if !self.enabled {
            tracing::trace!("Keyboard disabled, ignoring '{}'", key);
            return false;
        }

        let Some(key) = parse_key_id(key) else {
            return false;
        };

        if self.is_key_disabled(&key) {
            tracing::trace!("Key '{}' is disabled", key.as_str());
            return false;
        }

        match key {
            KeyId::Backspace => {
                if self.processing || self.buffer.pop().is_none() {
                    return false;
                }
                self.notify(KeyboardEvent::InputChanged(self.buffer.clone()));
            }
            KeyId::Space => {
                if !self.append(" ") {
                    return false;
                }
                self.notify(KeyboardEvent::InputChanged(self.buffer.clone()));
            }
            KeyId::Character(id) => {
                let text = self
                    .provider
                    .character_for(self.language, &id, self.caps.is_upper());
                if !self.append(&text) {
                    return false;
                }
                let caps_changed = self.caps.consume_shift();
                self.notify(KeyboardEvent::InputChanged(self.buffer.clone()));
                if caps_changed {
                    self.notify(KeyboardEvent::LayoutChanged);
                }
            }
            KeyId::Caps => {
                self.caps.tap(now);
                self.notify(KeyboardEvent::LayoutChanged);
                self.notify(KeyboardEvent::InputChanged(self.buffer.clone()));
            }
            KeyId::Language => {
                self.language = self.language.toggled();
                tracing::debug!("Keyboard language switched to {:?}", self.language);
                self.notify(KeyboardEvent::LayoutChanged);
                self.notify(KeyboardEvent::InputChanged(self.buffer.clone()));
            }
            KeyId::Submit => {
                // Latch only once a pipeline holds the event
                if !self.notify(KeyboardEvent::Submitted(self.buffer.clone())) {
                    tracing::warn!("Submit ignored, no pipeline is listening");
                    return false;
                }
                self.processing = true;
                tracing::debug!("Submit accepted, keyboard latched as processing");
            }
        }
        true
    }

    /// Appends as much of `text` as fits. Returns `false` if nothing fit or
    /// a submission is in flight.
    fn append(&mut self, text: &str) -> bool {
        if self.processing {
            return false;
        }
        let room = self.max_length.saturating_sub(self.buffer_len());
        let before = self.buffer.len();
        self.buffer.extend(text.chars().take(room));
        self.buffer.len() != before
    }

    fn buffer_len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Returns `true` if `key` currently rejects presses.
    pub fn is_key_disabled(&self, key: &KeyId) -> bool {
        if !self.enabled {
            return true;
        }
        match key {
            KeyId::Submit => {
                self.processing || self.buffer.trim().chars().count() < self.min_length
            }
            KeyId::Backspace => false,
            _ => self.buffer_len() >= self.max_length,
        }
    }

    // ========================================================================
    // Flags and state
    // ========================================================================

    /// Marks a submission as in flight. Does not touch the buffer.
    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    /// Enables or hard-locks the keyboard.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Empties the buffer without notifying the subscriber.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn caps_mode(&self) -> CapsMode {
        self.caps.mode()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Returns the keys of the active layout as the surface should draw them.
    pub fn keys(&self) -> Vec<KeyView> {
        let layout = self.provider.layouts().get(self.language);
        let upper = self.caps.is_upper();

        layout
            .keys
            .iter()
            .filter_map(|raw| {
                let key = parse_key_id(raw)?;
                let label = match &key {
                    KeyId::Character(id) => self.provider.character_for(self.language, id, upper),
                    KeyId::Backspace => "⌫".to_string(),
                    KeyId::Caps => "⇧".to_string(),
                    KeyId::Language => layout.tag.to_uppercase(),
                    KeyId::Space => "space".to_string(),
                    KeyId::Submit => "done".to_string(),
                };
                Some(KeyView {
                    id: raw.clone(),
                    label,
                    kind: KeyKind::from(&key),
                    disabled: self.is_key_disabled(&key),
                    row_break: layout.breaks_after(raw),
                    caps_mode: (key == KeyId::Caps).then(|| self.caps.mode()),
                })
            })
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_layouts;
    use futures::{FutureExt, StreamExt};
    use std::time::Duration;

    fn keyboard() -> VirtualKeyboard {
        let config = KioskConfig::embedded().unwrap().into_inner();
        let provider = KeyLayoutProvider::new(default_layouts().unwrap().into_inner());
        VirtualKeyboard::new(provider, &config)
    }

    fn drain(rx: &mut UnboundedReceiver<KeyboardEvent>) -> Vec<KeyboardEvent> {
        let mut events = Vec::new();
        while let Some(Some(event)) = rx.next().now_or_never() {
            events.push(event);
        }
        events
    }

    fn type_text(kb: &mut VirtualKeyboard, keys: &[&str]) {
        for key in keys {
            kb.press(key);
        }
    }

    /// Test 1: The buffer never grows past the maximum length
    #[test]
    fn test_buffer_is_bounded() {
        let mut kb = keyboard();
        let keys = ["q", "w", "space", "ru_hard", "e", "lang", "ru_zh", "7"];
        for round in 0..40 {
            kb.press(keys[round % keys.len()]);
            assert!(kb.buffer().chars().count() <= kb.max_length());
        }
        assert_eq!(kb.buffer().chars().count(), kb.max_length());

        // Backspace still works at the limit
        assert!(kb.press("backspace"));
        assert_eq!(kb.buffer().chars().count(), kb.max_length() - 1);
    }

    /// Test 2: Multi-character fallbacks are cut to the remaining room
    #[test]
    fn test_long_fallback_is_truncated() {
        let mut kb = keyboard();
        for _ in 0..13 {
            kb.press("a");
        }
        assert!(kb.press("xyz"));
        assert_eq!(kb.buffer(), "aaaaaaaaaaaaaxy");
        assert!(!kb.press("a"));
    }

    /// Test 3: Shift-once upper-cases exactly one character
    #[test]
    fn test_shift_once() {
        let mut kb = keyboard();
        kb.press("caps");
        assert_eq!(kb.caps_mode(), CapsMode::ShiftOnce);

        type_text(&mut kb, &["h", "i"]);
        assert_eq!(kb.buffer(), "Hi");
        assert_eq!(kb.caps_mode(), CapsMode::Normal);
    }

    /// Test 4: Double tap locks caps; slow taps do not
    #[test]
    fn test_caps_double_tap() {
        let mut kb = keyboard();
        let t0 = Instant::now();

        kb.press_at("caps", t0);
        kb.press_at("caps", t0 + Duration::from_millis(120));
        assert_eq!(kb.caps_mode(), CapsMode::CapsLock);

        type_text(&mut kb, &["o", "k"]);
        assert_eq!(kb.buffer(), "OK");
        assert_eq!(kb.caps_mode(), CapsMode::CapsLock);

        kb.press_at("caps", t0 + Duration::from_secs(2));
        assert_eq!(kb.caps_mode(), CapsMode::Normal);
        kb.press_at("caps", t0 + Duration::from_secs(3));
        kb.press_at("caps", t0 + Duration::from_secs(4));
        assert_eq!(kb.caps_mode(), CapsMode::Normal);
    }

    /// Test 5: Other keys do not move the double-tap timer
    #[test]
    fn test_other_keys_do_not_reset_timer() {
        let mut kb = keyboard();
        let t0 = Instant::now();

        kb.press_at("caps", t0);
        kb.press_at("lang", t0 + Duration::from_millis(50));
        kb.press_at("caps", t0 + Duration::from_millis(100));
        assert_eq!(kb.caps_mode(), CapsMode::CapsLock);
    }

    /// Test 6: Switching language keeps the buffer
    #[test]
    fn test_language_toggle_keeps_buffer() {
        let mut kb = keyboard();
        type_text(&mut kb, &["h", "i"]);
        kb.press("lang");
        assert_eq!(kb.language(), Language::Secondary);
        type_text(&mut kb, &["q"]);
        assert_eq!(kb.buffer(), "hiй");

        kb.press("lang");
        assert_eq!(kb.language(), Language::Primary);
        assert_eq!(kb.buffer(), "hiй");
    }

    /// Test 7: A disabled keyboard ignores every key, backspace included
    #[test]
    fn test_disabled_keyboard_ignores_presses() {
        let mut kb = keyboard();
        let mut rx = kb.subscribe();
        type_text(&mut kb, &["a", "b"]);
        drain(&mut rx);

        kb.set_enabled(false);
        for key in ["c", "backspace", "caps", "lang", "space", "done"] {
            assert!(!kb.press(key), "'{key}' should be ignored");
        }
        assert_eq!(kb.buffer(), "ab");
        assert_eq!(kb.caps_mode(), CapsMode::Normal);
        assert!(drain(&mut rx).is_empty());
    }

    /// Test 8: Submit needs the minimum length and latches processing
    #[test]
    fn test_submit_rules() {
        let mut kb = keyboard();
        let mut rx = kb.subscribe();

        kb.press("a");
        assert!(!kb.press("done"), "one character is too short");
        kb.press("b");
        assert!(kb.press("enter"));
        assert!(kb.is_processing());

        // Repeated submits and edits while processing change nothing
        assert!(!kb.press("done"));
        assert!(!kb.press("c"));
        assert!(!kb.press("backspace"));
        assert_eq!(kb.buffer(), "ab");

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                KeyboardEvent::InputChanged("a".into()),
                KeyboardEvent::InputChanged("ab".into()),
                KeyboardEvent::Submitted("ab".into()),
            ]
        );
    }

    /// Test 9: Whitespace does not count towards the submit minimum
    #[test]
    fn test_submit_uses_trimmed_length() {
        let mut kb = keyboard();
        type_text(&mut kb, &["space", "a", "space"]);
        assert!(kb.is_key_disabled(&KeyId::Submit));
        assert!(!kb.press("done"));
    }

    /// Test 10: Events arrive in press order
    #[test]
    fn test_event_order() {
        let mut kb = keyboard();
        let mut rx = kb.subscribe();

        kb.press("caps");
        kb.press("h");
        kb.press("backspace");

        assert_eq!(
            drain(&mut rx),
            vec![
                KeyboardEvent::LayoutChanged,
                KeyboardEvent::InputChanged(String::new()),
                KeyboardEvent::InputChanged("H".into()),
                KeyboardEvent::LayoutChanged,
                KeyboardEvent::InputChanged(String::new()),
            ]
        );
    }

    /// Test 11: Subscribing again replaces the previous subscriber
    #[test]
    fn test_resubscribe() {
        let mut kb = keyboard();
        let mut first = kb.subscribe();
        let mut second = kb.subscribe();

        kb.press("a");
        assert!(drain(&mut first).is_empty());
        assert_eq!(drain(&mut second), vec![KeyboardEvent::InputChanged("a".into())]);

        kb.unsubscribe();
        assert_eq!(first.next().now_or_never(), Some(None));
    }

    /// Test 12: Key snapshot follows language, caps and disablement
    #[test]
    fn test_key_snapshot() {
        let mut kb = keyboard();
        let keys = kb.keys();
        assert!(!keys.iter().any(|k| k.id == "ru_hard"));
        let q = keys.iter().find(|k| k.id == "q").unwrap();
        assert_eq!(q.label, "q");
        let submit = keys.iter().find(|k| k.kind == KeyKind::Submit).unwrap();
        assert!(submit.disabled);

        kb.press("lang");
        kb.press("caps");
        let keys = kb.keys();
        let q = keys.iter().find(|k| k.id == "q").unwrap();
        assert_eq!(q.label, "Й");
        assert!(keys.iter().any(|k| k.id == "ru_hard"));
        let caps = keys.iter().find(|k| k.kind == KeyKind::Caps).unwrap();
        assert_eq!(caps.caps_mode, Some(CapsMode::ShiftOnce));
        assert!(keys.iter().any(|k| k.row_break));
    }

    /// Test 13: At the limit only backspace and (if long enough) submit stay enabled
    #[test]
    fn test_disablement_at_limit() {
        let mut kb = keyboard();
        for _ in 0..kb.max_length() {
            kb.press("a");
        }
        for key in kb.keys() {
            match key.kind {
                KeyKind::Backspace | KeyKind::Submit => assert!(!key.disabled, "{}", key.id),
                _ => assert!(key.disabled, "{}", key.id),
            }
        }
    }

    /// Test 14: Submit is refused while no pipeline is listening
    #[test]
    fn test_submit_without_subscriber() {
        let mut kb = keyboard();
        type_text(&mut kb, &["a", "b"]);

        assert!(!kb.press("done"));
        assert!(!kb.is_processing());

        // The keyboard stays usable
        assert!(kb.press("backspace"));
        assert!(kb.press("c"));
        assert_eq!(kb.buffer(), "ac");
    }

    /// Test 15: Submit is refused once the subscriber has gone away
    #[test]
    fn test_submit_after_subscriber_dropped() {
        let mut kb = keyboard();
        let rx = kb.subscribe();
        type_text(&mut kb, &["a", "b"]);
        drop(rx);

        assert!(!kb.press("done"));
        assert!(!kb.is_processing());
        assert!(kb.press("backspace"));
        assert_eq!(kb.buffer(), "a");

        // A new subscriber makes submit work again
        let mut rx = kb.subscribe();
        kb.press("b");
        assert!(kb.press("done"));
        assert!(kb.is_processing());
        assert_eq!(
            drain(&mut rx),
            vec![
                KeyboardEvent::InputChanged("ab".into()),
                KeyboardEvent::Submitted("ab".into()),
            ]
        );
    }

    /// Test 16: Caps and language presses report the unchanged buffer
    #[test]
    fn test_caps_and_language_report_input() {
        let mut kb = keyboard();
        let mut rx = kb.subscribe();
        kb.press("q");
        kb.press("lang");
        kb.press("caps");

        assert_eq!(
            drain(&mut rx),
            vec![
                KeyboardEvent::InputChanged("q".into()),
                KeyboardEvent::LayoutChanged,
                KeyboardEvent::InputChanged("q".into()),
                KeyboardEvent::LayoutChanged,
                KeyboardEvent::InputChanged("q".into()),
            ]
        );
    }
}
