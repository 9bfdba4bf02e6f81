use chrono::{DateTime, Utc};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;

use crate::chat::{ChatMessage, Clock};
use crate::config::Config;
use crate::session::Session;

pub use field::TextField;

mod field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Message,
    Ttl,
    Connect,
}

/// Work a handler wants done outside the app state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Quit,
    CopyToClipboard { label: &'static str, text: String },
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub message: TextField,
    pub ttl: TextField,
    pub peer_input: TextField,
    /// Rows scrolled back from the newest message
    pub scroll_offset: usize,
    /// Furthest `scroll_offset` can go; set by the renderer from the wrapped row count
    scroll_limit: usize,

    pub session: Session,
    /// What the chat view shows; rebuilt from the store on every tick and action
    pub visible: Vec<ChatMessage>,
    pub last_frame: Option<Vec<u8>>,

    default_ttl: Option<u64>,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let session = Session::new(clock.clone());
        Self::with_session(session, config.default_ttl_secs, clock)
    }

    pub fn with_session(session: Session, default_ttl: Option<u64>, clock: Arc<dyn Clock>) -> Self {
        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            message: TextField::default(),
            ttl: TextField::default(),
            peer_input: TextField::default(),
            scroll_offset: 0,
            scroll_limit: 0,
            session,
            visible: Vec::new(),
            last_frame: None,
            default_ttl,
            clock,
        };
        app.refresh();
        app
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn on_tick(&mut self) {
        self.refresh();
    }

    /// Re-read (and prune) the store into the visible list.
    pub fn refresh(&mut self) {
        self.visible = self.session.snapshot();
    }

    pub fn set_scroll_limit(&mut self, limit: usize) {
        self.scroll_limit = limit;
        self.scroll_offset = self.scroll_offset.min(limit);
    }

    fn scroll_back(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(rows).min(self.scroll_limit);
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.session.notice(text);
        self.refresh();
    }

    pub fn handle_input(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            _ => Vec::new(),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Effect::Quit];
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key.code),
            InputMode::Message => match key.code {
                KeyCode::Enter => self.submit_message(),
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    Vec::new()
                }
                KeyCode::Tab => {
                    self.input_mode = InputMode::Ttl;
                    Vec::new()
                }
                code => {
                    self.message.handle_key(code);
                    Vec::new()
                }
            },
            InputMode::Ttl => {
                match key.code {
                    KeyCode::Enter | KeyCode::Tab => self.input_mode = InputMode::Message,
                    KeyCode::Esc => self.input_mode = InputMode::Normal,
                    code => {
                        self.ttl.handle_key(code);
                    }
                }
                Vec::new()
            }
            InputMode::Connect => {
                match key.code {
                    KeyCode::Enter => {
                        let peer_id = self.peer_input.value().trim().to_string();
                        if !peer_id.is_empty() {
                            self.connect_to_peer(&peer_id);
                        }
                        self.peer_input.clear();
                        self.input_mode = InputMode::Normal;
                    }
                    KeyCode::Esc => {
                        self.peer_input.clear();
                        self.input_mode = InputMode::Normal;
                    }
                    code => {
                        self.peer_input.handle_key(code);
                    }
                }
                Vec::new()
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Vec<Effect> {
        match code {
            KeyCode::Char('q') => return vec![Effect::Quit],
            KeyCode::Char('i') | KeyCode::Enter => self.input_mode = InputMode::Message,
            KeyCode::Char('t') => self.input_mode = InputMode::Ttl,
            KeyCode::Char('c') => {
                self.peer_input.clear();
                self.input_mode = InputMode::Connect;
            }
            KeyCode::Char('w') => self.wipe_chat(),
            KeyCode::Char('y') => return vec![self.copy_id()],
            KeyCode::Up => self.scroll_back(1),
            KeyCode::Down => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            KeyCode::PageUp => self.scroll_back(10),
            KeyCode::PageDown => self.scroll_offset = self.scroll_offset.saturating_sub(10),
            _ => {}
        }
        Vec::new()
    }

    fn submit_message(&mut self) -> Vec<Effect> {
        let input = self.message.value().trim().to_string();
        if input.is_empty() {
            return Vec::new();
        }
        self.message.clear();

        if let Some(command) = input.strip_prefix('/') {
            return self.handle_command(command);
        }

        let ttl = self.effective_ttl();
        let frame = self.session.send(&input, ttl);
        self.last_frame = Some(frame);
        self.ttl.clear();
        self.scroll_offset = 0;
        self.refresh();
        Vec::new()
    }

    fn handle_command(&mut self, command: &str) -> Vec<Effect> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some(name) = parts.first() else {
            return Vec::new();
        };
        let args = &parts[1..];

        match name.to_lowercase().as_str() {
            "connect" | "c" => match args {
                [peer_id] => self.connect_to_peer(peer_id),
                _ => self.notify("Usage: /connect <peer-id>"),
            },
            "wipe" | "w" => self.wipe_chat(),
            "ttl" => match args {
                [arg] if *arg == "off" || parse_ttl(arg) == Some(0) => {
                    self.ttl.clear();
                    self.notify("Auto-delete off");
                }
                [secs] if parse_ttl(secs).is_some() => {
                    self.ttl.set(*secs);
                    self.notify(format!("Next message auto-deletes after {}s", secs));
                }
                _ => self.notify("Usage: /ttl <seconds|off>"),
            },
            "id" => {
                let id = self.session.local_id();
                self.notify(format!("My ID: {}", id));
            }
            "copy" => return vec![self.copy_id()],
            "frame" => match self.last_frame.as_deref().map(hex::encode) {
                Some(frame_hex) => {
                    self.notify(format!("Last frame: {}", frame_hex));
                    return vec![Effect::CopyToClipboard {
                        label: "frame",
                        text: frame_hex,
                    }];
                }
                None => self.notify("Nothing sent yet"),
            },
            "unmask" | "u" => match args {
                [frame_hex] => {
                    if let Err(err) = self.session.unmask(frame_hex) {
                        log::warn!("Unmask failed: {}", err);
                        self.session.notice(format!("Unmask failed: {}", err));
                    }
                    self.refresh();
                }
                _ => self.notify("Usage: /unmask <hex-frame>"),
            },
            "help" | "h" => self.show_help(),
            "quit" | "q" | "exit" => return vec![Effect::Quit],
            other => self.notify(format!(
                "Unknown command: {}. Type /help for available commands.",
                other
            )),
        }
        Vec::new()
    }

    /// Connect and report the outcome in the chat; failure leaves the session as it was.
    pub fn connect_to_peer(&mut self, peer_id: &str) {
        if let Err(err) = self.session.connect(peer_id) {
            log::warn!(
                "Connection failed ({}): {}",
                if self.session.is_connected() { "keeping previous peer" } else { "still disconnected" },
                err
            );
            self.session.notice(format!("Connection failed: {}", err));
        }
        self.refresh();
    }

    fn wipe_chat(&mut self) {
        self.session.wipe();
        self.scroll_offset = 0;
        self.refresh();
    }

    fn copy_id(&self) -> Effect {
        Effect::CopyToClipboard {
            label: "ID",
            text: self.session.local_id(),
        }
    }

    fn effective_ttl(&self) -> Option<u64> {
        if self.ttl.is_blank() {
            self.default_ttl
        } else {
            parse_ttl(self.ttl.value())
        }
    }

    fn show_help(&mut self) {
        let help_text = [
            "Commands:",
            "/connect <peer-id> - Use a peer's ID as the mask key",
            "/ttl <seconds|off> - Auto-delete the next message (0 is off)",
            "/wipe - Delete every message",
            "/id, /copy - Show or copy your ID",
            "/frame - Show and copy the last masked frame (hex)",
            "/unmask <hex> - Unmask a frame with the peer key",
            "/quit - Exit",
            "Keys (normal mode): i=type, t=TTL, c=connect, w=wipe, y=copy ID, q=quit",
        ];
        for line in help_text {
            self.session.notice(line);
        }
        self.refresh();
    }
}

/// TTL field rule: trimmed, non-empty, all ASCII digits. Anything else means no TTL.
pub fn parse_ttl(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ManualClock, Sender};
    use crate::crypto::{MaskingCipher, LOCAL_KEY_LEN};

    fn app_with(default_ttl: Option<u64>) -> (App, ManualClock) {
        let clock = ManualClock::new();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let cipher = MaskingCipher::with_local_key([0xab; LOCAL_KEY_LEN]);
        let session = Session::with_cipher(shared.clone(), cipher);
        (App::with_session(session, default_ttl, shared), clock)
    }

    fn app() -> (App, ManualClock) {
        app_with(None)
    }

    fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
        app.handle_input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn send(app: &mut App, text: &str) -> Vec<Effect> {
        app.input_mode = InputMode::Message;
        type_text(app, text);
        press(app, KeyCode::Enter)
    }

    fn bodies(app: &App) -> Vec<&str> {
        app.visible.iter().map(|m| m.body.as_str()).collect()
    }

    #[test]
    fn sending_appends_and_clears_fields() {
        let (mut app, _) = app();
        app.ttl.set("10");
        send(&mut app, "  hello  ");

        assert_eq!(bodies(&app), vec!["hello"]);
        assert_eq!(app.visible[0].sender, Sender::You);
        assert!(app.visible[0].expires_at.is_some());
        assert!(app.message.value().is_empty());
        assert!(app.ttl.value().is_empty());
        assert_eq!(app.input_mode, InputMode::Message);
        assert!(app.last_frame.is_some());
    }

    #[test]
    fn blank_message_is_ignored() {
        let (mut app, _) = app();
        send(&mut app, "   ");
        assert!(app.visible.is_empty());
        assert!(app.last_frame.is_none());
    }

    #[test]
    fn expiring_message_drops_off_on_tick() {
        let (mut app, clock) = app();
        app.ttl.set("2");
        send(&mut app, "ephemeral");
        send(&mut app, "permanent");

        clock.advance_secs(1);
        app.on_tick();
        assert_eq!(bodies(&app), vec!["ephemeral", "permanent"]);

        clock.advance_secs(1);
        app.on_tick();
        assert_eq!(bodies(&app), vec!["permanent"]);
    }

    #[test]
    fn ttl_field_parsing() {
        assert_eq!(parse_ttl("15"), Some(15));
        assert_eq!(parse_ttl(" 7 "), Some(7));
        assert_eq!(parse_ttl("0"), Some(0));
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("-5"), None);
        assert_eq!(parse_ttl("1.5"), None);
        assert_eq!(parse_ttl("ten"), None);
        assert_eq!(parse_ttl("99999999999999999999999"), None);
    }

    #[test]
    fn non_numeric_ttl_means_no_expiry() {
        let (mut app, clock) = app_with(Some(5));
        app.ttl.set("soon");
        send(&mut app, "kept");
        clock.advance_secs(60);
        app.on_tick();
        assert_eq!(bodies(&app), vec!["kept"]);
    }

    #[test]
    fn default_ttl_applies_when_field_blank() {
        let (mut app, clock) = app_with(Some(5));
        send(&mut app, "uses default");
        clock.advance_secs(5);
        app.on_tick();
        assert!(app.visible.is_empty());
    }

    #[test]
    fn connect_success_adds_no_failure_notice() {
        let (mut app, _) = app();
        app.connect_to_peer("a1b2c3d4e5f60718");

        assert!(app.session.is_connected());
        assert!(app.visible.iter().all(|m| !m.body.contains("failed")));
        assert_eq!(bodies(&app), vec!["Connected to peer a1b2c3d4..."]);
    }

    #[test]
    fn connect_failure_becomes_system_notice() {
        let (mut app, _) = app();
        app.connect_to_peer("not-hex!!");

        assert!(!app.session.is_connected());
        assert_eq!(app.visible.len(), 1);
        assert!(app.visible[0].sender.is_system());
        assert!(app.visible[0].body.starts_with("Connection failed"));
    }

    #[test]
    fn connect_dialog_flow() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.input_mode, InputMode::Connect);

        type_text(&mut app, "beef");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.session.peer_id(), Some("beef"));
        assert!(app.peer_input.value().is_empty());
    }

    #[test]
    fn empty_connect_dialog_does_nothing() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "  ");
        press(&mut app, KeyCode::Enter);
        assert!(!app.session.is_connected());
        assert!(app.visible.is_empty());
    }

    #[test]
    fn escape_cancels_connect_dialog() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "abcd");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.session.is_connected());
    }

    #[test]
    fn wipe_key_clears_history() {
        let (mut app, _) = app();
        send(&mut app, "one");
        send(&mut app, "two");
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('w'));
        assert_eq!(bodies(&app), vec!["🔥 Chat wiped!"]);
    }

    #[test]
    fn tab_moves_between_message_and_ttl() {
        let (mut app, _) = app();
        app.input_mode = InputMode::Message;
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input_mode, InputMode::Ttl);
        type_text(&mut app, "30");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input_mode, InputMode::Message);
        assert_eq!(app.ttl.value(), "30");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn quit_from_normal_mode_and_ctrl_c() {
        let (mut app, _) = app();
        assert_eq!(press(&mut app, KeyCode::Char('q')), vec![Effect::Quit]);

        app.input_mode = InputMode::Message;
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_input(Event::Key(ctrl_c)), vec![Effect::Quit]);
    }

    #[test]
    fn q_while_typing_is_just_a_letter() {
        let (mut app, _) = app();
        app.input_mode = InputMode::Message;
        assert!(press(&mut app, KeyCode::Char('q')).is_empty());
        assert_eq!(app.message.value(), "q");
    }

    #[test]
    fn copy_id_effect() {
        let (mut app, _) = app();
        assert_eq!(
            press(&mut app, KeyCode::Char('y')),
            vec![Effect::CopyToClipboard {
                label: "ID",
                text: "abababababababab".into()
            }]
        );
    }

    #[test]
    fn connect_command_with_bad_id() {
        let (mut app, _) = app();
        send(&mut app, "/connect not-hex!!");
        assert!(!app.session.is_connected());
        assert!(app.visible[0].body.contains("Connection failed"));
    }

    #[test]
    fn ttl_command_sets_field() {
        let (mut app, _) = app();
        send(&mut app, "/ttl 45");
        assert_eq!(app.ttl.value(), "45");

        send(&mut app, "/ttl off");
        assert!(app.ttl.value().is_empty());

        send(&mut app, "/ttl never");
        assert!(app.visible.last().unwrap().body.starts_with("Usage"));
    }

    #[test]
    fn frame_and_unmask_commands_round_trip() {
        let (mut app, _) = app();
        app.connect_to_peer("c0ffee");
        send(&mut app, "secret plans");

        let effects = send(&mut app, "/frame");
        let frame_hex = match effects.as_slice() {
            [Effect::CopyToClipboard { label: "frame", text }] => text.clone(),
            other => panic!("unexpected effects: {:?}", other),
        };
        assert_ne!(hex::decode(&frame_hex).unwrap(), b"secret plans".to_vec());

        send(&mut app, &format!("/unmask {}", frame_hex));
        let last = app.visible.last().unwrap();
        assert_eq!(last.body, "secret plans");
        assert_eq!(last.sender, Sender::Peer("c0ffee".into()));
    }

    #[test]
    fn frame_before_sending_reports_nothing() {
        let (mut app, _) = app();
        assert!(send(&mut app, "/frame").is_empty());
        assert_eq!(bodies(&app), vec!["Nothing sent yet"]);
    }

    #[test]
    fn unmask_with_bad_hex_reports_failure() {
        let (mut app, _) = app();
        send(&mut app, "/unmask zz");
        assert!(app.visible[0].body.starts_with("Unmask failed"));
    }

    #[test]
    fn unknown_command_hint() {
        let (mut app, _) = app();
        send(&mut app, "/dance");
        assert!(app.visible[0].body.starts_with("Unknown command: dance"));
        assert!(send(&mut app, "/quit").contains(&Effect::Quit));
    }

    #[test]
    fn scrolling_stays_between_newest_and_limit() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.scroll_offset, 0);

        app.set_scroll_limit(12);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.scroll_offset, 10);
        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.scroll_offset, 12);

        press(&mut app, KeyCode::Down);
        assert_eq!(app.scroll_offset, 11);
        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn shrinking_limit_pulls_offset_back() {
        let (mut app, _) = app();
        app.set_scroll_limit(30);
        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::PageUp);
        app.set_scroll_limit(5);
        assert_eq!(app.scroll_offset, 5);
    }

    #[test]
    fn zero_ttl_command_turns_auto_delete_off() {
        let (mut app, clock) = app();
        app.ttl.set("30");
        send(&mut app, "/ttl 0");
        assert!(app.ttl.value().is_empty());
        assert_eq!(app.visible.last().unwrap().body, "Auto-delete off");

        app.ttl.set("30");
        send(&mut app, "/ttl 000");
        assert!(app.ttl.value().is_empty());

        send(&mut app, "stays");
        clock.advance_secs(3600);
        app.on_tick();
        assert!(bodies(&app).contains(&"stays"));
    }
}
