//! UI state machine
//!
//! Pure state machine that processes terminal, store and backend events,
//! producing actions for the runtime to execute. Its only I/O is reading the
//! store when the change feed says a collection changed.
//!
//! # Architecture
//!
//! The App owns the login form and the two list screens of the main window
//! (sidebar and chat), each with its own binding. Selecting a room in the
//! sidebar opens it in the chat. Rows reconfigured while handling an event
//! turn into [`AppAction::Enrich`] actions for avatars and thumbnails.

use std::{iter, sync::Arc};

use entropy_store::{CollectionKey, Room, Session, Store};

use crate::{
    AppAction, AppEvent, BindingError, ChatScreen, Composer, DropOperation, Formatters, KeyInput,
    LoginForm, LoginOutcome, Pane, Screen, Settings, SidebarScreen, SyncState,
};

/// Rows scrolled by PageUp/PageDown.
const PAGE: isize = 10;

/// UI state machine.
#[derive(Debug)]
pub struct App<S: Store> {
    store: S,
    settings: Settings,
    formatters: Arc<Formatters>,
    screen: Screen,
    login: LoginForm,
    /// Logged-in session. `None` on the login screen.
    session: Option<Session>,
    sync: SyncState,
    sidebar: SidebarScreen,
    chat: ChatScreen,
    /// Pane receiving keys on the main screen.
    focus: Pane,
    composer: Composer,
    /// Window title.
    title: String,
    /// Operation offered for files currently dragged over the chat.
    drop_operation: DropOperation,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Status message to display.
    status_message: Option<String>,
}

impl<S: Store> App<S> {
    /// Create an App on the login screen. Nothing is read until
    /// [`start`](Self::start).
    pub fn new(store: S, settings: Settings) -> Self {
        let formatters = Arc::new(Formatters::new(&settings));
        Self {
            sidebar: SidebarScreen::new(store.clone(), settings.diff, Arc::clone(&formatters)),
            chat: ChatScreen::new(settings.diff, Arc::clone(&formatters)),
            login: LoginForm::new(&settings.prefill),
            title: settings.app_name.clone(),
            store,
            settings,
            formatters,
            screen: Screen::Login,
            session: None,
            sync: SyncState::Idle,
            focus: Pane::Sidebar,
            composer: Composer::new(),
            drop_operation: DropOperation::None,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Decide the first screen.
    ///
    /// A stored session skips the login form and starts syncing right away.
    pub fn start(&mut self) -> Vec<AppAction> {
        let mut actions = match self.store.load_session() {
            Ok(Some(session)) => {
                tracing::info!(user = %session.user_id, "resuming stored session");
                self.enter_main(session)
            },
            Ok(None) => vec![AppAction::Render],
            Err(error) => {
                tracing::warn!(%error, "failed to load stored session");
                vec![AppAction::Render]
            },
        };
        self.enrich(&mut actions);
        actions
    }

    /// Process an event and return actions for the runtime.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        let mut actions = match event {
            AppEvent::Key(key) => match self.screen {
                Screen::Login => self.handle_login_key(key),
                Screen::Main => self.handle_main_key(key),
            },
            AppEvent::Paste(text) => self.handle_paste(&text),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::CollectionChanged(key) => self.handle_collection_change(key),
            AppEvent::ChangesLagged => self.refresh_all(),
            AppEvent::LoggedIn(session) => {
                self.login.finish();
                self.enter_main(session)
            },
            AppEvent::LoginFailed(error) => {
                self.login.show_error(&error);
                vec![AppAction::Render]
            },
            AppEvent::SyncStarted => {
                self.sync = SyncState::Syncing;
                vec![AppAction::Render]
            },
            AppEvent::SyncFailed(error) => {
                tracing::warn!(%error, "sync failed");
                self.sync = SyncState::Failed(error.to_string());
                self.status_message = Some(format!("Sync failed: {error}"));
                vec![AppAction::Render]
            },
            AppEvent::FilesDragged { paths } => {
                self.drop_operation = self.chat.drag_entered(&paths);
                vec![AppAction::Render]
            },
            AppEvent::FilesDropped { paths } => {
                self.drop_operation = DropOperation::None;
                let uploads = self.chat.perform_drop(paths);
                if uploads.is_empty() {
                    self.status_message = Some("Open a room to upload files".into());
                    return vec![AppAction::Render];
                }
                self.status_message = Some(format!("Uploading {} file(s)...", uploads.len()));
                uploads.into_iter().map(AppAction::Upload).chain(iter::once(AppAction::Render)).collect()
            },
            AppEvent::EnrichmentReady { pane, ticket, result } => {
                let updated = match pane {
                    Pane::Sidebar => self.sidebar.complete_enrichment(&ticket, result),
                    Pane::Chat => self.chat.complete_enrichment(&ticket, result),
                };
                if updated { vec![AppAction::Render] } else { vec![] }
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        };
        self.enrich(&mut actions);
        actions
    }

    fn handle_login_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if key == KeyInput::Esc {
            return vec![AppAction::Quit];
        }
        match self.login.handle_key(key) {
            LoginOutcome::Submit(credentials) => {
                tracing::debug!(user = %credentials.username, homeserver = %credentials.homeserver, "logging in");
                vec![AppAction::Login(credentials), AppAction::Render]
            },
            LoginOutcome::Edited => vec![AppAction::Render],
        }
    }

    fn handle_main_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match (self.focus, key) {
            (_, KeyInput::Esc) => return vec![AppAction::Quit],
            (_, KeyInput::Tab | KeyInput::BackTab) => self.focus = self.focus.toggle(),
            (_, KeyInput::PageUp) => self.chat.scroll(-PAGE),
            (_, KeyInput::PageDown) => self.chat.scroll(PAGE),
            (Pane::Sidebar, KeyInput::Up) => self.move_room(-1),
            (Pane::Sidebar, KeyInput::Down) => self.move_room(1),
            (Pane::Sidebar, KeyInput::Enter | KeyInput::Right) => self.focus = Pane::Chat,
            (Pane::Sidebar, KeyInput::Char(c)) => {
                self.focus = Pane::Chat;
                self.composer.insert(c);
            },
            (Pane::Sidebar, _) => return vec![],
            (Pane::Chat, KeyInput::Up) => self.chat.scroll(-1),
            (Pane::Chat, KeyInput::Down) => self.chat.scroll(1),
            (Pane::Chat, KeyInput::Enter) => return self.send_message(),
            (Pane::Chat, KeyInput::Char(c)) => self.composer.insert(c),
            (Pane::Chat, KeyInput::Backspace) => self.composer.backspace(),
            (Pane::Chat, KeyInput::Delete) => self.composer.delete(),
            (Pane::Chat, KeyInput::Left) => self.composer.left(),
            (Pane::Chat, KeyInput::Right) => self.composer.right(),
            (Pane::Chat, KeyInput::Home) => self.composer.home(),
            (Pane::Chat, KeyInput::End) => self.composer.end(),
        }
        vec![AppAction::Render]
    }

    fn handle_paste(&mut self, text: &str) -> Vec<AppAction> {
        match self.screen {
            Screen::Login => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    let _ = self.login.handle_key(KeyInput::Char(c));
                }
            },
            Screen::Main => {
                self.focus = Pane::Chat;
                self.composer.insert_str(text);
            },
        }
        vec![AppAction::Render]
    }

    /// Handle Enter in the chat (send the composer's text).
    fn send_message(&mut self) -> Vec<AppAction> {
        let Some(room_id) = self.chat.room_id() else {
            self.status_message = Some("No room selected".into());
            return vec![AppAction::Render];
        };
        match self.composer.take() {
            Some(body) => vec![AppAction::SendMessage { room_id, body }, AppAction::Render],
            None => vec![],
        }
    }

    fn enter_main(&mut self, session: Session) -> Vec<AppAction> {
        tracing::info!(user = %session.user_id, homeserver = %session.homeserver, "entering main screen");
        self.screen = Screen::Main;
        self.focus = Pane::Sidebar;
        self.session = Some(session.clone());

        match self.sidebar.appear() {
            Ok(Some(room)) => self.open_room(room),
            Ok(None) => {},
            Err(error) => self.report(&error),
        }
        vec![AppAction::StartSyncing(session), AppAction::Render]
    }

    fn move_room(&mut self, delta: isize) {
        match self.sidebar.move_selection(delta) {
            Ok(Some(room)) => self.open_room(room),
            Ok(None) => {},
            Err(error) => self.report(&error),
        }
    }

    /// Show `room` in the chat and title the window after it.
    fn open_room(&mut self, room: Room) {
        self.title = self.settings.room_title(&room.smart_name());
        if let Err(error) = self.chat.open(self.store.clone(), room) {
            self.report(&error);
        }
    }

    /// Keep the chat on the sidebar's selection after the rooms changed.
    ///
    /// Rooms arriving in an empty sidebar select the first one, as on
    /// appear. A selected room that vanished closes the chat.
    fn follow_sidebar(&mut self) {
        let selected = match self.sidebar.selected().cloned() {
            Some(room) => Some(room),
            None if self.sidebar.count() > 0 => match self.sidebar.select(0) {
                Ok(room) => Some(room),
                Err(error) => {
                    self.report(&error);
                    None
                },
            },
            None => None,
        };

        match selected {
            Some(room) => self.open_room(room),
            None if self.chat.room_id().is_some() => {
                self.chat.close();
                self.title.clone_from(&self.settings.app_name);
            },
            None => {},
        }
    }

    fn handle_collection_change(&mut self, key: CollectionKey) -> Vec<AppAction> {
        if self.screen != Screen::Main {
            return vec![];
        }

        let rooms = self.sidebar.handle_change(key).unwrap_or_else(|error| {
            self.report(&error);
            true
        });
        if rooms {
            self.follow_sidebar();
        }
        let messages = self.chat.handle_change(key).unwrap_or_else(|error| {
            self.report(&error);
            true
        });

        if rooms || messages { vec![AppAction::Render] } else { vec![] }
    }

    fn refresh_all(&mut self) -> Vec<AppAction> {
        if self.screen != Screen::Main {
            return vec![];
        }
        tracing::debug!("change notifications lagged, refreshing all lists");

        if let Err(error) = self.sidebar.refresh() {
            self.report(&error);
        }
        self.follow_sidebar();
        if let Err(error) = self.chat.refresh() {
            self.report(&error);
        }
        vec![AppAction::Render]
    }

    /// Configure rows changed by the last event and queue their enrichment.
    fn enrich(&mut self, actions: &mut Vec<AppAction>) {
        if self.screen != Screen::Main {
            return;
        }
        match self.sidebar.configure_dirty() {
            Ok(tickets) => actions.extend(
                tickets.into_iter().map(|ticket| AppAction::Enrich { pane: Pane::Sidebar, ticket }),
            ),
            Err(error) => self.report(&error),
        }
        match self.chat.configure_dirty() {
            Ok(tickets) => actions
                .extend(tickets.into_iter().map(|ticket| AppAction::Enrich { pane: Pane::Chat, ticket })),
            Err(error) => self.report(&error),
        }
    }

    fn report(&mut self, error: &BindingError) {
        tracing::error!(%error, "list binding failed");
        self.status_message = Some(format!("Error: {error}"));
    }

    /// Shown screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Login form.
    pub fn login(&self) -> &LoginForm {
        &self.login
    }

    /// Logged-in session. `None` before login.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Backend sync state.
    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    /// Room list.
    pub fn sidebar(&self) -> &SidebarScreen {
        &self.sidebar
    }

    /// Message list of the open room.
    pub fn chat(&self) -> &ChatScreen {
        &self.chat
    }

    /// Pane receiving keys.
    pub fn focus(&self) -> Pane {
        self.focus
    }

    /// Message input line.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Window title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Operation offered for files dragged over the chat.
    pub fn drop_operation(&self) -> DropOperation {
        self.drop_operation
    }

    /// Settings the App was created with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shared formatters.
    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }

    /// Store the lists read from.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Status message to display. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use entropy_store::{MemoryStore, Message, User};

    use super::*;
    use crate::{BackendError, EnrichmentRequest, ListSurface, LoginError, LoginPrefill, Media};

    fn session() -> Session {
        Session {
            user_id: "@alice:example.org".into(),
            homeserver: "https://example.org".into(),
            access_token: "token".into(),
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let bob = User::new("@bob:example.org", "Bob");
        store.store_room(&Room::new(1, 20).with_name("general")).expect("store");
        store.store_room(&Room::new(2, 10).with_name("random")).expect("store");
        store.store_message(&Message::text("$a", 1, bob.clone(), "hello", 1)).expect("store");
        store.store_message(&Message::text("$b", 2, bob, "other room", 2)).expect("store");
        store
    }

    fn logged_in_app(store: MemoryStore) -> App<MemoryStore> {
        store.store_session(&session()).expect("store");
        let mut app = App::new(store, Settings::default());
        let _ = app.start();
        app
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            let _ = app.handle(AppEvent::Key(KeyInput::Char(c)));
        }
    }

    #[test]
    fn start_without_session_shows_login() {
        let mut app = App::new(MemoryStore::new(), Settings::default());

        let actions = app.start();

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.screen(), Screen::Login);
        assert_eq!(app.title(), "Entropy");
    }

    #[test]
    fn stored_session_skips_login() {
        let store = seeded_store();
        store.store_session(&session()).expect("store");
        let mut app = App::new(store, Settings::default());

        let actions = app.start();

        assert!(actions.contains(&AppAction::StartSyncing(session())));
        assert_eq!(app.screen(), Screen::Main);
        assert_eq!(app.chat().room_id(), Some(1));
        assert_eq!(app.title(), "Entropy - #general");
        assert!(
            actions.iter().any(|action| matches!(action, AppAction::Enrich { pane: Pane::Chat, .. }))
        );
    }

    #[test]
    fn login_submits_prefilled_credentials() {
        let settings = Settings {
            prefill: LoginPrefill {
                username: Some("alice".into()),
                password: Some("pw".into()),
                homeserver: Some("example.org".into()),
            },
            ..Settings::default()
        };
        let mut app = App::new(seeded_store(), settings);
        let _ = app.start();

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));
        assert!(matches!(actions.as_slice(), [AppAction::Login(credentials), AppAction::Render]
            if credentials.homeserver == "https://example.org"));

        let actions = app.handle(AppEvent::LoggedIn(session()));
        assert!(actions.contains(&AppAction::StartSyncing(session())));
        assert_eq!(app.screen(), Screen::Main);
        assert!(!app.login().is_pending());
    }

    #[test]
    fn login_failure_is_shown() {
        let mut app = App::new(MemoryStore::new(), Settings::default());
        let _ = app.start();

        let _ = app.handle(AppEvent::LoginFailed(LoginError::Backend(BackendError::Status {
            status: 403,
            reason: "Forbidden".into(),
        })));

        assert_eq!(app.screen(), Screen::Login);
        assert_eq!(app.login().error(), Some("Incorrect username or password."));
    }

    #[test]
    fn sidebar_navigation_switches_room_and_title() {
        let mut app = logged_in_app(seeded_store());

        let _ = app.handle(AppEvent::Key(KeyInput::Down));

        assert_eq!(app.chat().room_id(), Some(2));
        assert_eq!(app.title(), "Entropy - #random");
        assert_eq!(app.chat().binding().items()[0].body, "other room");
    }

    #[test]
    fn enter_sends_message_and_clears_composer() {
        let mut app = logged_in_app(seeded_store());
        let _ = app.handle(AppEvent::Key(KeyInput::Tab));
        type_text(&mut app, "hi");

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));

        assert_eq!(actions, vec![
            AppAction::SendMessage { room_id: 1, body: "hi".into() },
            AppAction::Render
        ]);
        assert!(app.composer().text().is_empty());
        assert!(app.handle(AppEvent::Key(KeyInput::Enter)).is_empty());
    }

    #[test]
    fn typing_in_sidebar_moves_focus_to_composer() {
        let mut app = logged_in_app(seeded_store());
        type_text(&mut app, "x");
        assert_eq!(app.focus(), Pane::Chat);
        assert_eq!(app.composer().text(), "x");
    }

    #[test]
    fn esc_quits() {
        let mut app = logged_in_app(seeded_store());
        assert_eq!(app.handle(AppEvent::Key(KeyInput::Esc)), vec![AppAction::Quit]);
    }

    #[test]
    fn new_message_refreshes_chat_and_requests_avatar() {
        let store = seeded_store();
        let mut app = logged_in_app(store.clone());
        store
            .store_message(&Message::text("$c", 1, User::new("@carol:x", "Carol"), "yo", 3))
            .expect("store");

        let actions = app.handle(AppEvent::CollectionChanged(CollectionKey::Messages(1)));

        assert_eq!(actions.first(), Some(&AppAction::Render));
        assert!(actions.iter().any(|action| matches!(action,
            AppAction::Enrich { pane: Pane::Chat, ticket }
                if ticket.request == EnrichmentRequest::Avatar { user_id: "@carol:x".into() })));
        assert_eq!(app.chat().list().row_count(), 2);
        assert!(app.handle(AppEvent::CollectionChanged(CollectionKey::Messages(2))).is_empty());
    }

    #[test]
    fn rooms_arriving_after_login_open_the_first() {
        let store = MemoryStore::new();
        let mut app = App::new(store.clone(), Settings::default());
        let _ = app.start();
        let _ = app.handle(AppEvent::LoggedIn(session()));
        assert_eq!(app.chat().room_id(), None);

        store.store_room(&Room::new(5, 1).with_name("lobby")).expect("store");
        let _ = app.handle(AppEvent::CollectionChanged(CollectionKey::Rooms));

        assert_eq!(app.chat().room_id(), Some(5));
        assert_eq!(app.title(), "Entropy - #lobby");
    }

    #[test]
    fn removed_room_closes_chat() {
        let store = MemoryStore::new();
        store.store_room(&Room::new(1, 0).with_name("only")).expect("store");
        let mut app = logged_in_app(store.clone());
        assert_eq!(app.chat().room_id(), Some(1));

        store.remove_room(1).expect("remove");
        let _ = app.handle(AppEvent::CollectionChanged(CollectionKey::Rooms));

        assert_eq!(app.chat().room_id(), None);
        assert_eq!(app.title(), "Entropy");
    }

    #[test]
    fn dropped_files_become_uploads() {
        let mut app = logged_in_app(seeded_store());
        let paths = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];

        let _ = app.handle(AppEvent::FilesDragged { paths: paths.clone() });
        assert_eq!(app.drop_operation(), DropOperation::Copy);

        let actions = app.handle(AppEvent::FilesDropped { paths });
        assert_eq!(
            actions.iter().filter(|action| matches!(action, AppAction::Upload(_))).count(),
            2
        );
        assert_eq!(app.drop_operation(), DropOperation::None);
    }

    #[test]
    fn enrichment_lands_in_chat_row() {
        let store = seeded_store();
        store.store_session(&session()).expect("store");
        let mut app = App::new(store, Settings::default());
        let actions = app.start();
        let ticket = actions
            .into_iter()
            .find_map(|action| match action {
                AppAction::Enrich { pane: Pane::Chat, ticket } => Some(ticket),
                _ => None,
            })
            .expect("avatar ticket");
        let media = Media { source: "mxc://x/a".into(), mimetype: None, data: vec![1, 2] };

        let actions = app.handle(AppEvent::EnrichmentReady {
            pane: Pane::Chat,
            ticket: ticket.clone(),
            result: Ok(media.clone()),
        });

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.chat().list().view(0).and_then(|view| view.avatar.as_ref()), Some(&media));

        // Switching rooms reconfigures the slot; the old ticket is now stale.
        let _ = app.handle(AppEvent::Key(KeyInput::Down));
        let actions =
            app.handle(AppEvent::EnrichmentReady { pane: Pane::Chat, ticket, result: Ok(media) });
        assert!(!actions.contains(&AppAction::Render));
    }
}
