//! Keybinding system for view-aware keyboard shortcuts
//!
//! One registry describes every key the terminal frontend understands. The
//! same registry resolves key events to actions, builds the footer legend and
//! builds the `:help` overlay, so the three never drift apart.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Which kind of screen is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Menu,
    Content,
}

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Home,
    End,
    Back,
    /// Start typing a row/page number; the digit is the first character
    Goto,
    /// Open the `:` prompt
    Command,
    Previous,
    Next,
    ToggleHidden,
    Interrupt,
}

/// A keybinding definition; several key combos may share one legend entry
#[derive(Debug, Clone)]
pub struct Keybinding {
    pub keys: Vec<(KeyCode, KeyModifiers)>,
    pub action: KeyAction,
    pub display: String,
    pub description: String,
}

impl Keybinding {
    /// Create a new keybinding with no modifiers
    pub fn new(key: KeyCode, action: KeyAction, display: &str, description: &str) -> Self {
        Self::with_keys(vec![(key, KeyModifiers::NONE)], action, display, description)
    }

    /// Create a keybinding reachable through several key combos
    pub fn with_keys(
        keys: Vec<(KeyCode, KeyModifiers)>,
        action: KeyAction,
        display: &str,
        description: &str,
    ) -> Self {
        Self {
            keys,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    /// True if `event` triggers this binding. Shift is ignored for characters.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let modifiers = match event.code {
            KeyCode::Char(_) => event.modifiers - KeyModifiers::SHIFT,
            _ => event.modifiers,
        };
        self.keys
            .iter()
            .any(|(code, mods)| *code == event.code && *mods == modifiers)
    }
}

/// View-aware keybinding registry
pub struct KeybindingContext {
    /// View-specific keybindings
    view_bindings: HashMap<View, Vec<Keybinding>>,
    /// Bindings available in every view
    global_bindings: Vec<Keybinding>,
}

impl Default for KeybindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingContext {
    /// Create a new keybinding context with default bindings
    pub fn new() -> Self {
        let mut ctx = Self {
            view_bindings: HashMap::new(),
            global_bindings: Vec::new(),
        };
        ctx.register_defaults();
        ctx
    }

    fn register_defaults(&mut self) {
        let ctrl = KeyModifiers::CONTROL;
        let none = KeyModifiers::NONE;
        let digits: Vec<(KeyCode, KeyModifiers)> =
            ('0'..='9').map(|c| (KeyCode::Char(c), none)).collect();

        self.global_bindings = vec![
            Keybinding::with_keys(
                vec![(KeyCode::Char('b'), ctrl), (KeyCode::PageUp, none)],
                KeyAction::PageUp,
                "^b/PgUp",
                "page up",
            ),
            Keybinding::with_keys(
                vec![(KeyCode::Char('f'), ctrl), (KeyCode::PageDown, none)],
                KeyAction::PageDown,
                "^f/PgDn",
                "page down",
            ),
            Keybinding::new(KeyCode::Up, KeyAction::ScrollUp, "\u{2191}", "scroll up"),
            Keybinding::new(KeyCode::Down, KeyAction::ScrollDown, "\u{2193}", "scroll down"),
            Keybinding::new(KeyCode::Home, KeyAction::Home, "Home", "top"),
            Keybinding::new(KeyCode::End, KeyAction::End, "End", "bottom"),
            Keybinding::new(KeyCode::Esc, KeyAction::Back, "esc", "back"),
            Keybinding::new(KeyCode::Char(':'), KeyAction::Command, ":help", "help"),
            Keybinding::with_keys(
                vec![(KeyCode::Char('c'), ctrl)],
                KeyAction::Interrupt,
                "^c",
                "interrupt",
            ),
        ];

        self.view_bindings.insert(
            View::Menu,
            vec![Keybinding::with_keys(
                digits.clone(),
                KeyAction::Goto,
                "[0-9]",
                "goto",
            )],
        );

        self.view_bindings.insert(
            View::Content,
            vec![
                Keybinding::new(KeyCode::Char('-'), KeyAction::Previous, "-", "previous"),
                Keybinding::new(KeyCode::Char('+'), KeyAction::Next, "+", "next"),
                Keybinding::with_keys(digits, KeyAction::Goto, "[0-9]", "goto"),
                Keybinding::new(KeyCode::Char('_'), KeyAction::ToggleHidden, "_", "hidden"),
            ],
        );
    }

    /// Get keybindings for a view (view-specific first, then global)
    pub fn get_bindings(&self, view: View) -> Vec<&Keybinding> {
        let mut bindings: Vec<&Keybinding> = Vec::new();
        if let Some(view_bindings) = self.view_bindings.get(&view) {
            bindings.extend(view_bindings.iter());
        }
        bindings.extend(self.global_bindings.iter());
        bindings
    }

    /// Resolve a key event in a view
    pub fn action_for(&self, view: View, event: &KeyEvent) -> Option<KeyAction> {
        self.get_bindings(view)
            .into_iter()
            .find(|b| b.matches(event))
            .map(|b| b.action)
    }

    /// Footer legend for a view.
    ///
    /// `pageable` drops the paging keys of a content view with a single record.
    pub fn get_nav_items(&self, view: View, pageable: bool) -> Vec<NavBarItem> {
        let mut priority = vec![KeyAction::PageUp, KeyAction::PageDown];
        priority.push(KeyAction::ScrollUp);
        match view {
            View::Menu => priority.push(KeyAction::Goto),
            View::Content => {
                if pageable {
                    priority.extend([KeyAction::Previous, KeyAction::Next, KeyAction::Goto]);
                }
                priority.push(KeyAction::ToggleHidden);
            }
        }
        priority.extend([KeyAction::Back, KeyAction::Command]);

        let bindings = self.get_bindings(view);
        priority
            .into_iter()
            .filter_map(|action| {
                // Up/Down share one footer item
                if action == KeyAction::ScrollUp {
                    return Some(NavBarItem {
                        key_display: "\u{2191}\u{2193}".to_string(),
                        action_label: "scroll".to_string(),
                    });
                }
                bindings.iter().find(|b| b.action == action).map(|b| NavBarItem {
                    key_display: b.display.clone(),
                    action_label: b.description.clone(),
                })
            })
            .collect()
    }

    /// Full help content for a view (for the `:help` overlay)
    pub fn get_help_content(&self, view: View) -> Vec<HelpSection> {
        let bindings = self.get_bindings(view);
        let section = |title: &str, pred: fn(KeyAction) -> bool| HelpSection {
            title: title.to_string(),
            items: bindings
                .iter()
                .filter(|b| pred(b.action))
                .map(|b| (b.display.clone(), b.description.clone()))
                .collect(),
        };

        let mut sections = vec![
            section("Navigation", |a| {
                matches!(
                    a,
                    KeyAction::ScrollUp
                        | KeyAction::ScrollDown
                        | KeyAction::PageUp
                        | KeyAction::PageDown
                        | KeyAction::Home
                        | KeyAction::End
                )
            }),
            section("Actions", |a| {
                matches!(
                    a,
                    KeyAction::Goto | KeyAction::Previous | KeyAction::Next | KeyAction::ToggleHidden
                )
            }),
            section("General", |a| {
                matches!(a, KeyAction::Back | KeyAction::Interrupt)
            }),
        ];
        sections.push(HelpSection {
            title: "Commands".to_string(),
            items: vec![
                (":<n>".to_string(), "select row or page n".to_string()),
                (":f <regex>".to_string(), "filter menu rows".to_string()),
                (":f".to_string(), "clear the filter".to_string()),
                (":q".to_string(), "quit".to_string()),
                (":help".to_string(), "this help".to_string()),
            ],
        });
        sections.retain(|s| !s.items.is_empty());
        sections
    }
}

/// Navigation bar item for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavBarItem {
    pub key_display: String,
    pub action_label: String,
}

/// Help section for the help overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpSection {
    pub title: String,
    pub items: Vec<(String, String)>,
}
