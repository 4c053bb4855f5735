//! Cell templates and the cell model handed to the presentation surface.
//!
//! The set of templates is closed: a member resolves to exactly one
//! [`CellTemplate`] variant, and the variant carries only what that kind of cell
//! needs. Surfaces reuse platform cells by [`CellTemplate::id`].

use std::fmt;

/// Keyboard shown by an entry cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyboardType {
    /// Default keyboard.
    #[default]
    Default,
    /// Email address keyboard.
    Email,
    /// Numeric keypad.
    Number,
    /// Phone pad.
    Phone,
    /// URL keyboard.
    Url,
}

/// Automatic capitalization of entered text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Capitalization {
    /// Leave text as typed.
    #[default]
    None,
    /// Capitalize words.
    Words,
    /// Capitalize sentences.
    Sentences,
    /// Upper-case everything. Applied again when the edit is committed.
    AllCharacters,
}

/// How an entry cell shows its caption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Caption on the left, field on the right.
    #[default]
    WithCaption,
    /// Field only.
    NoCaption,
    /// Value shown as text, not editable.
    ReadOnly,
}

/// Text entry hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Placeholder shown while empty.
    pub placeholder: Option<String>,
    /// Keyboard type.
    pub keyboard: KeyboardType,
    /// Caption mode.
    pub edit_mode: EditMode,
    /// Capitalization.
    pub capitalization: Capitalization,
    /// Obscure the text.
    pub is_password: bool,
    /// Clear the field when editing starts.
    pub clear_on_edit: bool,
}

impl EntryOptions {
    /// Default entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry with a placeholder.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Password entry.
    pub fn password(mut self) -> Self {
        self.is_password = true;
        self
    }

    /// Set the keyboard.
    pub fn keyboard(mut self, keyboard: KeyboardType) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Set the capitalization.
    pub fn capitalization(mut self, capitalization: Capitalization) -> Self {
        self.capitalization = capitalization;
        self
    }

    /// Set the caption mode.
    pub fn edit_mode(mut self, mode: EditMode) -> Self {
        self.edit_mode = mode;
        self
    }

    /// Clear the field when editing starts.
    pub fn clear_on_edit(mut self) -> Self {
        self.clear_on_edit = true;
        self
    }

    /// Text to store when an edit ends.
    pub fn commit_text(&self, text: &str) -> String {
        match self.capitalization {
            Capitalization::AllCharacters => text.to_uppercase(),
            _ => text.to_string(),
        }
    }
}

/// Captions of a load-more row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMoreOptions {
    /// Caption while idle.
    pub normal_caption: String,
    /// Caption while the command runs.
    pub loading_caption: String,
}

impl Default for LoadMoreOptions {
    fn default() -> Self {
        Self {
            normal_caption: "Load More".to_string(),
            loading_caption: "Loading...".to_string(),
        }
    }
}

impl LoadMoreOptions {
    /// Custom captions.
    pub fn new(normal: impl Into<String>, loading: impl Into<String>) -> Self {
        Self {
            normal_caption: normal.into(),
            loading_caption: loading.into(),
        }
    }
}

/// A cell template.
#[derive(Debug, Clone, PartialEq)]
pub enum CellTemplate {
    /// Caption with the value as detail text.
    Caption,
    /// Editable text field.
    Entry(EntryOptions),
    /// Boolean switch.
    Toggle,
    /// Tappable command row.
    Button,
    /// Summary row leading to another screen.
    Disclosure,
    /// Row that runs a command in the background.
    LoadMore(LoadMoreOptions),
    /// Application-defined template, identified by name.
    Custom(&'static str),
}

impl CellTemplate {
    /// Reuse identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Caption => "caption",
            Self::Entry(_) => "entry",
            Self::Toggle => "toggle",
            Self::Button => "button",
            Self::Disclosure => "disclosure",
            Self::LoadMore(_) => "load-more",
            Self::Custom(id) => id,
        }
    }
}

impl fmt::Display for CellTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Stable key for reusing a cell: the same logical row keeps the same key
/// across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    /// Template reuse id.
    pub template: &'static str,
    /// Section index.
    pub section: usize,
    /// Row index.
    pub row: usize,
}

/// Trailing accessory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accessory {
    /// No accessory.
    #[default]
    None,
    /// Disclosure chevron.
    Disclosure,
    /// Selection checkmark.
    Checkmark,
}

/// Highlight when tapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStyle {
    /// No highlight.
    #[default]
    None,
    /// Standard highlight.
    Highlight,
}

/// Everything a surface needs to paint one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Reuse key.
    pub key: CellKey,
    /// Template.
    pub template: CellTemplate,
    /// Main text.
    pub text: String,
    /// Secondary text.
    pub detail: Option<String>,
    /// Trailing accessory.
    pub accessory: Accessory,
    /// Tap highlight.
    pub selection_style: SelectionStyle,
    /// Accepts edits.
    pub editable: bool,
    /// A background command is running.
    pub busy: bool,
    /// Command can execute.
    pub enabled: bool,
    /// Command row is shown.
    pub visible: bool,
}

impl Cell {
    /// A cell with `text` and defaults for everything else.
    pub fn new(key: CellKey, template: CellTemplate, text: impl Into<String>) -> Self {
        Self {
            key,
            template,
            text: text.into(),
            detail: None,
            accessory: Accessory::None,
            selection_style: SelectionStyle::None,
            editable: false,
            busy: false,
            enabled: true,
            visible: true,
        }
    }
}
