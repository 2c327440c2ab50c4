//! Small page enhancement helpers that run against an injected page tree.
//!
//! The four utilities are independent:
//!
//! - [`AlertDismiss`] fades and removes flash alerts after page load.
//! - [`validate_form`] flags empty required fields of a form.
//! - [`format_number`] renders a number with a fixed count of decimals.
//! - [`confirm_action`] asks the user to confirm a destructive action.
//!
//! They only talk to the page through the capability traits in this crate
//! ([`Document`], [`Timers`], [`Dialogs`], [`Host`]). [`Page`] is a
//! deterministic in-memory host that implements all of them.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    Runtime(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

mod alerts;
mod dialog;
mod dom;
mod forms;
mod host;
mod html;
mod number;
mod page;
mod selector;

pub use alerts::{
    AlertDismiss, DEFAULT_ALERT_SELECTOR, DEFAULT_FADE_DELAY_MS, DEFAULT_REMOVAL_DELAY_MS,
};
pub use dialog::{ConfirmPrompt, Locale, confirm_action};
pub use dom::NodeId;
pub use forms::{INVALID_BORDER_COLOR, REQUIRED_FIELD_SELECTOR, validate_form};
pub use host::{Dialogs, Document, Host, ReadyCallback, TimerTask, Timers};
pub use number::{
    DEFAULT_DECIMALS, FormatOptions, MAX_FRACTION_DIGITS, NumberInput, format_number,
    format_number_with, parse_float, to_fixed,
};
pub use page::{Page, PendingTimer};
pub use selector::Selector;

use dom::Dom;
use html::parse_html;

/// ECMAScript WhiteSpace or LineTerminator: Unicode White_Space without
/// NEL (U+0085), plus the byte order mark.
pub(crate) fn is_js_whitespace(ch: char) -> bool {
    (ch.is_whitespace() && ch != '\u{85}') || ch == '\u{FEFF}'
}
