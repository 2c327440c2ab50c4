use super::*;

/// Language of the built-in confirmation prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

impl Locale {
    pub fn default_confirm_message(self) -> &'static str {
        match self {
            Self::PtBr => "Tem certeza que deseja continuar?",
            Self::En => "Are you sure you want to continue?",
        }
    }
}

/// Confirmation prompt with a localized fallback message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmPrompt {
    locale: Locale,
}

impl ConfirmPrompt {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Message shown for `message`: the given text, or the locale's default
    /// when it is missing or empty.
    pub fn message<'a>(&self, message: Option<&'a str>) -> &'a str {
        match message {
            Some(message) if !message.is_empty() => message,
            _ => self.locale.default_confirm_message(),
        }
    }

    /// Blocks on the host's confirmation dialog. Cancel and dismiss both
    /// yield `false`.
    pub fn ask(&self, dialogs: &mut dyn Dialogs, message: Option<&str>) -> bool {
        dialogs.confirm(self.message(message))
    }
}

/// Asks the user to confirm an action, with the default pt-BR prompt when
/// `message` is missing or empty.
pub fn confirm_action(dialogs: &mut dyn Dialogs, message: Option<&str>) -> bool {
    ConfirmPrompt::default().ask(dialogs, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedDialogs {
        answer: bool,
        seen: Vec<String>,
    }

    impl Dialogs for ScriptedDialogs {
        fn confirm(&mut self, message: &str) -> bool {
            self.seen.push(message.to_string());
            self.answer
        }
    }

    #[test]
    fn empty_message_falls_back_to_locale_default() {
        let prompt = ConfirmPrompt::new(Locale::En);
        assert_eq!(prompt.message(None), "Are you sure you want to continue?");
        assert_eq!(prompt.message(Some("")), "Are you sure you want to continue?");
        assert_eq!(prompt.message(Some("Delete?")), "Delete?");
        assert_eq!(ConfirmPrompt::default().locale(), Locale::PtBr);
    }

    #[test]
    fn answer_is_returned_unchanged() {
        for answer in [true, false] {
            let mut dialogs = ScriptedDialogs {
                answer,
                seen: Vec::new(),
            };
            assert_eq!(confirm_action(&mut dialogs, Some("Remove item?")), answer);
            assert_eq!(dialogs.seen, vec!["Remove item?".to_string()]);
        }
    }
}
