//! What the counter panel shows.

use std::fmt;

/// A user-triggerable action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Connect a wallet.
    Connect,
    /// Create the counter account.
    Create,
    /// Increment the counter.
    Increment,
    /// Decrement the counter.
    Decrement,
}

impl Action {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connect => "Connect wallet",
            Self::Create => "Create counter",
            Self::Increment => "Increment counter",
            Self::Decrement => "Decrement counter",
        }
    }
}

/// The panel's view, derived from wallet connection and the display value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    /// No connected wallet.
    Disconnected,
    /// Connected, no counter value fetched yet.
    NoAccount,
    /// Connected with a fetched counter value.
    HasAccount(u64),
}

impl ViewState {
    /// Derives the view.
    #[must_use]
    pub const fn new(connected: bool, value: Option<u64>) -> Self {
        match (connected, value) {
            (false, _) => Self::Disconnected,
            (true, None) => Self::NoAccount,
            (true, Some(value)) => Self::HasAccount(value),
        }
    }

    /// Actions available in this view.
    #[must_use]
    pub const fn actions(&self) -> &'static [Action] {
        match self {
            Self::Disconnected => &[Action::Connect],
            Self::NoAccount => &[Action::Create],
            Self::HasAccount(_) => &[Action::Increment, Action::Decrement],
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Disconnected = self {
            writeln!(f, "Click button to connect wallet")?;
        }
        for action in self.actions() {
            writeln!(f, "[ {} ]", action.label())?;
        }
        if let Self::HasAccount(value) = self {
            writeln!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(false, None, ViewState::Disconnected)]
    #[case(false, Some(3), ViewState::Disconnected)]
    #[case(true, None, ViewState::NoAccount)]
    #[case(true, Some(0), ViewState::HasAccount(0))]
    fn test_view_derivation(
        #[case] connected: bool,
        #[case] value: Option<u64>,
        #[case] expected: ViewState,
    ) {
        assert_eq!(ViewState::new(connected, value), expected);
    }

    #[test]
    fn test_disconnected_offers_only_connect() {
        assert_eq!(ViewState::Disconnected.actions(), &[Action::Connect]);
        assert_eq!(
            ViewState::Disconnected.to_string(),
            "Click button to connect wallet\n[ Connect wallet ]\n"
        );
    }

    #[test]
    fn test_render_with_value() {
        assert_eq!(
            ViewState::HasAccount(0).to_string(),
            "[ Increment counter ]\n[ Decrement counter ]\n0\n"
        );
        assert_eq!(ViewState::NoAccount.to_string(), "[ Create counter ]\n");
    }
}
