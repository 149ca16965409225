/// Transcript presentation. Both variants render the same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    Compact,
    #[default]
    Rich,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Compact => "compact",
            View::Rich => "rich",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "compact" => Some(View::Compact),
            "rich" => Some(View::Rich),
            _ => None,
        }
    }

    pub fn all() -> Vec<View> {
        vec![View::Compact, View::Rich]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            View::Compact => "Compact (labelled lines)",
            View::Rich => "Rich (chat bubbles)",
        }
    }
}
