/// Whether a send is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionState {
    #[default]
    Idle,
    Submitting,
}

impl CompositionState {
    pub fn is_submitting(self) -> bool {
        self == Self::Submitting
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Submitting => "SENDING",
        }
    }
}
