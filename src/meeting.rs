/// Meeting-state code that switches the LEDs on.
pub const MEETING_ON: u8 = b'm';
/// Meeting-state code reported while the LEDs are off.
pub const MEETING_OFF: u8 = b'x';
/// Length of a meeting-state command.
pub const MEETING_WRITE_LEN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedState {
    On,
    #[default]
    Off,
}

impl LedState {
    /// Decodes a meeting-state write into the command it carries, if any.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        match MeetingWrite::from_payload(payload) {
            MeetingWrite::Apply(state) => Some(state),
            MeetingWrite::Ignored | MeetingWrite::Rejected => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            LedState::On => MEETING_ON,
            LedState::Off => MEETING_OFF,
        }
    }

    pub fn is_on(self) -> bool {
        self == LedState::On
    }
}

/// How a write to the meeting characteristic is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingWrite {
    /// Empty payload: acknowledged, no command.
    Ignored,
    /// Single byte: `m` switches on, anything else off.
    Apply(LedState),
    /// Longer than one byte: refused with an ATT error, no command.
    Rejected,
}

impl MeetingWrite {
    pub fn from_payload(payload: &[u8]) -> Self {
        match payload {
            [] => MeetingWrite::Ignored,
            [MEETING_ON] => MeetingWrite::Apply(LedState::On),
            [_] => MeetingWrite::Apply(LedState::Off),
            _ => MeetingWrite::Rejected,
        }
    }

    pub fn is_rejected(self) -> bool {
        self == MeetingWrite::Rejected
    }

    /// The state the characteristic value must hold after this write,
    /// given the state in force before it.
    pub fn stored_state(self, current: LedState) -> LedState {
        match self {
            MeetingWrite::Apply(state) => state,
            MeetingWrite::Ignored | MeetingWrite::Rejected => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_code_decodes_to_on() {
        assert_eq!(LedState::decode(b"m"), Some(LedState::On));
    }

    #[test]
    fn other_codes_decode_to_off() {
        assert_eq!(LedState::decode(b"x"), Some(LedState::Off));
        assert_eq!(LedState::decode(b"M"), Some(LedState::Off));
        assert_eq!(LedState::decode(&[0x00]), Some(LedState::Off));
    }

    #[test]
    fn multi_byte_writes_are_rejected() {
        assert_eq!(MeetingWrite::from_payload(b"mx"), MeetingWrite::Rejected);
        assert_eq!(MeetingWrite::from_payload(b"xm"), MeetingWrite::Rejected);
        assert!(MeetingWrite::from_payload(b"mm").is_rejected());
        assert_eq!(LedState::decode(b"mx"), None);
    }

    #[test]
    fn empty_write_is_ignored() {
        assert_eq!(MeetingWrite::from_payload(&[]), MeetingWrite::Ignored);
        assert_eq!(LedState::decode(&[]), None);
    }

    #[test]
    fn stored_value_never_loses_the_current_state() {
        for current in [LedState::On, LedState::Off] {
            assert_eq!(MeetingWrite::Ignored.stored_state(current), current);
            assert_eq!(MeetingWrite::Rejected.stored_state(current), current);
            assert_eq!(
                MeetingWrite::from_payload(b"m").stored_state(current),
                LedState::On
            );
            assert_eq!(
                MeetingWrite::from_payload(b"?").stored_state(current),
                LedState::Off
            );
        }
    }

    #[test]
    fn status_codes_mirror_state() {
        assert_eq!(LedState::On.code(), b'm');
        assert_eq!(LedState::Off.code(), b'x');
        assert_eq!(LedState::decode(&[LedState::On.code()]), Some(LedState::On));
        assert_eq!([LedState::Off.code()].len(), MEETING_WRITE_LEN);
    }
}
