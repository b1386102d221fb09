//! IO line model: which channel numbers exist, what they're capable of,
//! and which AT mnemonic configures (and, per the resolved "set_dio reuses
//! the configure mnemonic" design question, sets the value of) each one.

use xbee_proto::at::AtMnemonic;

/// A single addressable IO line.
///
/// `configure_mnemonic()` is the single source of truth for both
/// configuring a line's function (input/output/PWM/analog/disabled) and
/// writing its output value — the module reuses the same two-character
/// command for both. This duplication is deliberate: introducing a
/// separate "set value" mnemonic would not match how the firmware actually
/// behaves.
///
/// PWM duty cycle is the one value this line's `configure_mnemonic()` does
/// *not* carry: it has its own dedicated mnemonic (`pwm_mnemonic()`, `M0`/
/// `M1`), set only on the two lines wired to an actual PWM output (`P0`,
/// `P1`) — unlike the digital-output reuse above, PWM has its own AT
/// command on real hardware and isn't multiplexed onto the configure
/// mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoLine {
    channel: u8,
    mnemonic: AtMnemonic,
    pwm_mnemonic: Option<AtMnemonic>,
    analog_capable: bool,
}

const LINES: [IoLine; 11] = [
    IoLine { channel: 0, mnemonic: *b"D0", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 1, mnemonic: *b"D1", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 2, mnemonic: *b"D2", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 3, mnemonic: *b"D3", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 4, mnemonic: *b"D4", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 5, mnemonic: *b"D5", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 6, mnemonic: *b"D6", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 7, mnemonic: *b"D7", pwm_mnemonic: None, analog_capable: true },
    IoLine { channel: 10, mnemonic: *b"P0", pwm_mnemonic: Some(*b"M0"), analog_capable: false },
    IoLine { channel: 11, mnemonic: *b"P1", pwm_mnemonic: Some(*b"M1"), analog_capable: false },
    IoLine { channel: 12, mnemonic: *b"P2", pwm_mnemonic: None, analog_capable: false },
];

impl IoLine {
    /// Looks up the line for a given channel number (0..=12, with 8 and 9
    /// unassigned on this product line).
    #[must_use]
    pub fn from_channel(channel: u8) -> Option<Self> {
        LINES.iter().copied().find(|line| line.channel == channel)
    }

    /// This line's channel number.
    #[must_use]
    pub fn channel(self) -> u8 {
        self.channel
    }

    /// The AT mnemonic used both to configure this line's function and to
    /// set its output value.
    #[must_use]
    pub fn configure_mnemonic(self) -> AtMnemonic {
        self.mnemonic
    }

    /// The dedicated PWM duty-cycle mnemonic (`M0`/`M1`), if this line
    /// drives a PWM output.
    #[must_use]
    pub fn pwm_mnemonic(self) -> Option<AtMnemonic> {
        self.pwm_mnemonic
    }

    /// Whether this line supports PWM output.
    #[must_use]
    pub fn is_pwm_capable(self) -> bool {
        self.pwm_mnemonic.is_some()
    }

    /// Whether this line supports analog (ADC) input.
    #[must_use]
    pub fn is_analog_capable(self) -> bool {
        self.analog_capable
    }

    /// All lines this product line exposes, in ascending channel order.
    #[must_use]
    pub fn all() -> &'static [IoLine] {
        &LINES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_channels_resolve_to_expected_mnemonics() {
        assert_eq!(IoLine::from_channel(0).unwrap().configure_mnemonic(), *b"D0");
        assert_eq!(IoLine::from_channel(10).unwrap().configure_mnemonic(), *b"P0");
    }

    #[test]
    fn unassigned_channel_is_none() {
        assert!(IoLine::from_channel(8).is_none());
        assert!(IoLine::from_channel(9).is_none());
        assert!(IoLine::from_channel(200).is_none());
    }

    #[test]
    fn pwm_capability_matches_p0_p1_but_not_p2() {
        assert!(IoLine::from_channel(10).unwrap().is_pwm_capable());
        assert!(IoLine::from_channel(11).unwrap().is_pwm_capable());
        assert!(!IoLine::from_channel(12).unwrap().is_pwm_capable());
        assert!(!IoLine::from_channel(1).unwrap().is_pwm_capable());
    }

    #[test]
    fn pwm_mnemonic_is_dedicated_and_distinct_from_configure_mnemonic() {
        let p0 = IoLine::from_channel(10).unwrap();
        assert_eq!(p0.pwm_mnemonic(), Some(*b"M0"));
        assert_eq!(p0.configure_mnemonic(), *b"P0");
        let p1 = IoLine::from_channel(11).unwrap();
        assert_eq!(p1.pwm_mnemonic(), Some(*b"M1"));
        assert_eq!(IoLine::from_channel(0).unwrap().pwm_mnemonic(), None);
    }

    #[test]
    fn analog_capability_is_d_lines_only() {
        assert!(IoLine::from_channel(0).unwrap().is_analog_capable());
        assert!(!IoLine::from_channel(10).unwrap().is_analog_capable());
    }

    #[test]
    fn all_lines_are_sorted_by_channel() {
        let channels: Vec<u8> = IoLine::all().iter().map(|line| line.channel()).collect();
        let mut sorted = channels.clone();
        sorted.sort_unstable();
        assert_eq!(channels, sorted);
    }
}
