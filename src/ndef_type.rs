/// Type name format (TNF) of an NDEF record, the low 3 bits of the flag byte
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum NdefType {
    Empty,
    WellKnown,
    Mime,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
    Reserved,
}

impl NdefType {
    pub fn code(&self) -> u8 {
        match self {
            NdefType::Empty => 0,
            NdefType::WellKnown => 1,
            NdefType::Mime => 2,
            NdefType::AbsoluteUri => 3,
            NdefType::External => 4,
            NdefType::Unknown => 5,
            NdefType::Unchanged => 6,
            NdefType::Reserved => 7,
        }
    }

    /// Only the low 3 bits are considered
    pub fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => NdefType::Empty,
            1 => NdefType::WellKnown,
            2 => NdefType::Mime,
            3 => NdefType::AbsoluteUri,
            4 => NdefType::External,
            5 => NdefType::Unknown,
            6 => NdefType::Unchanged,
            _ => NdefType::Reserved,
        }
    }
}
