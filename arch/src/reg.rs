use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// General purpose registers of the VD-8. The discriminant is the
/// operand byte encoding.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
    Eq,
)]
#[repr(u8)]
#[strum(ascii_case_insensitive)]
pub enum Reg {
    #[default]
    AL,
    BL,
    CL,
    DL,
}

impl Reg {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Unknown reg name: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(Reg::parse("al"), Ok(Reg::AL));
        assert_eq!(Reg::parse("DL"), Ok(Reg::DL));
        assert!(Reg::parse("hoge").is_err());
    }

    #[test]
    fn encode() {
        assert_eq!(u8::from(Reg::AL), 0);
        assert_eq!(u8::from(Reg::DL), 3);
        assert_eq!(Reg::from(2u8), Reg::CL);
    }
}
