//! # Rotation
//!
//! We differentiate between the relative rotation a caller asks for and the
//! absolute transform a monitor carries, so that there is type-based safety
//! that it's harder to misuse.
//!
//! Monitor transforms follow `wl_output`: the rotation step counts
//! counter-clockwise quarter turns, and values 4-7 are the same rotations
//! with a horizontal flip applied first.

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub const CLOCKWISE: Rotation = Rotation::Clockwise90;
    pub const COUNTER_CLOCKWISE: Rotation = Rotation::Clockwise270;

    /// Convert to clockwise degrees.
    pub fn to_degrees(&self) -> isize {
        match *self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Clockwise180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Attempt conversion from degrees to rotation.
    /// Positive value is clockwise, negative is counter clockwise.
    pub fn from_degrees(cw_degrees: isize) -> Result<Self> {
        match cw_degrees % 360 {
            0 => Ok(Self::None),
            90 | -270 => Ok(Self::Clockwise90),
            180 | -180 => Ok(Self::Clockwise180),
            270 | -90 => Ok(Self::Clockwise270),
            other => Err(Error::InvalidDegrees(other)),
        }
    }

    /// Counter-clockwise quarter turns, the unit monitor transforms count in.
    fn ccw_steps(&self) -> u8 {
        match *self {
            Self::None => 0,
            Self::Clockwise90 => 3,
            Self::Clockwise180 => 2,
            Self::Clockwise270 => 1,
        }
    }
}

/// Either a direction name or clockwise degrees, as given on the command line.
impl std::str::FromStr for Rotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clockwise" | "cw" => Ok(Self::CLOCKWISE),
            "counter-clockwise" | "ccw" => Ok(Self::COUNTER_CLOCKWISE),
            "half" => Ok(Self::Clockwise180),
            "none" => Ok(Self::None),
            other => match other.parse::<isize>() {
                Ok(degrees) => Self::from_degrees(degrees),
                Err(_) => Err(Error::UnknownRotation(other.to_string())),
            },
        }
    }
}

/// Transform of a logical monitor: a rotation step plus a flip bit.
///
/// Only the service boundary sees the packed 0-7 integer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Transform {
    /// Counter-clockwise quarter turns, 0-3.
    step: u8,
    flipped: bool,
}

impl Transform {
    pub const NORMAL: Transform = Transform {
        step: 0,
        flipped: false,
    };

    pub fn new(step: u8, flipped: bool) -> Self {
        Transform {
            step: step % 4,
            flipped,
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Whether the monitor is turned sideways, swapping its width and height.
    pub fn is_quarter_turn(&self) -> bool {
        self.step % 2 == 1
    }

    pub fn to_wire(&self) -> u32 {
        u32::from(self.step) + if self.flipped { 4 } else { 0 }
    }
}

impl TryFrom<u32> for Transform {
    type Error = Error;

    fn try_from(wire: u32) -> Result<Self> {
        match wire {
            0..=3 => Ok(Transform::new(wire as u8, false)),
            4..=7 => Ok(Transform::new((wire - 4) as u8, true)),
            other => Err(Error::InvalidTransform(other)),
        }
    }
}

impl std::ops::Add<Rotation> for Transform {
    type Output = Transform;

    fn add(self, rhs: Rotation) -> Self::Output {
        Transform::new(self.step + rhs.ccw_steps(), self.flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_to_degrees() -> Result<()> {
        assert_eq!(Rotation::None.to_degrees(), 0);
        assert_eq!(Rotation::Clockwise90.to_degrees(), 90);
        assert_eq!(Rotation::Clockwise180.to_degrees(), 180);
        assert_eq!(Rotation::Clockwise270.to_degrees(), 270);
        Ok(())
    }

    #[test]
    fn degrees_to_rotation() -> Result<()> {
        assert_eq!(Rotation::from_degrees(0)?, Rotation::None);
        assert_eq!(Rotation::from_degrees(90)?, Rotation::Clockwise90);
        assert_eq!(Rotation::from_degrees(-90)?, Rotation::Clockwise270);
        assert_eq!(Rotation::from_degrees(-180)?, Rotation::Clockwise180);
        assert_eq!(Rotation::from_degrees(810)?, Rotation::Clockwise90);

        assert!(Rotation::from_degrees(42).is_err());

        Ok(())
    }

    #[test]
    fn parse_rotation() -> Result<()> {
        assert_eq!("clockwise".parse::<Rotation>()?, Rotation::CLOCKWISE);
        assert_eq!("ccw".parse::<Rotation>()?, Rotation::COUNTER_CLOCKWISE);
        assert_eq!("half".parse::<Rotation>()?, Rotation::Clockwise180);
        assert_eq!("-90".parse::<Rotation>()?, Rotation::Clockwise270);
        assert_eq!("450".parse::<Rotation>()?, Rotation::Clockwise90);

        assert!(matches!(
            "45".parse::<Rotation>(),
            Err(Error::InvalidDegrees(45))
        ));
        assert!(matches!(
            "sideways".parse::<Rotation>(),
            Err(Error::UnknownRotation(_))
        ));
        Ok(())
    }

    #[test]
    fn transform_wire_encoding() -> Result<()> {
        for wire in 0..8 {
            assert_eq!(Transform::try_from(wire)?.to_wire(), wire);
        }
        assert!(Transform::try_from(4)?.is_flipped());
        assert!(!Transform::try_from(3)?.is_flipped());
        assert!(matches!(
            Transform::try_from(8),
            Err(Error::InvalidTransform(8))
        ));
        Ok(())
    }

    #[test]
    fn clockwise_steps_backwards() {
        assert_eq!((Transform::NORMAL + Rotation::CLOCKWISE).to_wire(), 3);
        assert_eq!((Transform::NORMAL + Rotation::COUNTER_CLOCKWISE).to_wire(), 1);
        assert_eq!((Transform::NORMAL + Rotation::Clockwise180).to_wire(), 2);
    }

    #[test]
    fn flip_survives_rotation() -> Result<()> {
        let mut transform = Transform::try_from(5)?;
        for _ in 0..7 {
            transform = transform + Rotation::CLOCKWISE;
            assert!(transform.is_flipped());
        }
        assert_eq!(transform.to_wire(), 6);
        Ok(())
    }
}
