use std::str::FromStr;

use partledger_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of domain entity a log entry refers to.
///
/// Codes are the stable storage values of the type column and must never be
/// renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Entry refers to no entity at all.
    None,
    /// A user account.
    User,
    /// A user group.
    Group,
    /// A part.
    Part,
    /// A part category.
    Category,
    /// A storage location.
    StorageLocation,
    /// A footprint.
    Footprint,
    /// A manufacturer.
    Manufacturer,
    /// A supplier.
    Supplier,
    /// A project.
    Project,
    /// A stock lot of a part.
    PartLot,
    /// A currency.
    Currency,
    /// A measurement unit.
    MeasurementUnit,
    /// A parameter attached to an element.
    Parameter,
    /// A file attachment.
    Attachment,
}

impl TargetType {
    /// Returns the stable storage code for this type.
    #[must_use]
    pub fn code(&self) -> i16 {
        match self {
            Self::None => 0,
            Self::User => 1,
            Self::Group => 2,
            Self::Part => 3,
            Self::Category => 4,
            Self::StorageLocation => 5,
            Self::Footprint => 6,
            Self::Manufacturer => 7,
            Self::Supplier => 8,
            Self::Project => 9,
            Self::PartLot => 10,
            Self::Currency => 11,
            Self::MeasurementUnit => 12,
            Self::Parameter => 13,
            Self::Attachment => 14,
        }
    }

    /// Resolves a storage code, if it names a known type.
    #[must_use]
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::User),
            2 => Some(Self::Group),
            3 => Some(Self::Part),
            4 => Some(Self::Category),
            5 => Some(Self::StorageLocation),
            6 => Some(Self::Footprint),
            7 => Some(Self::Manufacturer),
            8 => Some(Self::Supplier),
            9 => Some(Self::Project),
            10 => Some(Self::PartLot),
            11 => Some(Self::Currency),
            12 => Some(Self::MeasurementUnit),
            13 => Some(Self::Parameter),
            14 => Some(Self::Attachment),
            _ => None,
        }
    }

    /// Returns a stable transport value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::User => "user",
            Self::Group => "group",
            Self::Part => "part",
            Self::Category => "category",
            Self::StorageLocation => "storage_location",
            Self::Footprint => "footprint",
            Self::Manufacturer => "manufacturer",
            Self::Supplier => "supplier",
            Self::Project => "project",
            Self::PartLot => "part_lot",
            Self::Currency => "currency",
            Self::MeasurementUnit => "measurement_unit",
            Self::Parameter => "parameter",
            Self::Attachment => "attachment",
        }
    }

    /// Returns all known types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TargetType] = &[
            TargetType::None,
            TargetType::User,
            TargetType::Group,
            TargetType::Part,
            TargetType::Category,
            TargetType::StorageLocation,
            TargetType::Footprint,
            TargetType::Manufacturer,
            TargetType::Supplier,
            TargetType::Project,
            TargetType::PartLot,
            TargetType::Currency,
            TargetType::MeasurementUnit,
            TargetType::Parameter,
            TargetType::Attachment,
        ];

        ALL
    }
}

impl FromStr for TargetType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            "part" => Ok(Self::Part),
            "category" => Ok(Self::Category),
            "storage_location" => Ok(Self::StorageLocation),
            "footprint" => Ok(Self::Footprint),
            "manufacturer" => Ok(Self::Manufacturer),
            "supplier" => Ok(Self::Supplier),
            "project" => Ok(Self::Project),
            "part_lot" => Ok(Self::PartLot),
            "currency" => Ok(Self::Currency),
            "measurement_unit" => Ok(Self::MeasurementUnit),
            "parameter" => Ok(Self::Parameter),
            "attachment" => Ok(Self::Attachment),
            _ => Err(AppError::Validation(format!(
                "unknown target type '{value}'"
            ))),
        }
    }
}

/// Reference to the domain entity a log entry is about.
///
/// The pair stays valid even after the referenced row is deleted, which is
/// the whole point of an audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    /// Kind of the referenced entity.
    pub target_type: TargetType,
    /// Identifier of the referenced entity.
    pub target_id: Uuid,
}

impl TargetRef {
    /// Reference used by entries that are about no entity.
    pub const NONE: Self = Self {
        target_type: TargetType::None,
        target_id: Uuid::nil(),
    };

    /// Creates a reference to a concrete entity.
    #[must_use]
    pub fn new(target_type: TargetType, target_id: Uuid) -> Self {
        Self {
            target_type,
            target_id,
        }
    }

    /// Whether this reference points at no entity.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.target_type == TargetType::None
    }
}
