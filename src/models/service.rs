use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    StandardCleaning,
    DeepCleaning,
    MoveInOut,
    PostRenovation,
    OfficeCleaning,
    WindowCleaning,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        ServiceType::StandardCleaning,
        ServiceType::DeepCleaning,
        ServiceType::MoveInOut,
        ServiceType::PostRenovation,
        ServiceType::OfficeCleaning,
        ServiceType::WindowCleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::StandardCleaning => "standard_cleaning",
            ServiceType::DeepCleaning => "deep_cleaning",
            ServiceType::MoveInOut => "move_in_out",
            ServiceType::PostRenovation => "post_renovation",
            ServiceType::OfficeCleaning => "office_cleaning",
            ServiceType::WindowCleaning => "window_cleaning",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAddOn {
    InsideOven,
    InsideFridge,
    InsideCabinets,
    InteriorWindows,
    Balcony,
    Ironing,
    CarpetCleaning,
}

impl ServiceAddOn {
    pub const ALL: [ServiceAddOn; 7] = [
        ServiceAddOn::InsideOven,
        ServiceAddOn::InsideFridge,
        ServiceAddOn::InsideCabinets,
        ServiceAddOn::InteriorWindows,
        ServiceAddOn::Balcony,
        ServiceAddOn::Ironing,
        ServiceAddOn::CarpetCleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAddOn::InsideOven => "inside_oven",
            ServiceAddOn::InsideFridge => "inside_fridge",
            ServiceAddOn::InsideCabinets => "inside_cabinets",
            ServiceAddOn::InteriorWindows => "interior_windows",
            ServiceAddOn::Balcony => "balcony",
            ServiceAddOn::Ironing => "ironing",
            ServiceAddOn::CarpetCleaning => "carpet_cleaning",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    OneTime,
    Weekly,
    BiWeekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneTime => "one_time",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi_weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_time" => Some(Frequency::OneTime),
            "weekly" => Some(Frequency::Weekly),
            "bi_weekly" => Some(Frequency::BiWeekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub service_type: ServiceType,
    pub name: String,
    pub description: Option<String>,
    pub base_hours: f64,
    pub price_multiplier: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAddOnDefinition {
    pub add_on: ServiceAddOn,
    pub name: String,
    pub fixed_price: i64,
    pub estimated_hours: f64,
    pub is_active: bool,
}
