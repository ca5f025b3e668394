use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde wire form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(TherapyForm {
    Cream => "crema",
    Drops => "gocce",
    Tablet => "pastiglia",
    Sachet => "bustine",
    Suppository => "supposta",
    Supplement => "integratore",
    Pessary => "ovulo",
    Other => "altro",
});

str_enum!(PosologyPeriod {
    Day => "day",
    Month => "month",
    Year => "year",
});

str_enum!(DurationType {
    Days => "days",
    Months => "months",
    DaysPerMonth => "days_per_month",
});

str_enum!(AlternateFrequency {
    DayByDay => "1_day_1_day",
    WeekByWeek => "1_week_1_week",
    MonthsByMonths => "x_months_x_months",
});

str_enum!(TimeOfDay {
    Day => "day",
    Night => "night",
});

str_enum!(FlowIntensity {
    Light => "light",
    Medium => "medium",
    Heavy => "heavy",
});

str_enum!(SwabTestResult {
    Positive => "positivo",
    Negative => "negativo",
    NotDone => "non_eseguito",
});

str_enum!(SpecialistType {
    Gynecologist => "ginecologo",
    Nutritionist => "nutrizionista",
    Physiotherapist => "fisioterapista",
    Other => "altro",
});

/// Appointment kinds share the specialist vocabulary.
pub type AppointmentType = SpecialistType;

str_enum!(MedicationType {
    Topical => "topical",
    Oral => "oral",
    Suppository => "suppository",
    Other => "other",
});

str_enum!(DiaryType {
    Voiding => "minzionale",
    Personal => "personale",
});

str_enum!(FluidIntakeType {
    Water => "acqua",
    Coffee => "caffe",
    Tea => "te",
    Juice => "succo",
    Other => "altro",
});

str_enum!(TherapyAction {
    Added => "Aggiunto",
    Modified => "Modificato",
    Paused => "In pausa",
    Resumed => "Ripreso",
    Removed => "Rimosso",
});

impl Default for SwabTestResult {
    fn default() -> Self {
        Self::NotDone
    }
}

impl Default for SpecialistType {
    fn default() -> Self {
        Self::Other
    }
}

impl Default for MedicationType {
    fn default() -> Self {
        Self::Other
    }
}

impl Default for FluidIntakeType {
    fn default() -> Self {
        Self::Water
    }
}

impl Default for DurationType {
    fn default() -> Self {
        Self::Months
    }
}

impl TherapyForm {
    /// Italian label shown on cards.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cream => "Crema",
            Self::Drops => "Gocce",
            Self::Tablet => "Pastiglia",
            Self::Sachet => "Bustine",
            Self::Suppository => "Supposta",
            Self::Supplement => "Integratore",
            Self::Pessary => "Ovulo",
            Self::Other => "Altro",
        }
    }
}

impl PosologyPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "Giorno",
            Self::Month => "Mese",
            Self::Year => "Anno",
        }
    }
}

impl FlowIntensity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "Leggero",
            Self::Medium => "Medio",
            Self::Heavy => "Intenso",
        }
    }
}

impl SpecialistType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gynecologist => "Ginecologo",
            Self::Nutritionist => "Nutrizionista",
            Self::Physiotherapist => "Fisioterapista",
            Self::Other => "Altro",
        }
    }
}

impl DiaryType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Voiding => "Minzionale",
            Self::Personal => "Personale",
        }
    }
}
