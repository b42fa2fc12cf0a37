/// Geographic regions a disc can be locked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Japan
    Japan,
    /// USA / North America
    Usa,
    /// Europe (PAL regions)
    Europe,
    /// Korea
    Korea,
    /// China
    China,
    /// Taiwan / Hong Kong
    Taiwan,
    /// World / Region-free
    World,
    /// Unknown region
    Unknown,
}

impl Region {
    /// Returns the standard abbreviation for this region.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Japan => "JPN",
            Self::Usa => "USA",
            Self::Europe => "EUR",
            Self::Korea => "KOR",
            Self::China => "CHN",
            Self::Taiwan => "TWN",
            Self::World => "ALL",
            Self::Unknown => "UNK",
        }
    }

    /// Returns the full name of this region.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Japan => "Japan",
            Self::Usa => "USA",
            Self::Europe => "Europe",
            Self::Korea => "Korea",
            Self::China => "China",
            Self::Taiwan => "Taiwan",
            Self::World => "World",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse the three-letter region field of a disc header.
    pub fn from_disc_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "JPN" => Self::Japan,
            "USA" => Self::Usa,
            "EUR" => Self::Europe,
            "KOR" => Self::Korea,
            "CHN" => Self::China,
            "TWN" => Self::Taiwan,
            "ALL" => Self::World,
            _ => Self::Unknown,
        }
    }

    /// Attempt to parse a region from the last character of a product code
    /// like `WUP-P-ARPE`.
    pub fn from_code_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'J' => Some(Self::Japan),
            'E' => Some(Self::Usa),
            'P' => Some(Self::Europe),
            'K' => Some(Self::Korea),
            'C' => Some(Self::China),
            'Z' => Some(Self::World),
            _ => None,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
