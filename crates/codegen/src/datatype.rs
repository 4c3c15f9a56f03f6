//! XML Schema builtin datatypes.

use crate::namespaces::{self, XML_SCHEMA};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Every builtin type of the `http://www.w3.org/2001/XMLSchema` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    AnyUri,
    AnySimpleType,
    AnyType,
    Base64Binary,
    Boolean,
    Byte,
    Date,
    DateTime,
    DateTimestamp,
    DayTimeDuration,
    Decimal,
    Double,
    Duration,
    Entities,
    Entity,
    Float,
    GDay,
    GMonth,
    GMonthDay,
    GYear,
    GYearMonth,
    HexBinary,
    Id,
    Idref,
    Idrefs,
    Int,
    Integer,
    Language,
    Long,
    Name,
    NcName,
    NegativeInteger,
    Nmtoken,
    Nmtokens,
    NonNegativeInteger,
    NonPositiveInteger,
    NormalizedString,
    Notation,
    PositiveInteger,
    QName,
    Short,
    String,
    Time,
    Token,
    UnsignedByte,
    UnsignedInt,
    UnsignedLong,
    UnsignedShort,
    YearMonthDuration,
}

/// The value representation a renderer would pick for a datatype.
///
/// Two choices whose types share a kind cannot be told apart by value at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Any,
    Bool,
    Bytes,
    Date,
    DateTime,
    Decimal,
    Duration,
    Float,
    Int,
    Period,
    QName,
    Str,
    Time,
}

const ALL: [DataType; 49] = [
    DataType::AnyUri,
    DataType::AnySimpleType,
    DataType::AnyType,
    DataType::Base64Binary,
    DataType::Boolean,
    DataType::Byte,
    DataType::Date,
    DataType::DateTime,
    DataType::DateTimestamp,
    DataType::DayTimeDuration,
    DataType::Decimal,
    DataType::Double,
    DataType::Duration,
    DataType::Entities,
    DataType::Entity,
    DataType::Float,
    DataType::GDay,
    DataType::GMonth,
    DataType::GMonthDay,
    DataType::GYear,
    DataType::GYearMonth,
    DataType::HexBinary,
    DataType::Id,
    DataType::Idref,
    DataType::Idrefs,
    DataType::Int,
    DataType::Integer,
    DataType::Language,
    DataType::Long,
    DataType::Name,
    DataType::NcName,
    DataType::NegativeInteger,
    DataType::Nmtoken,
    DataType::Nmtokens,
    DataType::NonNegativeInteger,
    DataType::NonPositiveInteger,
    DataType::NormalizedString,
    DataType::Notation,
    DataType::PositiveInteger,
    DataType::QName,
    DataType::Short,
    DataType::String,
    DataType::Time,
    DataType::Token,
    DataType::UnsignedByte,
    DataType::UnsignedInt,
    DataType::UnsignedLong,
    DataType::UnsignedShort,
    DataType::YearMonthDuration,
];

const TZ: &str = r"(Z|[+-]\d{2}:\d{2})?";

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| re(r"^[+-]?(\d+(\.\d*)?|\.\d+)$"));
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| re(r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|[+-]?INF|NaN)$"));
static INTEGER: LazyLock<Regex> = LazyLock::new(|| re(r"^[+-]?\d+$"));
static DATE: LazyLock<Regex> = LazyLock::new(|| re(&format!(r"^-?\d{{4,}}-\d{{2}}-\d{{2}}{TZ}$")));
static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    re(&format!(
        r"^-?\d{{4,}}-\d{{2}}-\d{{2}}T\d{{2}}:\d{{2}}:\d{{2}}(\.\d+)?{TZ}$"
    ))
});
static TIME: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"^\d{{2}}:\d{{2}}:\d{{2}}(\.\d+)?{TZ}$")));
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    re(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
});
static G_YEAR: LazyLock<Regex> = LazyLock::new(|| re(&format!(r"^-?\d{{4,}}{TZ}$")));
static G_YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"^-?\d{{4,}}-\d{{2}}{TZ}$")));
static G_MONTH: LazyLock<Regex> = LazyLock::new(|| re(&format!(r"^--\d{{2}}{TZ}$")));
static G_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| re(&format!(r"^--\d{{2}}-\d{{2}}{TZ}$")));
static G_DAY: LazyLock<Regex> = LazyLock::new(|| re(&format!(r"^---\d{{2}}{TZ}$")));
static HEX: LazyLock<Regex> = LazyLock::new(|| re(r"^([0-9a-fA-F]{2})*$"));
static BASE64: LazyLock<Regex> = LazyLock::new(|| re(r"^[A-Za-z0-9+/=\s]*$"));
static QNAME: LazyLock<Regex> =
    LazyLock::new(|| re(r"^([A-Za-z_][\w.\-]*:)?[A-Za-z_][\w.\-]*$"));

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("builtin lexical pattern compiles")
}

impl DataType {
    /// Local name in the XML Schema namespace.
    pub fn code(self) -> &'static str {
        match self {
            DataType::AnyUri => "anyURI",
            DataType::AnySimpleType => "anySimpleType",
            DataType::AnyType => "anyType",
            DataType::Base64Binary => "base64Binary",
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::Date => "date",
            DataType::DateTime => "dateTime",
            DataType::DateTimestamp => "dateTimeStamp",
            DataType::DayTimeDuration => "dayTimeDuration",
            DataType::Decimal => "decimal",
            DataType::Double => "double",
            DataType::Duration => "duration",
            DataType::Entities => "ENTITIES",
            DataType::Entity => "ENTITY",
            DataType::Float => "float",
            DataType::GDay => "gDay",
            DataType::GMonth => "gMonth",
            DataType::GMonthDay => "gMonthDay",
            DataType::GYear => "gYear",
            DataType::GYearMonth => "gYearMonth",
            DataType::HexBinary => "hexBinary",
            DataType::Id => "ID",
            DataType::Idref => "IDREF",
            DataType::Idrefs => "IDREFS",
            DataType::Int => "int",
            DataType::Integer => "integer",
            DataType::Language => "language",
            DataType::Long => "long",
            DataType::Name => "Name",
            DataType::NcName => "NCName",
            DataType::NegativeInteger => "negativeInteger",
            DataType::Nmtoken => "NMTOKEN",
            DataType::Nmtokens => "NMTOKENS",
            DataType::NonNegativeInteger => "nonNegativeInteger",
            DataType::NonPositiveInteger => "nonPositiveInteger",
            DataType::NormalizedString => "normalizedString",
            DataType::Notation => "NOTATION",
            DataType::PositiveInteger => "positiveInteger",
            DataType::QName => "QName",
            DataType::Short => "short",
            DataType::String => "string",
            DataType::Time => "time",
            DataType::Token => "token",
            DataType::UnsignedByte => "unsignedByte",
            DataType::UnsignedInt => "unsignedInt",
            DataType::UnsignedLong => "unsignedLong",
            DataType::UnsignedShort => "unsignedShort",
            DataType::YearMonthDuration => "yearMonthDuration",
        }
    }

    pub fn qname(self) -> String {
        namespaces::build_qname(Some(XML_SCHEMA), self.code())
    }

    pub fn from_code(code: &str) -> Option<Self> {
        ALL.iter().copied().find(|datatype| datatype.code() == code)
    }

    /// Resolve a Clark-notation qname in the XML Schema namespace.
    pub fn from_qname(qname: &str) -> Option<Self> {
        match namespaces::split_qname(qname) {
            (Some(XML_SCHEMA), local) => Self::from_code(local),
            _ => None,
        }
    }

    /// Whitespace separated list types.
    pub fn is_tokens(self) -> bool {
        matches!(self, DataType::Nmtokens | DataType::Idrefs | DataType::Entities)
    }

    pub fn format(self) -> Option<&'static str> {
        match self {
            DataType::Base64Binary => Some("base64"),
            DataType::HexBinary => Some("base16"),
            _ => None,
        }
    }

    pub fn kind(self) -> NativeKind {
        match self {
            DataType::AnyType | DataType::AnySimpleType => NativeKind::Any,
            DataType::Boolean => NativeKind::Bool,
            DataType::Base64Binary | DataType::HexBinary => NativeKind::Bytes,
            DataType::Date => NativeKind::Date,
            DataType::DateTime | DataType::DateTimestamp => NativeKind::DateTime,
            DataType::Time => NativeKind::Time,
            DataType::Decimal => NativeKind::Decimal,
            DataType::Duration | DataType::DayTimeDuration | DataType::YearMonthDuration => {
                NativeKind::Duration
            }
            DataType::Float | DataType::Double => NativeKind::Float,
            DataType::GDay
            | DataType::GMonth
            | DataType::GMonthDay
            | DataType::GYear
            | DataType::GYearMonth => NativeKind::Period,
            DataType::QName | DataType::Notation => NativeKind::QName,
            DataType::Byte
            | DataType::Int
            | DataType::Integer
            | DataType::Long
            | DataType::NegativeInteger
            | DataType::NonNegativeInteger
            | DataType::NonPositiveInteger
            | DataType::PositiveInteger
            | DataType::Short
            | DataType::UnsignedByte
            | DataType::UnsignedInt
            | DataType::UnsignedLong
            | DataType::UnsignedShort => NativeKind::Int,
            _ => NativeKind::Str,
        }
    }

    /// Whether `value` is a valid lexical form of this datatype.
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        if self.is_tokens() {
            return value.split_whitespace().next().is_some();
        }

        match self {
            DataType::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            DataType::Decimal => DECIMAL.is_match(value),
            DataType::Float | DataType::Double => FLOAT.is_match(value),
            DataType::Date => DATE.is_match(value),
            DataType::DateTime | DataType::DateTimestamp => DATE_TIME.is_match(value),
            DataType::Time => TIME.is_match(value),
            DataType::Duration | DataType::DayTimeDuration | DataType::YearMonthDuration => {
                DURATION.is_match(value) && !value.ends_with('P') && !value.ends_with('T')
            }
            DataType::GYear => G_YEAR.is_match(value),
            DataType::GYearMonth => G_YEAR_MONTH.is_match(value),
            DataType::GMonth => G_MONTH.is_match(value),
            DataType::GMonthDay => G_MONTH_DAY.is_match(value),
            DataType::GDay => G_DAY.is_match(value),
            DataType::HexBinary => HEX.is_match(value),
            DataType::Base64Binary => BASE64.is_match(value),
            DataType::QName | DataType::Notation => QNAME.is_match(value),
            _ if self.kind() == NativeKind::Int => self.accepts_integer(value),
            _ => true,
        }
    }

    fn accepts_integer(self, value: &str) -> bool {
        if !INTEGER.is_match(value) {
            return false;
        }
        let Ok(number) = value.parse::<i128>() else {
            let negative = value.starts_with('-');
            return match self {
                DataType::Integer => true,
                DataType::NonNegativeInteger | DataType::PositiveInteger => !negative,
                DataType::NonPositiveInteger | DataType::NegativeInteger => negative,
                _ => false,
            };
        };

        let (min, max): (i128, i128) = match self {
            DataType::Byte => (i8::MIN.into(), i8::MAX.into()),
            DataType::Short => (i16::MIN.into(), i16::MAX.into()),
            DataType::Int => (i32::MIN.into(), i32::MAX.into()),
            DataType::Long => (i64::MIN.into(), i64::MAX.into()),
            DataType::UnsignedByte => (0, u8::MAX.into()),
            DataType::UnsignedShort => (0, u16::MAX.into()),
            DataType::UnsignedInt => (0, u32::MAX.into()),
            DataType::UnsignedLong => (0, u64::MAX.into()),
            DataType::NonNegativeInteger => (0, i128::MAX),
            DataType::PositiveInteger => (1, i128::MAX),
            DataType::NonPositiveInteger => (i128::MIN, 0),
            DataType::NegativeInteger => (i128::MIN, -1),
            _ => (i128::MIN, i128::MAX),
        };
        (min..=max).contains(&number)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qname())
    }
}
