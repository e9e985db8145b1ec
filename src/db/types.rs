use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} code: {code}")]
pub(crate) struct UnknownCode {
    pub(crate) kind: &'static str,
    pub(crate) code: i16,
}

/// Stores a fieldless enum as `SMALLINT` through an explicit code table.
macro_rules! smallint_codes {
    ($name:ident, $label:literal, { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            pub(crate) const ALL: &'static [$name] = &[$($name::$variant),+];

            pub(crate) const fn code(self) -> i16 {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl TryFrom<i16> for $name {
            type Error = UnknownCode;

            fn try_from(code: i16) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err(UnknownCode { kind: $label, code: other }),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <i16 as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <i16 as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
                <i16 as sqlx::Encode<'q, Postgres>>::encode_by_ref(&self.code(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let code = <i16 as sqlx::Decode<'r, Postgres>>::decode(value)?;
                Ok($name::try_from(code)?)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Teacher,
    Admin,
}

smallint_codes!(UserRole, "role", {
    Student => 1,
    Teacher => 2,
    Admin => 3,
});

impl UserRole {
    /// Teachers and admins review other people's achievements.
    pub(crate) fn is_reviewer(self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AchievementStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

smallint_codes!(AchievementStatus, "achievement status", {
    Draft => 0,
    Pending => 1,
    Approved => 2,
    Rejected => 3,
});

impl AchievementStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Owners may only change content while the record is not under or past review.
    pub(crate) fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "achievementkind", rename_all = "lowercase")]
pub(crate) enum AchievementKind {
    Competition,
    Research,
    Project,
    Publication,
    Patent,
    Certificate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "mediakind", rename_all = "lowercase")]
pub(crate) enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_match_backend_table() {
        assert_eq!(UserRole::Student.code(), 1);
        assert_eq!(UserRole::Teacher.code(), 2);
        assert_eq!(UserRole::Admin.code(), 3);
        for role in UserRole::ALL {
            assert_eq!(UserRole::try_from(role.code()), Ok(*role));
        }
    }

    #[test]
    fn status_codes_are_dense_and_unique() {
        let codes: Vec<i16> = AchievementStatus::ALL.iter().map(|status| status.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        for status in AchievementStatus::ALL {
            assert_eq!(AchievementStatus::try_from(status.code()), Ok(*status));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(UserRole::try_from(0), Err(UnknownCode { kind: "role", code: 0 }));
        assert_eq!(
            AchievementStatus::try_from(7),
            Err(UnknownCode { kind: "achievement status", code: 7 })
        );
    }

    #[test]
    fn status_serializes_as_lowercase_string() {
        let value = serde_json::to_value(AchievementStatus::Pending).unwrap();
        assert_eq!(value, serde_json::json!("pending"));
        let parsed: AchievementStatus = serde_json::from_value(serde_json::json!("rejected")).unwrap();
        assert_eq!(parsed, AchievementStatus::Rejected);
        assert_eq!(AchievementStatus::Approved.as_str(), "approved");
    }

    #[test]
    fn only_draft_and_rejected_are_editable() {
        assert!(AchievementStatus::Draft.is_editable());
        assert!(AchievementStatus::Rejected.is_editable());
        assert!(!AchievementStatus::Pending.is_editable());
        assert!(!AchievementStatus::Approved.is_editable());
    }
}
