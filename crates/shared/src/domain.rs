use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(AccountId);
id_newtype!(CommentId);
id_newtype!(QualityId);
id_newtype!(ProfessionId);

impl CommentId {
    /// Client-side identity assigned when a comment is drafted.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

/// Records addressable by an opaque string id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Profile fields supplied by the user at registration and carried on every account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<ProfessionId>,
    #[serde(default)]
    pub qualities: Vec<QualityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: AccountId,
    pub email: String,
    pub rate: u8,
    pub completed_meetings: u32,
    pub image: String,
    #[serde(flatten)]
    pub profile: AccountProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub page_id: AccountId,
    #[serde(rename = "userId")]
    pub author_id: AccountId,
    pub content: String,
    #[serde(rename = "created_at", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality {
    #[serde(rename = "_id")]
    pub id: QualityId,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    #[serde(rename = "_id")]
    pub id: ProfessionId,
    pub name: String,
}

impl Identified for Account {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for Comment {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for Quality {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for Profession {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}
