use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::model::Record;
use crate::utils::error::Result;

/// Destination table key attributes.
pub const PARTITION_KEY: &str = "pk";
pub const SORT_KEY: &str = "sk";

pub const DISCORD_PREFIX: &str = "discord_";
pub const IMAGE_SORT_KEY: &str = "Image";
pub const USER_SORT_PREFIX: &str = "user#";
/// Aggregate item in the reaction table that keeps its name as sort key.
pub const REACTION_COUNTS: &str = "ReactionCounts";

/// How a legacy table's primary key maps onto the single-table pk/sk pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyRemap {
    /// `id` becomes `pk = discord_<id>`, `sk = "Image"`.
    ImageInfo,
    /// `date`/`user` become `pk = discord_<date>`, `sk = user#<user>`,
    /// except the ReactionCounts aggregate which keeps its bare name.
    UserReaction,
}

impl KeyRemap {
    /// 根據舊主鍵衍生 pk/sk，舊欄位先保留（診斷用）
    pub fn derive_keys(&self, record: &mut Record) -> Result<()> {
        match self {
            KeyRemap::ImageInfo => {
                let id = record.get_str("id")?.to_string();
                record.insert(
                    PARTITION_KEY,
                    Value::String(format!("{}{}", DISCORD_PREFIX, id)),
                );
                record.insert(SORT_KEY, Value::String(IMAGE_SORT_KEY.to_string()));
            }
            KeyRemap::UserReaction => {
                let date = record.get_str("date")?.to_string();
                let user = record.get_str("user")?.to_string();

                let sort_key = if user == REACTION_COUNTS {
                    user
                } else {
                    format!("{}{}", USER_SORT_PREFIX, user)
                };

                record.insert(
                    PARTITION_KEY,
                    Value::String(format!("{}{}", DISCORD_PREFIX, date)),
                );
                record.insert(SORT_KEY, Value::String(sort_key));
            }
        }
        Ok(())
    }

    /// Legacy key fields removed before the record is written out.
    pub fn dropped_fields(&self) -> &'static [&'static str] {
        match self {
            KeyRemap::ImageInfo => &["id"],
            KeyRemap::UserReaction => &["date", "user"],
        }
    }

    /// Full per-record mapping: derive the new keys, then drop the old ones.
    pub fn apply(&self, mut record: Record) -> Result<Record> {
        self.derive_keys(&mut record)?;
        for field in self.dropped_fields() {
            record.remove(field);
        }
        Ok(record)
    }
}

impl fmt::Display for KeyRemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRemap::ImageInfo => write!(f, "image-info"),
            KeyRemap::UserReaction => write!(f, "user-reaction"),
        }
    }
}
