//! Wire types shared by the HTTP server and its clients.
//!
//! Patch ids are the packed integers stored in the database: even for real
//! patches, odd for generated ones.

use serde::{Deserialize, Serialize};

pub mod classification {
    use super::*;

    /// Pair offered to the member.
    ///
    /// `patch1`/`patch2` hold the same two ids as `real_patch_id` and
    /// `fake_patch_id` in display order, which is random. Every id is
    /// `null` once the member has nothing left to judge.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PairView {
        pub real_patch_id: Option<i64>,
        pub fake_patch_id: Option<i64>,
        pub patch1: Option<i64>,
        pub patch2: Option<i64>,
        pub classification_count: u64,
    }

    /// Verdict form as posted by the page.
    ///
    /// Values arrive as raw strings so that blanks can be told apart from
    /// malformed ids. `classification` is `"real"` when the member picked
    /// the real patch.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ClassificationNew {
        pub real_patch_id: Option<String>,
        pub fake_patch_id: Option<String>,
        pub classification: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Submitted {
        pub success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
    }

    impl Submitted {
        pub fn ok() -> Self {
            Self {
                success: true,
                message: None,
            }
        }

        pub fn failed(message: impl Into<String>) -> Self {
            Self {
                success: false,
                message: Some(message.into()),
            }
        }
    }
}

pub mod patch {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PatchQuery {
        pub id: Option<String>,
    }
}
